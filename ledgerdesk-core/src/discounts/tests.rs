#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::{issue_token, AuthConfig};
    use crate::models::{DiscountTrackerEntry, InvoiceRow};
    use crate::store::memory::SheetData;
    use crate::store::{MemoryStore, SheetStore};
    use crate::{create_router, AppState};

    const SECRET: &str = "router-test-secret";

    fn invoice(customer: &str, number: &str, date: &str) -> InvoiceRow {
        InvoiceRow {
            customer_name: customer.to_string(),
            date: date.to_string(),
            number: number.to_string(),
            debit: dec!(0),
            credit: dec!(100),
            matching: None,
        }
    }

    /// Router over an in-memory store holding one customer with a sale in
    /// January 2024 and discount bills for January and March.
    fn test_app() -> (Router, MemoryStore) {
        let mut entry = DiscountTrackerEntry::new("Acme Foods");
        entry.monthly_rebate = Some(dec!(100));
        let store = MemoryStore::new(SheetData {
            invoices: vec![
                invoice("Acme Foods", "SAL-1", "2024-01-15"),
                invoice("Acme Foods", "BIL-1", "2024-01-31"),
                invoice("Acme Foods", "BIL-2", "2024-03-31"),
            ],
            entries: vec![entry],
        });

        let state = AppState {
            store: SheetStore::Memory(store.clone()),
            auth: AuthConfig::new(SECRET, vec!["dana".to_string()]),
        };
        (create_router(state), store)
    }

    fn bearer(username: &str) -> String {
        format!("Bearer {}", issue_token(SECRET, username, 3600).unwrap())
    }

    fn reconcile_request(username: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/discounts/reconcile")
            .header(header::AUTHORIZATION, bearer(username))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, bearer("viewer"))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).expect("response should be JSON")
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/health/store").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["store"], "memory");
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let (app, _) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/api/discounts").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_list_entries() {
        let (app, _) = test_app();

        let response = app.oneshot(get_request("/api/discounts")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["entries"][0]["customerName"], "Acme Foods");
        assert_eq!(body["entries"][0]["reconciliationMonths"], json!([]));
    }

    #[tokio::test]
    async fn test_summary_as_of_month() {
        let (app, _) = test_app();

        let response = app
            .oneshot(get_request("/api/discounts/summary?asOf=2024-04"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let summary = &body["summaries"][0];
        assert_eq!(body["currentMonth"], "2024-04");
        assert_eq!(summary["missingMonths"], json!(["2024-02", "2024-04"]));
        assert_eq!(summary["postedMonths"][0]["month"], "2024-01");
        assert_eq!(summary["postedMonths"][1]["month"], "2024-03");
        assert_eq!(summary["reconciledMonths"], json!([]));
    }

    #[tokio::test]
    async fn test_reconcile_then_unreconcile() {
        let (app, store) = test_app();
        let body = json!({ "customerName": "Acme Foods", "monthKey": "2024-02", "action": "reconcile" });

        let response = app
            .clone()
            .oneshot(reconcile_request("dana", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["reconciliationMonths"], json!(["2024-02"]));

        let summary = app
            .clone()
            .oneshot(get_request("/api/discounts/summary?asOf=2024-04"))
            .await
            .unwrap();
        let summary = json_body(summary).await;
        assert_eq!(summary["summaries"][0]["missingMonths"], json!(["2024-04"]));
        assert_eq!(summary["summaries"][0]["reconciledMonths"], json!(["2024-02"]));

        let body = json!({ "customerName": "Acme Foods", "monthKey": "2024-02", "action": "unreconcile" });
        let response = app.oneshot(reconcile_request("Dana", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["reconciliationMonths"], json!([]));
        assert!(store.list_entries().await[0].reconciliation_months.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_forbidden_for_other_users() {
        let (app, store) = test_app();
        let body = json!({ "customerName": "Acme Foods", "monthKey": "2024-02", "action": "reconcile" });

        let response = app.oneshot(reconcile_request("viewer", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(store.list_entries().await[0].reconciliation_months.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_rejects_bad_month_and_unknown_customer() {
        let (app, _) = test_app();

        let bad_month = json!({ "customerName": "Acme Foods", "monthKey": "Feb 2024", "action": "reconcile" });
        let response = app.clone().oneshot(reconcile_request("dana", bad_month)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let future = json!({ "customerName": "Acme Foods", "monthKey": "9999-12", "action": "reconcile" });
        let response = app.clone().oneshot(reconcile_request("dana", future)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let unknown = json!({ "customerName": "Nobody", "monthKey": "2024-02", "action": "reconcile" });
        let response = app.oneshot(reconcile_request("dana", unknown)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Not found");
        assert!(body["details"].as_str().unwrap().contains("Nobody"));
    }

    #[tokio::test]
    async fn test_reconcile_rejects_unknown_action_with_json_error() {
        let (app, store) = test_app();
        let body = json!({ "customerName": "Acme Foods", "monthKey": "2024-02", "action": "approve" });

        let response = app.oneshot(reconcile_request("dana", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Bad request");
        assert!(body["details"].as_str().unwrap().contains("approve"));
        assert!(store.list_entries().await[0].reconciliation_months.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_rejects_years_before_1900() {
        let (app, store) = test_app();
        let body = json!({ "customerName": "Acme Foods", "monthKey": "0001-01", "action": "reconcile" });

        let response = app.oneshot(reconcile_request("dana", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Bad request");
        assert!(store.list_entries().await[0].reconciliation_months.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_as_of_is_json_error() {
        let (app, _) = test_app();

        for uri in ["/api/discounts/summary?asOf=2024-13", "/api/discounts/export?asOf=2024-13"] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = json_body(response).await;
            assert_eq!(body["error"], "Bad request");
            assert!(body["details"].as_str().unwrap().contains("2024-13"));
        }
    }

    #[tokio::test]
    async fn test_year_grid_for_customer() {
        let (app, store) = test_app();
        store
            .reconcile("Acme Foods", "2024-02".parse().unwrap(), crate::discounts::ReconcileAction::Reconcile)
            .await
            .unwrap();

        let response = app
            .oneshot(get_request("/api/discounts/grid?customer=Acme%20Foods&asOf=2024-04"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["customerName"], "Acme Foods");
        assert_eq!(body["year"], 2024);
        let statuses: Vec<Value> = body["months"]
            .as_array()
            .unwrap()
            .iter()
            .map(|cell| cell["status"].clone())
            .collect();
        assert_eq!(statuses.len(), 12);
        assert_eq!(
            statuses[..5],
            [json!("posted"), json!("reconciled"), json!("posted"), json!("missing"), json!("future")]
        );
        assert_eq!(body["months"][0]["month"], "2024-01");
        assert_eq!(body["months"][0]["label"], "Jan 2024");
    }

    #[tokio::test]
    async fn test_year_grid_before_first_sale_and_unknown_customer() {
        let (app, _) = test_app();

        let response = app
            .clone()
            .oneshot(get_request("/api/discounts/grid?customer=Acme%20Foods&year=2023&asOf=2024-04"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["months"].as_array().unwrap().iter().all(|cell| cell["status"].is_null()));

        let response = app
            .clone()
            .oneshot(get_request("/api/discounts/grid?customer=Nobody"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(get_request("/api/discounts/grid?customer=Acme%20Foods&year=1066"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_returns_csv() {
        let (app, _) = test_app();

        let response = app
            .oneshot(get_request("/api/discounts/export?asOf=2024-04"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("discount-summary-2024-04.csv"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("2024-02 2024-04"));
    }
}
