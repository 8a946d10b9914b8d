use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::error::AppError;
use crate::AppState;

/// Container for the authenticated username stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Claims expected inside the JWT for authenticated users.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the user's login name.
    pub sub: String,
    pub exp: usize,
}

/// Token verification settings and the reconcile allow-list.
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
    reconcile_users: Arc<Vec<String>>,
}

impl AuthConfig {
    pub fn new(secret: &str, reconcile_users: Vec<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            reconcile_users: Arc::new(reconcile_users),
        }
    }

    /// Validates an HS256 token and returns its subject.
    pub fn verify(&self, token: &str) -> Option<CurrentUser> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| warn!("Rejected bearer token: {}", e))
            .ok()?;

        let username = decoded.claims.sub.trim();
        if username.is_empty() {
            return None;
        }
        Some(CurrentUser(username.to_string()))
    }

    /// Whether `user` may move months between missing and reconciled.
    pub fn can_reconcile(&self, user: &CurrentUser) -> bool {
        self.reconcile_users
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&user.0))
    }
}

/// Issues an HS256 token for `username` valid for `ttl_seconds`.
pub fn issue_token(
    secret: &str,
    username: &str,
    ttl_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = chrono::Utc::now().timestamp() + ttl_seconds;
    let claims = Claims {
        sub: username.to_string(),
        exp: exp.max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Middleware to validate a Bearer JWT in the `Authorization` header.
///
/// On success the request is forwarded with a [`CurrentUser`] extension;
/// on failure a `401` is returned.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let user = state.auth.verify(token.trim()).ok_or(AppError::Unauthorized)?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
