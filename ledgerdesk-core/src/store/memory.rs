use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::discounts::reconcile::apply_action;
use crate::discounts::types::ReconcileAction;
use crate::models::{DiscountTrackerEntry, InvoiceRow};
use crate::months::MonthKey;
use crate::store::StoreError;

/// Contents of both sheets, also the layout of a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetData {
    #[serde(default)]
    pub invoices: Vec<InvoiceRow>,

    #[serde(default)]
    pub entries: Vec<DiscountTrackerEntry>,
}

/// In-process store used for local runs and tests.
///
/// A reconcile holds the write lock for the whole read-modify-write, so
/// concurrent toggles on the same customer never lose an update.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<SheetData>>,
}

impl MemoryStore {
    pub fn new(data: SheetData) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Loads both sheets from a JSON seed file.
    pub async fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::SeedIo {
                path: path.to_path_buf(),
                source,
            })?;
        let data: SheetData =
            serde_json::from_str(&raw).map_err(|source| StoreError::SeedFormat {
                path: path.to_path_buf(),
                source,
            })?;

        info!(
            "Seeded memory store from {}: {} invoice rows, {} tracker entries",
            path.display(),
            data.invoices.len(),
            data.entries.len()
        );
        Ok(Self::new(data))
    }

    pub async fn list_invoices(&self) -> Vec<InvoiceRow> {
        self.data.read().await.invoices.clone()
    }

    pub async fn list_entries(&self) -> Vec<DiscountTrackerEntry> {
        self.data.read().await.entries.clone()
    }

    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        customer_name: &str,
        month: MonthKey,
        action: ReconcileAction,
    ) -> Result<Vec<String>, StoreError> {
        let mut data = self.data.write().await;
        let entry = data
            .entries
            .iter_mut()
            .find(|e| e.customer_name.trim() == customer_name.trim())
            .ok_or_else(|| StoreError::CustomerNotFound(customer_name.to_string()))?;

        let (updated, changed) = apply_action(&entry.reconciliation_months, month, action);
        entry.reconciliation_months = updated.clone();

        info!(
            "{} {} for {} (changed: {})",
            action, month, entry.customer_name, changed
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let mut entry = DiscountTrackerEntry::new("Acme Foods");
        entry.reconciliation_months = vec!["2024-01".to_string()];
        MemoryStore::new(SheetData {
            invoices: Vec::new(),
            entries: vec![entry],
        })
    }

    #[tokio::test]
    async fn test_reconcile_persists_full_list() {
        let store = store();
        let month = "2024-03".parse().unwrap();

        let updated = store
            .reconcile("Acme Foods", month, ReconcileAction::Reconcile)
            .await
            .expect("reconcile should succeed");

        assert_eq!(updated, vec!["2024-01", "2024-03"]);
        assert_eq!(store.list_entries().await[0].reconciliation_months, updated);
    }

    #[tokio::test]
    async fn test_repeat_reconcile_stores_normalized_list() {
        let store = store();
        store.data.write().await.entries[0].reconciliation_months =
            vec![" 2024-03".to_string(), "2024-01".to_string(), "2024-01".to_string()];

        let updated = store
            .reconcile("Acme Foods", "2024-01".parse().unwrap(), ReconcileAction::Reconcile)
            .await
            .expect("reconcile should succeed");

        assert_eq!(updated, vec!["2024-01", "2024-03"]);
        assert_eq!(store.list_entries().await[0].reconciliation_months, updated);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let result = store()
            .reconcile("Nobody", "2024-03".parse().unwrap(), ReconcileAction::Reconcile)
            .await;

        assert!(matches!(result, Err(StoreError::CustomerNotFound(name)) if name == "Nobody"));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_keep_every_month() {
        let store = store();
        let mut handles = Vec::new();
        for month in 2..=12 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let key = MonthKey::new(2024, month).unwrap();
                store.reconcile("Acme Foods", key, ReconcileAction::Reconcile).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list_entries().await[0].reconciliation_months.len(), 12);
    }

    #[tokio::test]
    async fn test_seed_file_loads_demo_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/demo.json");
        let store = MemoryStore::from_seed_file(&path)
            .await
            .expect("demo fixture should load");

        assert_eq!(store.list_entries().await.len(), 2);
        assert_eq!(store.list_invoices().await.len(), 8);
    }

    #[tokio::test]
    async fn test_missing_seed_file_reports_path() {
        let result = MemoryStore::from_seed_file(Path::new("/nonexistent/seed.json")).await;
        assert!(matches!(result, Err(StoreError::SeedIo { .. })));
    }
}
