//! Row store standing in for the dashboard spreadsheet.
//!
//! Two sheets are modelled: the customer ledger (`InvoiceRow`, read-only)
//! and the discount tracker (`DiscountTrackerEntry`, keyed by customer
//! name). Both backends expose the same operations through [`SheetStore`].

pub mod memory;
pub mod postgres;

use std::path::PathBuf;
use thiserror::Error;

use crate::discounts::types::ReconcileAction;
use crate::models::{DiscountTrackerEntry, InvoiceRow};
use crate::months::MonthKey;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by either store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("no discount tracker entry for customer {0:?}")]
    CustomerNotFound(String),

    #[error("cannot read seed file {path}: {source}")]
    SeedIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed seed file {path}: {source}")]
    SeedFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage backend selected at startup.
#[derive(Clone)]
pub enum SheetStore {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl SheetStore {
    /// Every ledger row, in sheet order.
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceRow>, StoreError> {
        match self {
            SheetStore::Postgres(store) => store.list_invoices().await,
            SheetStore::Memory(store) => Ok(store.list_invoices().await),
        }
    }

    /// Every discount tracker entry, in sheet order.
    pub async fn list_entries(&self) -> Result<Vec<DiscountTrackerEntry>, StoreError> {
        match self {
            SheetStore::Postgres(store) => store.list_entries().await,
            SheetStore::Memory(store) => Ok(store.list_entries().await),
        }
    }

    /// Adds or removes `month` in the customer's reconciliation list and
    /// persists the whole list. Returns the list as stored.
    pub async fn reconcile(
        &self,
        customer_name: &str,
        month: MonthKey,
        action: ReconcileAction,
    ) -> Result<Vec<String>, StoreError> {
        match self {
            SheetStore::Postgres(store) => store.reconcile(customer_name, month, action).await,
            SheetStore::Memory(store) => store.reconcile(customer_name, month, action).await,
        }
    }

    /// Verifies the backend is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            SheetStore::Postgres(store) => store.ping().await,
            SheetStore::Memory(_) => Ok(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            SheetStore::Postgres(_) => "postgres",
            SheetStore::Memory(_) => "memory",
        }
    }
}
