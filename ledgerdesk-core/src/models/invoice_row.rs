use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::months::{parse_month_key, MonthKey};

/// Document type encoded in the prefix of an invoice number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// `SAL...` sales invoice
    Sale,

    /// `BIL...` posted discount bill
    DiscountBill,

    /// `BNK...` bank receipt or payment
    Bank,

    /// `OB...` opening balance
    OpeningBalance,

    /// Any other prefix
    Other,
}

impl DocumentKind {
    /// Classifies a document number by its prefix, ignoring case and
    /// surrounding whitespace.
    pub fn from_number(number: &str) -> Self {
        let upper = number.trim().to_ascii_uppercase();
        if upper.starts_with("SAL") {
            DocumentKind::Sale
        } else if upper.starts_with("BIL") {
            DocumentKind::DiscountBill
        } else if upper.starts_with("BNK") {
            DocumentKind::Bank
        } else if upper.starts_with("OB") {
            DocumentKind::OpeningBalance
        } else {
            DocumentKind::Other
        }
    }
}

/// One row of the customer ledger sheet.
///
/// Rows are read-only for this service and are fetched wholesale on every
/// request. The `date` cell is kept exactly as entered; see
/// [`parse_month_key`] for how it is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRow {
    /// Customer the document was issued to
    pub customer_name: String,

    /// Raw date cell
    pub date: String,

    /// Document number; its prefix encodes the document type
    pub number: String,

    /// Debit amount
    #[serde(default)]
    pub debit: Decimal,

    /// Credit amount
    #[serde(default)]
    pub credit: Decimal,

    /// Optional link code tying a payment to the documents it settles
    #[serde(default)]
    pub matching: Option<String>,
}

impl InvoiceRow {
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_number(&self.number)
    }

    /// Month the row falls in, or `None` when the date cell is unreadable.
    pub fn month(&self) -> Option<MonthKey> {
        parse_month_key(&self.date)
    }

    /// Credit minus debit. For discount bills this is the discount granted.
    pub fn net_credit(&self) -> Decimal {
        self.credit - self.debit
    }
}
