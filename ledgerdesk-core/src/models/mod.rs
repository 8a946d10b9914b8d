pub mod invoice_row;
pub mod tracker_entry;

pub use invoice_row::{DocumentKind, InvoiceRow};
pub use tracker_entry::{DiscountTrackerEntry, TrackerEntriesResponse};
