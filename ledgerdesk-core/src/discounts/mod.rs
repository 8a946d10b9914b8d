pub mod export;
pub mod handlers;
pub mod reconcile;
pub mod summary;
pub mod types;

#[cfg(test)]
mod tests;

pub use export::{summaries_to_csv, write_summaries_csv};
pub use handlers::{
    export_handler, grid_handler, list_entries_handler, reconcile_handler, summary_handler,
};
pub use reconcile::apply_action;
pub use summary::{compute_summary, summarize_all, DiscountSummary, MonthCell, MonthStatus, PostedMonth};
pub use types::*;
