pub mod key;
pub mod parse;

pub use key::{MonthKey, MonthKeyError, MAX_YEAR, MIN_YEAR};
pub use parse::parse_month_key;
