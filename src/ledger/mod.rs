//! Expiration records and the history ledger that stores them.

pub mod history;
pub mod record;

pub use history::HistoryLedger;
pub use record::{
    format_date, parse_date, sort_by_expiration, ExpirationRecord, DATE_FORMAT, RECORD_HEADER,
};
