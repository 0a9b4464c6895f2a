#![doc(test(attr(deny(warnings))))]

//! Spoiltracker derives expiration dates for perishable products from a
//! shelf-life table, keeps a sorted history ledger of every computed
//! expiration, and maintains an "expiring soon" report windowed by days.

pub mod batch;
pub mod cli;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod maintenance;
pub mod report;
pub mod shelf_life;
pub mod storage;
pub mod time;
pub mod tracker;
pub mod utils;

pub use errors::{Result, TrackerError};
pub use ledger::{ExpirationRecord, HistoryLedger};
pub use report::{ExpiryReportEngine, ReportWindow};
pub use tracker::{RunOptions, RunReport, TrackerOrchestrator};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("Spoiltracker tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
