//! Threshold-windowed expiry report derived from the history ledger.

pub mod display;

use std::{collections::HashSet, path::Path};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    errors::{Diagnostics, Result, TrackerError},
    ledger::{ExpirationRecord, HistoryLedger},
    storage::{self, RecordTable},
    time::Clock,
};

/// Day window a record must fall in to appear in the report.
///
/// The threshold is an upper bound only: records already past their
/// expiration date have a negative day count and always qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub today: NaiveDate,
    pub threshold_days: i64,
}

impl ReportWindow {
    pub fn new(today: NaiveDate, threshold_days: i64) -> Self {
        Self {
            today,
            threshold_days,
        }
    }

    pub fn contains(&self, record: &ExpirationRecord) -> bool {
        record.days_until(self.today) <= self.threshold_days
    }
}

/// Outcome of a report-producing operation.
#[derive(Debug, Default)]
pub struct ReportUpdate {
    /// Rows written by this operation.
    pub added: usize,
    /// Distinct rows in the report afterwards.
    pub rows: usize,
    pub diagnostics: Diagnostics,
}

/// Derives and maintains the expiry report for one ledger.
pub struct ExpiryReportEngine<'a> {
    ledger: &'a HistoryLedger,
    clock: &'a dyn Clock,
}

impl<'a> ExpiryReportEngine<'a> {
    pub fn new(ledger: &'a HistoryLedger, clock: &'a dyn Clock) -> Self {
        Self { ledger, clock }
    }

    pub fn window(&self, threshold_days: i64) -> ReportWindow {
        ReportWindow::new(self.clock.today(), threshold_days)
    }

    /// Folds `new_records` into the report at `destination`.
    ///
    /// Existing report rows are kept. A missing or empty destination starts
    /// from an empty set and gets the canonical header. Only records inside
    /// the window that are not already present (by full-field equality) are
    /// appended. Ends with the sort pass.
    pub fn append_windowed(
        &self,
        new_records: &[ExpirationRecord],
        threshold_days: i64,
        destination: &Path,
    ) -> Result<ReportUpdate> {
        let existing = match storage::read_records(destination) {
            Ok(table) => table,
            Err(err) if err.is_missing_file() => RecordTable::default(),
            Err(err) => return Err(err),
        };
        let mut seen: HashSet<ExpirationRecord> = existing.records.into_iter().collect();

        let window = self.window(threshold_days);
        let added: Vec<ExpirationRecord> = new_records
            .iter()
            .filter(|record| window.contains(record))
            .filter(|record| seen.insert((*record).clone()))
            .cloned()
            .collect();

        storage::append_records(destination, &added)?;
        let diagnostics = self.sort_report(destination)?;
        debug!(
            report = %destination.display(),
            candidates = new_records.len(),
            added = added.len(),
            "report appended"
        );
        Ok(ReportUpdate {
            added: added.len(),
            rows: seen.len(),
            diagnostics,
        })
    }

    /// Rebuilds the report at `destination` from the whole ledger.
    ///
    /// Ledger rows are deduplicated by value before filtering. A ledger with no
    /// data rows yields `TrackerError::NoDataFound` and leaves the destination
    /// untouched.
    pub fn regenerate(&self, threshold_days: i64, destination: &Path) -> Result<ReportUpdate> {
        let (unique, table) = self.ledger.read_unique()?;
        if unique.is_empty() && table.rejected.is_empty() {
            warn!(ledger = %self.ledger.path().display(), "no data found");
            return Err(TrackerError::NoDataFound(self.ledger.path().to_path_buf()));
        }

        let window = self.window(threshold_days);
        let qualifying: Vec<ExpirationRecord> =
            unique.into_iter().filter(|record| window.contains(record)).collect();

        storage::write_records(destination, &storage::default_header(), &qualifying)?;
        let mut diagnostics = table.rejected;
        diagnostics.extend(self.sort_report(destination)?);
        debug!(
            report = %destination.display(),
            rows = qualifying.len(),
            threshold_days,
            "report regenerated"
        );
        Ok(ReportUpdate {
            added: qualifying.len(),
            rows: qualifying.len(),
            diagnostics,
        })
    }

    /// Rewrites the report with its data rows ordered by expiration date.
    pub fn sort_report(&self, destination: &Path) -> Result<Diagnostics> {
        storage::sort_file(destination)
    }

    /// Loads the report's rows for display or maintenance.
    pub fn read_report(&self, destination: &Path) -> Result<RecordTable> {
        storage::read_records(destination)
    }
}
