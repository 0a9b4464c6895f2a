//! Destructive upkeep of the ledger and report. Nothing here is undoable.

use std::{collections::HashSet, path::Path};

use tracing::info;

use crate::{
    errors::{Diagnostics, Result},
    ledger::HistoryLedger,
    storage,
};

/// Result of purging reported entries from the ledger.
#[derive(Debug, Default)]
pub struct PurgeSummary {
    /// Distinct identifiers found in the report.
    pub identifiers: usize,
    /// Ledger rows removed.
    pub removed: usize,
    pub diagnostics: Diagnostics,
}

pub struct LedgerMaintenance<'a> {
    ledger: &'a HistoryLedger,
}

impl<'a> LedgerMaintenance<'a> {
    pub fn new(ledger: &'a HistoryLedger) -> Self {
        Self { ledger }
    }

    /// Removes every ledger row whose identifier appears in the report at
    /// `report`, whatever its expiration date, then resets the report to its
    /// header.
    ///
    /// A missing report or ledger aborts before anything is written.
    pub fn purge_reported(&self, report: &Path) -> Result<PurgeSummary> {
        let identifiers: HashSet<String> =
            storage::read_first_column(report)?.into_iter().collect();
        let (removed, diagnostics) = self.ledger.remove_where_identifier_in(&identifiers)?;
        storage::write_header_only(report)?;
        info!(
            report = %report.display(),
            identifiers = identifiers.len(),
            removed,
            "purged reported entries"
        );
        Ok(PurgeSummary {
            identifiers: identifiers.len(),
            removed,
            diagnostics,
        })
    }

    /// Truncates the ledger to its header.
    pub fn clear_ledger(&self) -> Result<()> {
        self.ledger.clear()?;
        info!(ledger = %self.ledger.path().display(), "ledger cleared");
        Ok(())
    }
}
