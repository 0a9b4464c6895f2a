//! Per-invocation composition of the shelf-life table, ledger, report, and maintenance.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::{
    batch::BatchPlan,
    config::TrackerConfig,
    errors::{Diagnostics, TrackerError},
    ledger::{ExpirationRecord, HistoryLedger},
    maintenance::{LedgerMaintenance, PurgeSummary},
    report::{display, ExpiryReportEngine, ReportUpdate},
    shelf_life::ShelfLifeTable,
    storage,
    time::{Clock, SystemClock},
};

/// What a single tracker invocation should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub source: Option<PathBuf>,
    pub production_date: Option<NaiveDate>,
    pub days: i64,
    pub remove_expired: bool,
    pub clear_history: bool,
    pub display: bool,
    /// Overrides the configured expiry report path.
    pub report_dest: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(days: i64) -> Self {
        Self {
            source: None,
            production_date: None,
            days,
            remove_expired: false,
            clear_history: false,
            display: false,
            report_dest: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>, production_date: NaiveDate) -> Self {
        self.source = Some(source.into());
        self.production_date = Some(production_date);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub text: String,
    /// Where the `.txt` copy was written, if that succeeded.
    pub path: Option<PathBuf>,
}

/// Everything a run produced: records, outcomes, and operator-facing messages.
#[derive(Debug, Default)]
pub struct RunReport {
    pub ingested: Vec<ExpirationRecord>,
    pub report: Option<ReportUpdate>,
    pub rendered: Option<RenderedReport>,
    pub purge: Option<PurgeSummary>,
    pub history_cleared: bool,
    pub confirmations: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    fn note(&mut self, err: TrackerError) {
        warn!(error = %err, "tracker diagnostic");
        self.diagnostics.push(err);
    }
}

pub struct TrackerOrchestrator {
    config: TrackerConfig,
    clock: Box<dyn Clock>,
}

impl TrackerOrchestrator {
    pub fn new(config: TrackerConfig, clock: Box<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn with_system_clock(config: TrackerConfig) -> Self {
        Self::new(config, Box::new(SystemClock))
    }

    pub fn ledger(&self) -> HistoryLedger {
        HistoryLedger::new(&self.config.history_file)
    }

    pub fn report_destination(&self, options: &RunOptions) -> PathBuf {
        options
            .report_dest
            .clone()
            .unwrap_or_else(|| self.config.expiry_report_file.clone())
    }

    /// Runs one invocation. Failures are collected in the returned report;
    /// maintenance steps still run after a failed ingest or report step.
    pub fn run(&self, options: &RunOptions) -> RunReport {
        let mut run = RunReport::default();
        let ledger = self.ledger();
        let engine = ExpiryReportEngine::new(&ledger, self.clock.as_ref());
        let destination = self.report_destination(options);

        match (&options.source, options.production_date) {
            (Some(source), Some(production_date)) => {
                info!(source = %source.display(), %production_date, "ingesting source batch");
                let table = self.load_shelf_life(&mut run);
                run.ingested = self.ingest(&table, source, production_date, &ledger, &mut run);
                match engine.append_windowed(&run.ingested, options.days, &destination) {
                    Ok(update) => self.keep_update(&mut run, update),
                    Err(err) => run.note(err),
                }
            }
            (source, production_date) => {
                if source.is_some() != production_date.is_some() {
                    run.note(TrackerError::InvalidInput(
                        "a source file and a production date must be given together; regenerating the report instead".into(),
                    ));
                }
                info!(days = options.days, "regenerating expiry report");
                self.regenerate_into(&engine, options.days, &destination, &mut run);
            }
        }

        if options.display {
            self.regenerate_into(&engine, options.days, &destination, &mut run);
            self.render(&engine, options.days, &destination, &mut run);
        }

        if options.remove_expired {
            match LedgerMaintenance::new(&ledger).purge_reported(&destination) {
                Ok(mut summary) => {
                    run.diagnostics.append(&mut summary.diagnostics);
                    run.confirmations.push(format!(
                        "Expired entries removed from {}",
                        file_label(ledger.path())
                    ));
                    run.confirmations.push("Expiry report cleared".into());
                    run.purge = Some(summary);
                }
                Err(err) => run.note(err),
            }
        }

        if options.clear_history {
            match LedgerMaintenance::new(&ledger).clear_ledger() {
                Ok(()) => {
                    run.history_cleared = true;
                    run.confirmations.push("History file cleared".into());
                }
                Err(err) => run.note(err),
            }
        }

        run
    }

    /// Runs the orchestrator once per batch entry in production-date order.
    ///
    /// Display and maintenance flags apply to the last entry only, so they
    /// take effect once per batch. An empty batch falls back to a single run
    /// without a source.
    pub fn run_batch(&self, plan: &BatchPlan, options: &RunOptions) -> Vec<RunReport> {
        if plan.entries.is_empty() {
            return vec![self.run(options)];
        }
        let last = plan.entries.len() - 1;
        plan.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let mut step = options
                    .clone()
                    .with_source(&entry.source, entry.production_date);
                if idx != last {
                    step.display = false;
                    step.remove_expired = false;
                    step.clear_history = false;
                }
                self.run(&step)
            })
            .collect()
    }

    fn load_shelf_life(&self, run: &mut RunReport) -> ShelfLifeTable {
        match ShelfLifeTable::load(&self.config.shelf_life_file) {
            Ok((table, rejected)) => {
                run.diagnostics.extend(rejected);
                if table.is_empty() {
                    warn!(
                        table = %self.config.shelf_life_file.display(),
                        "shelf-life table has no entries; every SKU resolves to Unknown"
                    );
                } else {
                    debug!(entries = table.len(), "shelf-life table loaded");
                }
                table
            }
            Err(err) => {
                run.note(err);
                ShelfLifeTable::default()
            }
        }
    }

    /// Computes a record per source identifier and appends each to the ledger.
    ///
    /// Records are still returned when the ledger cannot be written, so the
    /// report step sees the whole batch.
    fn ingest(
        &self,
        table: &ShelfLifeTable,
        source: &Path,
        production_date: NaiveDate,
        ledger: &HistoryLedger,
        run: &mut RunReport,
    ) -> Vec<ExpirationRecord> {
        let identifiers = match storage::read_first_column(source) {
            Ok(identifiers) => identifiers,
            Err(err) => {
                run.note(err);
                Vec::new()
            }
        };

        let mut ledger_writable = true;
        let mut records = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let record = table.expiration_record(&identifier, production_date);
            if ledger_writable {
                match ledger.append(&record) {
                    Ok(rejected) => run.diagnostics.extend(rejected),
                    Err(err) => {
                        run.note(err);
                        ledger_writable = false;
                    }
                }
            }
            records.push(record);
        }
        info!(records = records.len(), "source batch ingested");
        records
    }

    fn regenerate_into(
        &self,
        engine: &ExpiryReportEngine<'_>,
        days: i64,
        destination: &Path,
        run: &mut RunReport,
    ) {
        match engine.regenerate(days, destination) {
            Ok(update) => self.keep_update(run, update),
            Err(err) => run.note(err),
        }
    }

    fn keep_update(&self, run: &mut RunReport, mut update: ReportUpdate) {
        run.diagnostics.append(&mut update.diagnostics);
        run.report = Some(update);
    }

    fn render(
        &self,
        engine: &ExpiryReportEngine<'_>,
        days: i64,
        destination: &Path,
        run: &mut RunReport,
    ) {
        let records = match engine.read_report(destination) {
            Ok(table) => table.records,
            Err(err) => {
                run.note(err);
                return;
            }
        };
        let text = display::render_report(&records, &engine.window(days));
        let path = match display::write_rendered(destination, &text) {
            Ok(path) => Some(path),
            Err(err) => {
                run.note(err);
                None
            }
        };
        run.rendered = Some(RenderedReport { text, path });
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
