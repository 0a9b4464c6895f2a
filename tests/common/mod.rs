#![allow(dead_code)]

use std::{fs, path::PathBuf};

use chrono::NaiveDate;
use spoiltracker::{
    config::TrackerConfig, time::FixedClock, tracker::TrackerOrchestrator, HistoryLedger,
};
use tempfile::TempDir;

pub const HEADER: &str = "SKU,Name,Brand,Expiration Date\n";

/// Isolated working directory holding the shelf-life table, ledger, and report.
pub struct TrackerEnv {
    _tmp: TempDir,
    pub dir: PathBuf,
    pub config: TrackerConfig,
}

impl TrackerEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let dir = tmp.path().to_path_buf();
        let config = TrackerConfig::default().resolved_in(&dir);
        Self {
            _tmp: tmp,
            dir,
            config,
        }
    }

    pub fn with_shelf_life(self, rows: &str) -> Self {
        fs::write(
            &self.config.shelf_life_file,
            format!("SKU,Name,Brand,Shelf Life\n{rows}"),
        )
        .expect("write shelf-life table");
        self
    }

    pub fn tracker(&self, today: NaiveDate) -> TrackerOrchestrator {
        TrackerOrchestrator::new(self.config.clone(), Box::new(FixedClock(today)))
    }

    pub fn ledger(&self) -> HistoryLedger {
        HistoryLedger::new(&self.config.history_file)
    }

    pub fn write_source(&self, name: &str, skus: &[&str]) -> PathBuf {
        let path = self.dir.join(name);
        let mut contents = String::from("SKU\n");
        for sku in skus {
            contents.push_str(sku);
            contents.push('\n');
        }
        fs::write(&path, contents).expect("write source batch");
        path
    }

    pub fn write_ledger(&self, rows: &str) {
        fs::write(&self.config.history_file, format!("{HEADER}{rows}")).expect("write ledger");
    }

    pub fn write_report(&self, rows: &str) {
        fs::write(&self.config.expiry_report_file, format!("{HEADER}{rows}"))
            .expect("write report");
    }

    pub fn ledger_contents(&self) -> String {
        fs::read_to_string(&self.config.history_file).expect("read ledger")
    }

    pub fn report_contents(&self) -> String {
        fs::read_to_string(&self.config.expiry_report_file).expect("read report")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
