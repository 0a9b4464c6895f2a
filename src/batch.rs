//! Discovery of dated source batches: a directory of `YYYY-MM-DD.csv` files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use tracing::warn;

use crate::{
    errors::{Result, TrackerError},
    ledger::parse_date,
};

/// A source file and the production date taken from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub production_date: NaiveDate,
    pub source: PathBuf,
}

#[derive(Debug, Default)]
pub struct BatchPlan {
    /// Ordered by production date, then by path.
    pub entries: Vec<BatchEntry>,
    /// CSV files whose stem is not a date.
    pub skipped: Vec<PathBuf>,
}

/// Lists every `*.csv` under `dir` whose stem parses as a production date.
pub fn discover(dir: &Path) -> Result<BatchPlan> {
    if !dir.is_dir() {
        return Err(TrackerError::MissingFile(dir.to_path_buf()));
    }
    let mut plan = BatchPlan::default();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let parsed = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(parse_date);
        match parsed {
            Some(Ok(production_date)) => plan.entries.push(BatchEntry {
                production_date,
                source: path,
            }),
            _ => {
                warn!(file = %path.display(), "batch file name is not a YYYY-MM-DD date");
                plan.skipped.push(path);
            }
        }
    }
    plan.entries.sort_by(|a, b| {
        a.production_date
            .cmp(&b.production_date)
            .then_with(|| a.source.cmp(&b.source))
    });
    plan.skipped.sort();
    Ok(plan)
}
