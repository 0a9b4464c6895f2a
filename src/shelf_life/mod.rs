//! Shelf-life lookup table and the expiration calculation built on it.

use std::{collections::HashMap, fs::File, path::Path};

use chrono::{Days, NaiveDate};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    errors::{Diagnostics, Result, TrackerError},
    ledger::ExpirationRecord,
    storage::csv_store::row_error,
};

/// Name and brand given to identifiers that are absent from the table.
pub const UNKNOWN: &str = "Unknown";

/// One row of the shelf-life table: `identifier, name, brand, shelf_life_days`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShelfLifeEntry {
    pub identifier: String,
    pub name: String,
    pub brand: String,
    pub shelf_life_days: u32,
}

impl ShelfLifeEntry {
    fn unknown(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: UNKNOWN.to_string(),
            brand: UNKNOWN.to_string(),
            shelf_life_days: 0,
        }
    }
}

/// Expiration date for a product made on `production_date`.
pub fn compute_expiration(production_date: NaiveDate, shelf_life_days: u32) -> NaiveDate {
    production_date
        .checked_add_days(Days::new(u64::from(shelf_life_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Immutable per-run lookup from product identifier to attributes and shelf life.
#[derive(Debug, Clone, Default)]
pub struct ShelfLifeTable {
    entries: HashMap<String, ShelfLifeEntry>,
}

impl ShelfLifeTable {
    pub fn from_entries(entries: impl IntoIterator<Item = ShelfLifeEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.identifier.clone(), entry))
                .collect(),
        }
    }

    /// Loads the table from CSV, skipping the header row.
    ///
    /// Rows that do not decode (missing columns, a non-integer shelf life) are
    /// returned as diagnostics and left out of the table. A later row for the
    /// same identifier replaces an earlier one.
    pub fn load(path: &Path) -> Result<(Self, Diagnostics)> {
        let file = File::open(path).map_err(|err| TrackerError::from_io(err, path))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);

        let mut entries = Vec::new();
        let mut rejected = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    let err = row_error(path, err, idx as u64 + 2)?;
                    warn!(error = %err, "skipping shelf-life row");
                    rejected.push(err);
                    continue;
                }
            };
            let line = row.position().map(|pos| pos.line()).unwrap_or_default();
            let decoded: std::result::Result<ShelfLifeEntry, csv::Error> = row.deserialize(None);
            match decoded {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    let err = TrackerError::MalformedRow {
                        path: path.to_path_buf(),
                        line,
                        reason: err.to_string(),
                    };
                    warn!(error = %err, "skipping shelf-life row");
                    rejected.push(err);
                }
            }
        }
        debug!(path = %path.display(), entries = entries.len(), "loaded shelf-life table");
        Ok((Self::from_entries(entries), rejected))
    }

    pub fn get(&self, identifier: &str) -> Option<&ShelfLifeEntry> {
        self.entries.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves attributes for `identifier`, defaulting unknown products to
    /// the `Unknown` sentinel with zero shelf life.
    pub fn resolve(&self, identifier: &str) -> ShelfLifeEntry {
        self.get(identifier)
            .cloned()
            .unwrap_or_else(|| ShelfLifeEntry::unknown(identifier))
    }

    pub fn expiration_record(&self, identifier: &str, production_date: NaiveDate) -> ExpirationRecord {
        let entry = self.resolve(identifier);
        ExpirationRecord {
            expiration_date: compute_expiration(production_date, entry.shelf_life_days),
            identifier: identifier.to_string(),
            name: entry.name,
            brand: entry.brand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expiration_adds_shelf_life() {
        assert_eq!(compute_expiration(date(2024, 1, 1), 10), date(2024, 1, 11));
        assert_eq!(compute_expiration(date(2024, 2, 25), 5), date(2024, 3, 1));
        assert_eq!(compute_expiration(date(2024, 1, 1), 0), date(2024, 1, 1));
    }

    #[test]
    fn unknown_identifier_defaults_to_sentinel() {
        let table = ShelfLifeTable::default();
        let record = table.expiration_record("MYSTERY", date(2024, 1, 1));
        assert_eq!(record.name, UNKNOWN);
        assert_eq!(record.brand, UNKNOWN);
        assert_eq!(record.expiration_date, date(2024, 1, 1));
    }

    #[test]
    fn load_skips_header_and_bad_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shelflife.csv");
        fs::write(
            &path,
            "SKU,Name,Brand,Shelf Life\nSKU1,Widget,Acme,10\nSKU2,Gadget,Acme,ten\nSKU3, Sprocket , Bolt Co ,3\n",
        )
        .unwrap();

        let (table, rejected) = ShelfLifeTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(rejected.len(), 1);
        let sprocket = table.get("SKU3").unwrap();
        assert_eq!(sprocket.name, "Sprocket");
        assert_eq!(sprocket.brand, "Bolt Co");
        assert_eq!(
            table.expiration_record("SKU1", date(2024, 1, 1)),
            ExpirationRecord::new("SKU1", "Widget", "Acme", date(2024, 1, 11))
        );
    }

    #[test]
    fn invalid_utf8_row_only_costs_that_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shelflife.csv");
        let mut bytes = b"SKU,Name,Brand,Shelf Life\n".to_vec();
        bytes.extend_from_slice(b"SKU1,Caf\xe9,Acme,10\n");
        bytes.extend_from_slice(b"SKU2,Gadget,Acme,4\n");
        fs::write(&path, bytes).unwrap();

        let (table, rejected) = ShelfLifeTable::load(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("SKU2").is_some());
        assert!(matches!(
            rejected.as_slice(),
            [TrackerError::MalformedRow { line: 2, .. }]
        ));
    }

    #[test]
    fn missing_table_is_reported() {
        let dir = tempdir().unwrap();
        let err = ShelfLifeTable::load(&dir.path().join("shelflife.csv")).unwrap_err();
        assert!(err.is_missing_file());
    }
}
