use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    errors::{Diagnostics, Result},
    storage::{self, RecordTable},
};

use super::record::ExpirationRecord;

/// Durable store of every computed expiration, kept sorted by expiration date.
///
/// Appends do not deduplicate: the same record written twice is stored twice.
/// Value-level deduplication happens when the expiry report is derived.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    path: PathBuf,
}

impl HistoryLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record and re-sorts the whole store by expiration date.
    ///
    /// The file is created with its header on first write. Rows that no longer
    /// decode are dropped by the re-sort and returned as diagnostics.
    pub fn append(&self, record: &ExpirationRecord) -> Result<Diagnostics> {
        self.append_all(std::slice::from_ref(record))
    }

    /// Appends a batch and sorts once; leaves the store in the same state as
    /// calling [`HistoryLedger::append`] per record.
    pub fn append_all(&self, records: &[ExpirationRecord]) -> Result<Diagnostics> {
        storage::append_records(&self.path, records)?;
        let rejected = storage::sort_file(&self.path)?;
        debug!(ledger = %self.path.display(), appended = records.len(), "ledger appended");
        Ok(rejected)
    }

    /// Loads every data row. A missing ledger is `TrackerError::MissingFile`.
    pub fn read_all(&self) -> Result<RecordTable> {
        storage::read_records(&self.path)
    }

    /// Loads the ledger as a value-deduplicated list, first occurrence kept.
    pub fn read_unique(&self) -> Result<(Vec<ExpirationRecord>, RecordTable)> {
        let mut table = self.read_all()?;
        let mut seen = HashSet::new();
        let unique = std::mem::take(&mut table.records)
            .into_iter()
            .filter(|record| seen.insert(record.clone()))
            .collect();
        Ok((unique, table))
    }

    /// Rewrites the ledger without any record whose identifier is in `identifiers`.
    ///
    /// Header and relative row order are preserved; no re-sort happens here.
    /// Returns the number of rows removed along with undecodable-row diagnostics.
    pub fn remove_where_identifier_in(
        &self,
        identifiers: &HashSet<String>,
    ) -> Result<(usize, Diagnostics)> {
        let table = self.read_all()?;
        let header = table.header_or_default();
        let before = table.records.len();
        let kept: Vec<ExpirationRecord> = table
            .records
            .into_iter()
            .filter(|record| !identifiers.contains(&record.identifier))
            .collect();
        storage::write_records(&self.path, &header, &kept)?;
        let removed = before - kept.len();
        debug!(ledger = %self.path.display(), removed, "ledger purged");
        Ok((removed, table.rejected))
    }

    /// Truncates the ledger back to its header.
    pub fn clear(&self) -> Result<()> {
        storage::write_header_only(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn record(id: &str, day: u32) -> ExpirationRecord {
        ExpirationRecord::new(id, "Widget", "Acme", NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
    }

    #[test]
    fn append_keeps_store_sorted() {
        let dir = tempdir().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history.csv"));
        ledger.append(&record("C", 20)).unwrap();
        ledger.append(&record("A", 3)).unwrap();
        ledger.append(&record("B", 9)).unwrap();

        let ids: Vec<String> = ledger
            .read_all()
            .unwrap()
            .records
            .into_iter()
            .map(|r| r.identifier)
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn append_does_not_deduplicate() {
        let dir = tempdir().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history.csv"));
        ledger.append(&record("A", 3)).unwrap();
        ledger.append(&record("A", 3)).unwrap();

        assert_eq!(ledger.read_all().unwrap().records.len(), 2);
        assert_eq!(ledger.read_unique().unwrap().0.len(), 1);
    }

    #[test]
    fn batched_append_matches_per_record_append() {
        let dir = tempdir().unwrap();
        let one_by_one = HistoryLedger::new(dir.path().join("a.csv"));
        let batched = HistoryLedger::new(dir.path().join("b.csv"));
        let records = vec![record("C", 20), record("A", 3), record("B", 9)];
        for r in &records {
            one_by_one.append(r).unwrap();
        }
        batched.append_all(&records).unwrap();

        assert_eq!(
            fs::read_to_string(one_by_one.path()).unwrap(),
            fs::read_to_string(batched.path()).unwrap()
        );
    }

    #[test]
    fn remove_by_identifier_ignores_dates() {
        let dir = tempdir().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history.csv"));
        ledger
            .append_all(&[record("A", 1), record("B", 5), record("A", 9)])
            .unwrap();

        let ids = HashSet::from(["A".to_string()]);
        let (removed, rejected) = ledger.remove_where_identifier_in(&ids).unwrap();
        assert_eq!(removed, 2);
        assert!(rejected.is_empty());
        assert_eq!(ledger.read_all().unwrap().records, vec![record("B", 5)]);
    }

    #[test]
    fn remove_on_missing_ledger_writes_nothing() {
        let dir = tempdir().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history.csv"));
        let err = ledger
            .remove_where_identifier_in(&HashSet::new())
            .unwrap_err();
        assert!(err.is_missing_file());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn clear_leaves_header_only() {
        let dir = tempdir().unwrap();
        let ledger = HistoryLedger::new(dir.path().join("history.csv"));
        ledger.append(&record("A", 1)).unwrap();
        ledger.clear().unwrap();
        assert_eq!(
            fs::read_to_string(ledger.path()).unwrap(),
            "SKU,Name,Brand,Expiration Date\n"
        );
        assert_eq!(ledger.read_all().unwrap().data_row_count(), 0);
    }

    #[test]
    fn malformed_rows_are_dropped_on_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut contents = String::from("SKU,Name,Brand,Expiration Date\n");
        for day in 1..=9 {
            contents.push_str(&format!("S{day},Widget,Acme,2024-01-{day:02}\n"));
        }
        contents.push_str("BAD,Widget,Acme,2024-13-40\n");
        fs::write(&path, contents).unwrap();

        let ledger = HistoryLedger::new(&path);
        let rejected = ledger.append(&record("NEW", 20)).unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(ledger.read_all().unwrap().records.len(), 10);
    }

    #[test]
    fn unreadable_row_does_not_block_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut bytes = b"SKU,Name,Brand,Expiration Date\n".to_vec();
        bytes.extend_from_slice(b"S9,Widget,Acme,2024-01-09\n");
        bytes.extend_from_slice(b"BAD,Caf\xe9,Acme,2024-01-05\n");
        fs::write(&path, bytes).unwrap();

        let ledger = HistoryLedger::new(&path);
        let rejected = ledger.append(&record("SKU1", 2)).unwrap();
        assert_eq!(rejected.len(), 1);
        let second = ledger.append(&record("SKU2", 12)).unwrap();
        assert!(second.is_empty());

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "SKU,Name,Brand,Expiration Date\n\
             SKU1,Widget,Acme,2024-01-02\n\
             S9,Widget,Acme,2024-01-09\n\
             SKU2,Widget,Acme,2024-01-12\n"
        );
    }
}
