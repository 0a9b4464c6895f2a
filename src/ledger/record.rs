use std::{fmt, path::Path};

use chrono::NaiveDate;
use csv::StringRecord;

use crate::errors::{Result, TrackerError};

/// Calendar format used for every date column on disk and on the command line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical header shared by the history ledger and the expiry report.
pub const RECORD_HEADER: [&str; 4] = ["SKU", "Name", "Brand", "Expiration Date"];

/// A single computed expiration, the row type of both the ledger and the report.
///
/// Equality and hashing cover all four fields, so two records computed for the
/// same SKU with different expiration dates are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpirationRecord {
    pub identifier: String,
    pub name: String,
    pub brand: String,
    pub expiration_date: NaiveDate,
}

impl ExpirationRecord {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        brand: impl Into<String>,
        expiration_date: NaiveDate,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            brand: brand.into(),
            expiration_date,
        }
    }

    /// Signed number of days from `today` until expiry; negative once expired.
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.expiration_date - today).num_days()
    }

    pub fn to_row(&self) -> [String; 4] {
        [
            self.identifier.clone(),
            self.name.clone(),
            self.brand.clone(),
            format_date(self.expiration_date),
        ]
    }
}

impl fmt::Display for ExpirationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) expires {}",
            self.identifier,
            self.name,
            self.brand,
            format_date(self.expiration_date)
        )
    }
}

/// Decodes a positional `SKU, Name, Brand, Expiration Date` row.
pub(crate) fn decode_row(fields: &StringRecord, path: &Path, line: u64) -> Result<ExpirationRecord> {
    if fields.len() < RECORD_HEADER.len() {
        return Err(TrackerError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason: format!(
                "expected {} columns, found {}",
                RECORD_HEADER.len(),
                fields.len()
            ),
        });
    }
    let raw_date = &fields[3];
    let expiration_date =
        NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| TrackerError::MalformedDate {
            value: raw_date.to_string(),
            line: Some(line),
        })?;
    Ok(ExpirationRecord {
        identifier: fields[0].to_string(),
        name: fields[1].to_string(),
        brand: fields[2].to_string(),
        expiration_date,
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` date, reporting the raw value on failure.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| TrackerError::MalformedDate {
        value: value.to_string(),
        line: None,
    })
}

/// Orders records by expiration date ascending. Stable, so equal dates keep read order.
pub fn sort_by_expiration(records: &mut [ExpirationRecord]) {
    records.sort_by_key(|record| record.expiration_date);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn duplicate_requires_every_field() {
        let a = ExpirationRecord::new("SKU1", "Widget", "Acme", date(2024, 1, 11));
        let b = ExpirationRecord::new("SKU1", "Widget", "Acme", date(2024, 1, 12));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn days_until_goes_negative_after_expiry() {
        let record = ExpirationRecord::new("SKU1", "Widget", "Acme", date(2024, 1, 11));
        assert_eq!(record.days_until(date(2024, 1, 8)), 3);
        assert_eq!(record.days_until(date(2024, 1, 13)), -2);
    }

    #[test]
    fn malformed_row_date_reports_raw_value() {
        let row = StringRecord::from(vec!["S", "N", "B", "2024/01/01"]);
        let err = decode_row(&row, Path::new("history.csv"), 4).unwrap_err();
        assert_eq!(err.to_string(), "Invalid date format: 2024/01/01");
    }

    #[test]
    fn short_row_is_malformed() {
        let row = StringRecord::from(vec!["S", "N"]);
        let err = decode_row(&row, Path::new("history.csv"), 2).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn sort_keeps_read_order_for_equal_dates() {
        let mut records = vec![
            ExpirationRecord::new("B", "n", "b", date(2024, 1, 5)),
            ExpirationRecord::new("Z", "n", "b", date(2024, 1, 1)),
            ExpirationRecord::new("A", "n", "b", date(2024, 1, 5)),
        ];
        sort_by_expiration(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["Z", "B", "A"]);
    }

    #[test]
    fn parse_date_trims_whitespace() {
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), date(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
    }
}
