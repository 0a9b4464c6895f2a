use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use csv::{ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use tracing::{debug, warn};

use crate::{
    errors::{Diagnostics, Result, TrackerError},
    ledger::record::{decode_row, sort_by_expiration, ExpirationRecord, RECORD_HEADER},
    utils::tmp_path,
};

/// Decoded contents of a ledger-schema CSV file.
#[derive(Debug, Default)]
pub struct RecordTable {
    /// First row of the file, `None` when the file is empty.
    pub header: Option<Vec<String>>,
    pub records: Vec<ExpirationRecord>,
    /// Rows that failed to decode; they are left out of `records`.
    pub rejected: Diagnostics,
}

impl RecordTable {
    pub fn data_row_count(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    /// Header to write back, falling back to the canonical one.
    pub fn header_or_default(&self) -> Vec<String> {
        self.header.clone().unwrap_or_else(default_header)
    }
}

pub fn default_header() -> Vec<String> {
    RECORD_HEADER.iter().map(|column| column.to_string()).collect()
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|err| TrackerError::from_io(err, path))?;
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file))
}

/// Turns a csv read failure on one row into a row diagnostic.
///
/// I/O failures still abort the read; anything else (invalid UTF-8, a broken
/// quote) only costs the offending row.
pub(crate) fn row_error(path: &Path, err: csv::Error, fallback_line: u64) -> Result<TrackerError> {
    let line = err
        .position()
        .map(|pos| pos.line())
        .unwrap_or(fallback_line);
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Err(TrackerError::Io(io)),
        _ => Ok(TrackerError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason,
        }),
    }
}

fn is_blank(row: &StringRecord) -> bool {
    row.iter().all(str::is_empty)
}

/// Reads a ledger-schema file, skipping the header and collecting undecodable rows.
///
/// Blank and whitespace-only lines are ignored, so the header is the first
/// row with content. A first row that cannot be read still counts as the header.
pub fn read_records(path: &Path) -> Result<RecordTable> {
    let mut reader = open_reader(path)?;
    let mut table = RecordTable::default();
    let mut header_seen = false;
    for (idx, row) in reader.records().enumerate() {
        let fallback_line = idx as u64 + 1;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                let err = row_error(path, err, fallback_line)?;
                warn!(path = %path.display(), error = %err, "skipping unreadable row");
                header_seen = true;
                table.rejected.push(err);
                continue;
            }
        };
        if is_blank(&row) {
            continue;
        }
        if !header_seen {
            header_seen = true;
            table.header = Some(row.iter().map(str::to_string).collect());
            continue;
        }
        let line = row
            .position()
            .map(|pos| pos.line())
            .unwrap_or(fallback_line);
        match decode_row(&row, path, line) {
            Ok(record) => table.records.push(record),
            Err(err) => {
                warn!(path = %path.display(), line, error = %err, "skipping row");
                table.rejected.push(err);
            }
        }
    }
    Ok(table)
}

/// Returns the first column of every data row, header skipped.
///
/// Unreadable rows are logged and skipped.
pub fn read_first_column(path: &Path) -> Result<Vec<String>> {
    let mut reader = open_reader(path)?;
    let mut values = Vec::new();
    let mut header_seen = false;
    for (idx, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                let err = row_error(path, err, idx as u64 + 1)?;
                warn!(path = %path.display(), error = %err, "skipping unreadable row");
                header_seen = true;
                continue;
            }
        };
        if is_blank(&row) {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }
        if let Some(first) = row.get(0) {
            if !first.is_empty() {
                values.push(first.to_string());
            }
        }
    }
    Ok(values)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            Err(TrackerError::MissingFile(parent.to_path_buf()))
        }
        _ => Ok(()),
    }
}

fn csv_writer<W: Write>(sink: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(sink)
}

/// Replaces the file with `header` followed by `records`, staging through a temp file.
pub fn write_records(path: &Path, header: &[String], records: &[ExpirationRecord]) -> Result<()> {
    ensure_parent(path)?;
    let tmp = tmp_path(path);
    {
        let file = File::create(&tmp).map_err(|err| TrackerError::from_io(err, &tmp))?;
        let mut writer = csv_writer(file);
        writer.write_record(header)?;
        for record in records {
            writer.write_record(record.to_row())?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), rows = records.len(), "rewrote record file");
    Ok(())
}

/// Truncates the file to the canonical header alone.
pub fn write_header_only(path: &Path) -> Result<()> {
    write_records(path, &default_header(), &[])
}

fn ends_without_newline(file: &mut File, len: u64) -> Result<bool> {
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// True when the file holds no row at all, blank lines aside.
fn lacks_header(path: &Path) -> Result<bool> {
    match read_records(path) {
        Ok(table) => Ok(table.header.is_none() && table.data_row_count() == 0),
        Err(err) if err.is_missing_file() => Ok(true),
        Err(err) => Err(err),
    }
}

/// Appends rows, writing the canonical header first when the file is absent,
/// empty, or holds only blank lines.
pub fn append_records(path: &Path, records: &[ExpirationRecord]) -> Result<()> {
    ensure_parent(path)?;
    let needs_header = lacks_header(path)?;
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| TrackerError::from_io(err, path))?;
    let len = file.metadata()?.len();
    if ends_without_newline(&mut file, len)? {
        file.write_all(b"\n")?;
    }
    let mut writer = csv_writer(&mut file);
    if needs_header {
        writer.write_record(RECORD_HEADER)?;
    }
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = records.len(), "appended records");
    Ok(())
}

/// Re-reads the file and rewrites it with its data rows ordered by expiration date.
///
/// Rows that fail to decode are reported and dropped from the rewritten file.
pub fn sort_file(path: &Path) -> Result<Diagnostics> {
    let mut table = read_records(path)?;
    sort_by_expiration(&mut table.records);
    write_records(path, &table.header_or_default(), &table.records)?;
    Ok(table.rejected)
}
