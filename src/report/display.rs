use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    cli::ui::table_renderer::{Alignment, Table, TableColumn},
    errors::{Result, TrackerError},
    ledger::{format_date, ExpirationRecord, RECORD_HEADER},
};

use super::ReportWindow;

const RENDERED_EXTENSION: &str = "txt";

/// Renders the records inside `window` as a boxed plain-text table.
pub fn render_report(records: &[ExpirationRecord], window: &ReportWindow) -> String {
    let mut columns: Vec<TableColumn> = RECORD_HEADER
        .iter()
        .map(|header| TableColumn::new(*header, Alignment::Left))
        .collect();
    columns.push(TableColumn::new("Days Left", Alignment::Right));

    let mut table = Table::new(columns);
    for record in records.iter().filter(|record| window.contains(record)) {
        table.push_row(vec![
            record.identifier.clone(),
            record.name.clone(),
            record.brand.clone(),
            format_date(record.expiration_date),
            record.days_until(window.today).to_string(),
        ]);
    }
    table.render()
}

/// Sibling of the report file with a `.txt` extension.
pub fn rendered_path(report: &Path) -> PathBuf {
    report.with_extension(RENDERED_EXTENSION)
}

/// Writes the rendered table next to `report` and returns where it went.
pub fn write_rendered(report: &Path, rendered: &str) -> Result<PathBuf> {
    let path = rendered_path(report);
    fs::write(&path, format!("{rendered}\n")).map_err(|err| TrackerError::from_io(err, &path))?;
    Ok(path)
}
