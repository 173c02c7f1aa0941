use std::io;
use std::path::Path;

use thiserror::Error;

use crate::io::atomic_write_string;
use crate::state::data_model::SnapshotRow;

pub const ROW_NUMBER_HEADER: &str = "Sl. No.";

#[derive(Debug, Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("exported CSV is not valid UTF-8")]
    Encoding,
}

pub fn export_file_name(file_name: &str) -> String {
    format!("{file_name}.csv")
}

/// Renders rows in snapshot order. `columns` are the visible data columns in
/// schema order; the first field of each line is the 1-based row position.
pub fn render_csv(columns: &[String], rows: &[SnapshotRow]) -> Result<String, CsvExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push(ROW_NUMBER_HEADER);
    header.extend(columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    for (idx, row) in rows.iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push((idx + 1).to_string());
        record.extend(columns.iter().map(|col| row.value(col).to_string()));
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| CsvExportError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|_| CsvExportError::Encoding)
}

pub fn save_csv(
    path: &Path,
    columns: &[String],
    rows: &[SnapshotRow],
) -> Result<(), CsvExportError> {
    let content = render_csv(columns, rows)?;
    atomic_write_string(path, &content)?;
    Ok(())
}
