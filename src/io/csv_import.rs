use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::state::data_model::{BatchType, CreateFileRequest, NewRow, RowData};

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),
    #[error("CSV file has no header row")]
    MissingHeader,
    #[error("required column '{0}' has no matching header")]
    MissingRequiredColumn(String),
}

/// Builds create-file rows from CSV text. Headers are matched to the batch
/// type's columns by exact name; unmatched headers are dropped.
pub fn parse_import(
    content: &str,
    batch_type: &BatchType,
    file_name: &str,
    original_name: &str,
) -> Result<CreateFileRequest, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(CsvImportError::MissingHeader);
    }

    let mapping: Vec<(usize, &str)> = batch_type
        .columns
        .iter()
        .filter_map(|column| {
            headers
                .iter()
                .position(|h| h == column)
                .map(|idx| (idx, column.as_str()))
        })
        .collect();

    if let Some(missing) = batch_type
        .required_columns()
        .into_iter()
        .find(|required| !mapping.iter().any(|(_, column)| column == required))
    {
        return Err(CsvImportError::MissingRequiredColumn(missing.to_string()));
    }

    let mut rows = Vec::new();
    for (position, record) in reader.records().enumerate() {
        let record = record?;
        let row_data: RowData = mapping
            .iter()
            .filter_map(|(idx, column)| {
                record
                    .get(*idx)
                    .map(|value| (column.to_string(), value.to_string()))
            })
            .collect();
        rows.push(NewRow {
            row_data,
            row_index: position,
            sort_order: position,
        });
    }

    Ok(CreateFileRequest {
        file_name: file_name.to_string(),
        original_name: original_name.to_string(),
        batch_type_id: batch_type.id.clone(),
        rows,
    })
}

/// Reads `path` and imports it under its file stem as the display name.
pub fn load_import(
    path: &Path,
    batch_type: &BatchType,
) -> Result<CreateFileRequest, CsvImportError> {
    let content = fs::read_to_string(path)?;
    let original_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_name.clone());
    parse_import(&content, batch_type, &file_name, &original_name)
}
