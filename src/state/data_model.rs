use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column name to cell text for one row.
pub type RowData = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchTypeId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

macro_rules! impl_id {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

impl_id!(FileId, RowId, BatchTypeId, UserId);

/// Schema of an imported file: ordered column names plus required columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchType {
    pub id: BatchTypeId,
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub required_column_indexes: Vec<usize>,
}

impl BatchType {
    pub fn required_columns(&self) -> Vec<&str> {
        self.required_column_indexes
            .iter()
            .filter_map(|idx| self.columns.get(*idx))
            .map(String::as_str)
            .collect()
    }

    pub fn is_required(&self, column: &str) -> bool {
        self.required_columns().contains(&column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRow {
    pub id: RowId,
    pub row_data: RowData,
    pub row_index: usize,
    pub sort_order: usize,
}

/// A file as returned by the store, rows ordered by `sort_order`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvFileRecord {
    pub id: FileId,
    pub file_name: String,
    pub original_name: String,
    pub owner: UserId,
    pub batch_type: BatchType,
    pub row_count: usize,
    pub uploaded_at: DateTime<Utc>,
    pub rows: Vec<StoredRow>,
}

/// Row as held in the local edit snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRow {
    pub id: RowId,
    pub row_data: RowData,
    pub row_index: usize,
    pub sort_order: usize,
}

impl SnapshotRow {
    pub fn value(&self, column: &str) -> &str {
        self.row_data.get(column).map(String::as_str).unwrap_or("")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowUpdate {
    pub id: RowId,
    pub row_data: RowData,
    pub sort_order: usize,
}

/// Payload of the store's save operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub id: FileId,
    pub file_name: String,
    pub rows: Vec<RowUpdate>,
    pub deleted_row_ids: Vec<RowId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRow {
    pub row_data: RowData,
    pub row_index: usize,
    pub sort_order: usize,
}

/// Payload of the store's create operation, produced by CSV import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    pub file_name: String,
    pub original_name: String,
    pub batch_type_id: BatchTypeId,
    pub rows: Vec<NewRow>,
}
