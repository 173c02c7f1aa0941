use std::collections::BTreeSet;

use tracing::debug;

use crate::state::data_model::{CsvFileRecord, RowId, RowUpdate, SnapshotRow};

/// Rows to upsert and rows to delete, computed against the last persisted
/// row set.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RowSetDiff {
    pub deleted_row_ids: Vec<RowId>,
    pub updated_rows: Vec<RowUpdate>,
}

/// Authoritative local copy of one file's rows during an edit session.
///
/// Only constructible from a fetched file, so every mutation operates on an
/// initialized snapshot. Rows are never renumbered: `sort_order` is derived
/// from list position when a diff is computed.
#[derive(Clone, Debug, PartialEq)]
pub struct EditState {
    file_name: String,
    rows: Vec<SnapshotRow>,
    baseline: Vec<SnapshotRow>,
    dirty: bool,
    revision: u64,
}

impl EditState {
    pub fn from_file(file: &CsvFileRecord) -> Self {
        let mut state = Self {
            file_name: String::new(),
            rows: Vec::new(),
            baseline: Vec::new(),
            dirty: false,
            revision: 0,
        };
        state.initialize(file);
        state
    }

    /// Replaces the snapshot wholesale. Unflushed local edits are discarded.
    pub fn initialize(&mut self, file: &CsvFileRecord) {
        self.file_name = file.file_name.clone();
        self.rows = file
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| SnapshotRow {
                id: row.id.clone(),
                row_data: row.row_data.clone(),
                row_index: idx,
                sort_order: idx,
            })
            .collect();
        self.baseline = self.rows.clone();
        self.dirty = false;
        self.revision += 1;
        debug!(file = %file.id, rows = self.rows.len(), "snapshot seeded");
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    pub fn row(&self, row_id: &RowId) -> Option<&SnapshotRow> {
        self.rows.iter().find(|row| &row.id == row_id)
    }

    /// Row set as of the last successful persistence.
    pub fn baseline(&self) -> &[SnapshotRow] {
        &self.baseline
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bumped on every mutation; lets a flush detect edits made while it was
    /// in flight.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn cell_value(&self, row_id: &RowId, column: &str) -> Option<&str> {
        self.row(row_id)
            .and_then(|row| row.row_data.get(column))
            .map(String::as_str)
    }

    /// Unknown row ids still mark the snapshot dirty.
    pub fn set_cell_value(&mut self, row_id: &RowId, column: &str, value: String) {
        if let Some(row) = self.rows.iter_mut().find(|row| &row.id == row_id) {
            row.row_data.insert(column.to_string(), value);
        } else {
            debug!(row = %row_id, column, "cell edit for missing row ignored");
        }
        self.touch();
    }

    pub fn delete_row(&mut self, row_id: &RowId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| &row.id != row_id);
        self.touch();
        self.rows.len() != before
    }

    pub fn rename_file(&mut self, new_name: String) {
        self.file_name = new_name;
        self.touch();
    }

    /// Every surviving row is included in `updated_rows`, re-indexed by its
    /// current list position.
    pub fn compute_diff(&self, original_rows: &[SnapshotRow]) -> RowSetDiff {
        let current: BTreeSet<&RowId> = self.rows.iter().map(|row| &row.id).collect();
        let deleted_row_ids = original_rows
            .iter()
            .filter(|row| !current.contains(&row.id))
            .map(|row| row.id.clone())
            .collect();

        let updated_rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| RowUpdate {
                id: row.id.clone(),
                row_data: row.row_data.clone(),
                sort_order: position,
            })
            .collect();

        RowSetDiff {
            deleted_row_ids,
            updated_rows,
        }
    }

    pub fn diff_against_baseline(&self) -> RowSetDiff {
        self.compute_diff(&self.baseline)
    }

    /// Records a successful flush of `persisted`. Dirty is cleared only when
    /// nothing changed since the flush was taken at `revision`.
    pub fn mark_persisted(&mut self, persisted: &RowSetDiff, revision: u64) {
        self.baseline = persisted
            .updated_rows
            .iter()
            .enumerate()
            .map(|(idx, row)| SnapshotRow {
                id: row.id.clone(),
                row_data: row.row_data.clone(),
                row_index: idx,
                sort_order: row.sort_order,
            })
            .collect();
        if self.revision == revision {
            self.dirty = false;
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }
}
