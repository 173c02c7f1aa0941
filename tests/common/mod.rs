#![allow(dead_code)]

use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};

use csvgrid::config::RefetchPolicy;
use csvgrid::io::store::{Database, MemoryStore};
use csvgrid::state::data_model::{
    BatchType, BatchTypeId, CsvFileRecord, FileId, RowData, RowId, StoredRow, UserId,
};
use csvgrid::state::session::EditSession;

pub const AUTOSAVE: Duration = Duration::from_millis(2000);
pub const CELL_COMMIT: Duration = Duration::from_millis(300);

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

pub fn row_data(pairs: &[(&str, &str)]) -> RowData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn batch_type() -> BatchType {
    BatchType {
        id: BatchTypeId::new("bt-1"),
        name: "Shipments".to_string(),
        columns: vec!["Name".to_string(), "Qty".to_string(), "City".to_string()],
        required_column_indexes: vec![0],
    }
}

/// Three rows `r1`..`r3` named A, B and C.
pub fn sample_file() -> CsvFileRecord {
    let rows = [("r1", "A", "10", "Oslo"), ("r2", "B", "2", "Bergen"), ("r3", "C", "7", "Oslo")]
        .iter()
        .enumerate()
        .map(|(idx, (id, name, qty, city))| StoredRow {
            id: RowId::new(*id),
            row_data: row_data(&[("Name", name), ("Qty", qty), ("City", city)]),
            row_index: idx,
            sort_order: idx,
        })
        .collect::<Vec<_>>();

    CsvFileRecord {
        id: FileId::new("file-1"),
        file_name: "shipments".to_string(),
        original_name: "shipments.csv".to_string(),
        owner: UserId::new("alice"),
        batch_type: batch_type(),
        row_count: rows.len(),
        uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        rows,
    }
}

pub fn sample_store() -> MemoryStore {
    let mut db = Database::default();
    db.batch_types.push(batch_type());
    db.files.push(sample_file());
    MemoryStore::new(UserId::new("alice"), db)
}

pub fn session(policy: RefetchPolicy) -> EditSession {
    EditSession::with_timing(&sample_file(), AUTOSAVE, CELL_COMMIT, policy)
}

pub fn row(id: &str) -> RowId {
    RowId::new(id)
}

pub fn start() -> Instant {
    Instant::now()
}
