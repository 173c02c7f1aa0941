use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::state::data_model::{
    BatchType, BatchTypeId, CreateFileRequest, CsvFileRecord, FileId, RowId, SaveRequest,
    StoredRow, UserId,
};

/// Failures reported by the collaborating store. None of them is retried
/// automatically by the edit session.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("CSV file not found")]
    NotFound,
    #[error("Not authorized")]
    Unauthorized,
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Store operations consumed by the grid core.
#[allow(async_fn_in_trait)]
pub trait FileStore {
    async fn fetch_file(&self, id: &FileId) -> Result<CsvFileRecord, StoreError>;

    /// Applies deletions before updates and keeps surviving row identities.
    async fn save_file(&self, request: &SaveRequest) -> Result<CsvFileRecord, StoreError>;

    async fn create_file(&self, request: &CreateFileRequest) -> Result<CsvFileRecord, StoreError>;
}

/// Whole-store document: batch types, files and the id counter.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub batch_types: Vec<BatchType>,
    #[serde(default)]
    pub files: Vec<CsvFileRecord>,
    #[serde(default)]
    next_id: u64,
}

impl Database {
    pub fn add_batch_type(
        &mut self,
        name: &str,
        columns: Vec<String>,
        required_column_indexes: Vec<usize>,
    ) -> BatchType {
        let batch_type = BatchType {
            id: BatchTypeId::new(self.allocate_id("bt")),
            name: name.to_string(),
            columns,
            required_column_indexes,
        };
        self.batch_types.push(batch_type.clone());
        batch_type
    }

    pub fn batch_type(&self, id: &BatchTypeId) -> Option<&BatchType> {
        self.batch_types.iter().find(|bt| &bt.id == id)
    }

    pub fn files_for(&self, caller: &UserId) -> Vec<&CsvFileRecord> {
        let mut files: Vec<&CsvFileRecord> =
            self.files.iter().filter(|f| &f.owner == caller).collect();
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        files
    }

    pub fn fetch(&self, caller: &UserId, id: &FileId) -> Result<CsvFileRecord, StoreError> {
        let file = self.owned_file(caller, id)?;
        Ok(sorted_by_sort_order(file.clone()))
    }

    /// Validates the whole request before touching anything, so a rejected
    /// save leaves the stored file unchanged.
    pub fn apply_save(
        &mut self,
        caller: &UserId,
        request: &SaveRequest,
    ) -> Result<CsvFileRecord, StoreError> {
        self.owned_file(caller, &request.id)?;
        let file = self
            .files
            .iter_mut()
            .find(|f| f.id == request.id)
            .ok_or(StoreError::NotFound)?;

        let deleted: BTreeSet<&RowId> = request.deleted_row_ids.iter().collect();
        let surviving: BTreeSet<&RowId> = file
            .rows
            .iter()
            .map(|row| &row.id)
            .filter(|id| !deleted.contains(id))
            .collect();
        if let Some(unknown) = request.rows.iter().find(|row| !surviving.contains(&row.id)) {
            return Err(StoreError::Validation(format!(
                "row {} does not belong to file {}",
                unknown.id, request.id
            )));
        }

        file.rows.retain(|row| !deleted.contains(&row.id));
        for update in &request.rows {
            if let Some(row) = file.rows.iter_mut().find(|row| row.id == update.id) {
                row.row_data = update.row_data.clone();
                row.sort_order = update.sort_order;
            }
        }
        file.file_name = request.file_name.clone();
        file.row_count = file.rows.len();
        debug!(
            file = %request.id,
            updated = request.rows.len(),
            deleted = request.deleted_row_ids.len(),
            "save applied"
        );

        Ok(sorted_by_sort_order(file.clone()))
    }

    pub fn create(
        &mut self,
        caller: &UserId,
        request: &CreateFileRequest,
        uploaded_at: DateTime<Utc>,
    ) -> Result<CsvFileRecord, StoreError> {
        let batch_type = self
            .batch_type(&request.batch_type_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::Validation(format!("unknown batch type {}", request.batch_type_id))
            })?;

        let file_id = FileId::new(self.allocate_id("file"));
        let rows = request
            .rows
            .iter()
            .map(|row| StoredRow {
                id: RowId::new(self.allocate_id("row")),
                row_data: row.row_data.clone(),
                row_index: row.row_index,
                sort_order: row.sort_order,
            })
            .collect::<Vec<_>>();

        let file = CsvFileRecord {
            id: file_id,
            file_name: request.file_name.clone(),
            original_name: request.original_name.clone(),
            owner: caller.clone(),
            batch_type,
            row_count: rows.len(),
            uploaded_at,
            rows,
        };
        self.files.push(file.clone());
        Ok(sorted_by_sort_order(file))
    }

    fn owned_file(&self, caller: &UserId, id: &FileId) -> Result<&CsvFileRecord, StoreError> {
        let file = self
            .files
            .iter()
            .find(|f| &f.id == id)
            .ok_or(StoreError::NotFound)?;
        if &file.owner != caller {
            return Err(StoreError::Unauthorized);
        }
        Ok(file)
    }

    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:06}", self.next_id)
    }
}

fn sorted_by_sort_order(mut file: CsvFileRecord) -> CsvFileRecord {
    file.rows.sort_by_key(|row| row.sort_order);
    file
}

#[derive(Debug, Default)]
struct MemoryInner {
    db: Database,
    injected_failures: VecDeque<StoreError>,
    saves: Vec<SaveRequest>,
}

/// In-process store acting as one caller. Clones share the same data.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    caller: UserId,
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new(caller: UserId, db: Database) -> Self {
        Self {
            caller,
            inner: Rc::new(RefCell::new(MemoryInner {
                db,
                ..MemoryInner::default()
            })),
        }
    }

    /// Same data, different caller identity.
    pub fn as_user(&self, caller: UserId) -> Self {
        Self {
            caller,
            inner: Rc::clone(&self.inner),
        }
    }

    /// The next save fails with `error` instead of touching the data.
    pub fn fail_next_save(&self, error: StoreError) {
        self.inner.borrow_mut().injected_failures.push_back(error);
    }

    /// Every save request received, including rejected ones.
    pub fn saves(&self) -> Vec<SaveRequest> {
        self.inner.borrow().saves.clone()
    }

    pub fn database(&self) -> Database {
        self.inner.borrow().db.clone()
    }
}

impl FileStore for MemoryStore {
    async fn fetch_file(&self, id: &FileId) -> Result<CsvFileRecord, StoreError> {
        self.inner.borrow().db.fetch(&self.caller, id)
    }

    async fn save_file(&self, request: &SaveRequest) -> Result<CsvFileRecord, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.saves.push(request.clone());
        if let Some(error) = inner.injected_failures.pop_front() {
            return Err(error);
        }
        inner.db.apply_save(&self.caller, request)
    }

    async fn create_file(&self, request: &CreateFileRequest) -> Result<CsvFileRecord, StoreError> {
        self.inner
            .borrow_mut()
            .db
            .create(&self.caller, request, Utc::now())
    }
}
