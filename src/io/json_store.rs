use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::io::atomic_write_string;
use crate::io::store::{Database, FileStore, StoreError};
use crate::state::data_model::{CreateFileRequest, CsvFileRecord, FileId, SaveRequest, UserId};

#[derive(Debug, Error)]
pub enum JsonStoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("store parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<JsonStoreError> for StoreError {
    fn from(value: JsonStoreError) -> Self {
        StoreError::Storage(value.to_string())
    }
}

/// A missing file reads as an empty store.
pub fn load_database(path: &Path) -> Result<Database, JsonStoreError> {
    if !path.exists() {
        return Ok(Database::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_database(path: &Path, db: &Database) -> Result<(), JsonStoreError> {
    let content = serde_json::to_string_pretty(db)?;
    atomic_write_string(path, &content)?;
    Ok(())
}

/// Store backed by a single JSON document on disk. Every operation reads
/// the document, applies the change and writes it back atomically.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    caller: UserId,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, caller: UserId) -> Self {
        Self {
            path: path.into(),
            caller,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn caller(&self) -> &UserId {
        &self.caller
    }

    pub fn load(&self) -> Result<Database, StoreError> {
        Ok(load_database(&self.path)?)
    }

    /// Runs `op` against the loaded document and persists it when `op`
    /// succeeds.
    pub fn update<T>(
        &self,
        op: impl FnOnce(&mut Database) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut db = self.load()?;
        let out = op(&mut db)?;
        save_database(&self.path, &db)?;
        debug!(path = %self.path.display(), "store written");
        Ok(out)
    }
}

impl FileStore for JsonFileStore {
    async fn fetch_file(&self, id: &FileId) -> Result<CsvFileRecord, StoreError> {
        self.load()?.fetch(&self.caller, id)
    }

    async fn save_file(&self, request: &SaveRequest) -> Result<CsvFileRecord, StoreError> {
        self.update(|db| db.apply_save(&self.caller, request))
    }

    async fn create_file(&self, request: &CreateFileRequest) -> Result<CsvFileRecord, StoreError> {
        let file = self.update(|db| db.create(&self.caller, request, Utc::now()))?;
        info!(file = %file.id, rows = file.row_count, "file created");
        Ok(file)
    }
}
