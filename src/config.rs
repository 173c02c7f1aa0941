//! Runtime configuration: defaults, an optional JSON file, then environment
//! overrides.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::state::data_model::UserId;

pub const CONFIG_ENV: &str = "CSVGRID_CONFIG";
pub const STORE_ENV: &str = "CSVGRID_STORE";
pub const USER_ENV: &str = "CSVGRID_USER";
pub const AUTOSAVE_ENV: &str = "CSVGRID_AUTOSAVE_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What happens to the snapshot after a successful flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefetchPolicy {
    /// Re-seed from the file the store returned. Edits made while the flush
    /// was in flight are dropped.
    #[default]
    Reseed,
    /// Keep the local snapshot and only move the persisted baseline.
    KeepLocal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub autosave_delay_ms: u64,
    pub cell_commit_delay_ms: u64,
    pub refetch_policy: RefetchPolicy,
    pub store_path: PathBuf,
    pub user: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 2000,
            cell_commit_delay_ms: 300,
            refetch_policy: RefetchPolicy::Reseed,
            store_path: PathBuf::from("csvgrid-store.json"),
            user: "local".to_string(),
        }
    }
}

impl GridConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overlays environment values read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(store) = lookup(STORE_ENV) {
            self.store_path = PathBuf::from(store);
        }
        if let Some(user) = lookup(USER_ENV) {
            self.user = user;
        }
        if let Some(raw) = lookup(AUTOSAVE_ENV) {
            match raw.trim().parse() {
                Ok(ms) => self.autosave_delay_ms = ms,
                Err(_) => warn!(value = %raw, "ignoring invalid {AUTOSAVE_ENV}"),
            }
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn cell_commit_delay(&self) -> Duration {
        Duration::from_millis(self.cell_commit_delay_ms)
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.user.clone())
    }
}
