//! TOML-backed [`StateStore`].
//!
//! The unit record lives in `<state_dir>/state.toml`:
//!
//! ```toml
//! state = "configured"
//!
//! [status]
//! workload = "active"
//! message = "Unit is ready"
//! ```
//!
//! A missing file means the unit has never run, so [`TomlStateStore::load`]
//! returns the default record instead of failing.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nova_workarounds_core::UnitRecord;
use tracing::debug;

use super::atomic::replace_file;
use crate::application::{StateStore, StoreError};

/// Persists a [`UnitRecord`] as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlStateStore {
    path: PathBuf,
}

impl TomlStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for TomlStateStore {
    fn load(&self) -> Result<UnitRecord, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "No state file at {}, starting from defaults",
                    self.path.display()
                );
                return Ok(UnitRecord::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        toml::from_str(&text).map_err(|e| StoreError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn save(&self, record: &UnitRecord) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let text = toml::to_string_pretty(record).map_err(|e| StoreError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        replace_file(&self.path, text.as_bytes())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
