//! File-system backed [`ConfigStore`] for `nova.conf`.

use std::fs;
use std::path::{Path, PathBuf};

use nova_workarounds_core::ConfigDocument;
use tracing::debug;

use super::atomic::replace_file;
use crate::application::{ConfigStore, StoreError};

/// Reads and atomically rewrites one INI file on disk.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    path: PathBuf,
}

impl FsConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FsConfigStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read(&self) -> Result<ConfigDocument, StoreError> {
        let bytes = fs::read(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| StoreError::InvalidUtf8 {
            path: self.path.clone(),
        })?;
        let doc = ConfigDocument::parse(&text);
        debug!("Read {} lines from {}", doc.len(), self.path.display());
        Ok(doc)
    }

    fn write(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        replace_file(&self.path, doc.render().as_bytes())?;
        debug!("Wrote {} lines to {}", doc.len(), self.path.display());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
