//! Operator option values read from a TOML file, with command-line overrides.
//!
//! The file holds the two managed options under their own names:
//!
//! ```toml
//! skip_cpu_compare_at_startup = true
//! skip_cpu_compare_on_dest = "no"
//! ```
//!
//! Values stay loosely typed here ([`OptionValue`]); normalising them to
//! booleans is the use case's job, so a bad value surfaces as an
//! invalid-option failure rather than a parse error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nova_workarounds_core::{OptionValue, WorkaroundOptions};
use tracing::debug;

use crate::application::{OptionsSource, StoreError};

/// Values given on the command line.  `Some` wins over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub skip_cpu_compare_at_startup: Option<OptionValue>,
    pub skip_cpu_compare_on_dest: Option<OptionValue>,
}

impl OptionOverrides {
    fn apply(&self, options: &mut WorkaroundOptions) {
        if let Some(v) = &self.skip_cpu_compare_at_startup {
            options.skip_cpu_compare_at_startup = v.clone();
        }
        if let Some(v) = &self.skip_cpu_compare_on_dest {
            options.skip_cpu_compare_on_dest = v.clone();
        }
    }
}

/// [`OptionsSource`] backed by an optional TOML file.
#[derive(Debug, Clone)]
pub struct TomlOptionsSource {
    path: PathBuf,
    overrides: OptionOverrides,
}

impl TomlOptionsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            overrides: OptionOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: OptionOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<WorkaroundOptions, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "No options file at {}, using defaults",
                    self.path.display()
                );
                return Ok(WorkaroundOptions::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        toml::from_str(&text).map_err(|e| StoreError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl OptionsSource for TomlOptionsSource {
    fn load(&self) -> Result<WorkaroundOptions, StoreError> {
        let mut options = self.read_file()?;
        self.overrides.apply(&mut options);
        Ok(options)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
