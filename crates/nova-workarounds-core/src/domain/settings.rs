//! The two managed `[workarounds]` options and boolean normalisation.
//!
//! Option values reach the hook loosely typed: an operator may write
//! `true`, `"True"`, `1` or `"yes"`.  [`OptionValue`] accepts all of these
//! and [`OptionValue::as_bool`] folds them into a plain `bool`, which the
//! merge then renders as lowercase `true` / `false`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::document::ConfigDocument;
use super::section::{merge_section, ManagedSetting};

/// Name of the managed section in `nova.conf`.
pub const WORKAROUNDS_SECTION: &str = "workarounds";

/// Skip the host CPU comparison when `nova-compute` starts.
pub const KEY_SKIP_AT_STARTUP: &str = "skip_cpu_compare_at_startup";

/// Skip the CPU comparison on the destination host during live migration.
pub const KEY_SKIP_ON_DEST: &str = "skip_cpu_compare_on_dest";

/// Error type for option normalisation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("option {option} is not a boolean: {value:?}")]
    InvalidBoolean { option: String, value: String },
}

/// A loosely typed option value as supplied by the configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl Default for OptionValue {
    fn default() -> Self {
        OptionValue::Bool(false)
    }
}

impl fmt::Display for OptionValue {
    /// The value as the operator wrote it, without normalisation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Integer(n) => write!(f, "{n}"),
            OptionValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl OptionValue {
    /// Normalises the value to a boolean.
    ///
    /// Integers are truthy when non-zero.  Text is matched case-insensitively
    /// after trimming: `true`, `yes`, `on`, `1` are true and `false`, `no`,
    /// `off`, `0` are false.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::InvalidBoolean`] naming `option` for any other
    /// text.
    pub fn as_bool(&self, option: &str) -> Result<bool, OptionError> {
        match self {
            OptionValue::Bool(b) => Ok(*b),
            OptionValue::Integer(n) => Ok(*n != 0),
            OptionValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(OptionError::InvalidBoolean {
                    option: option.to_owned(),
                    value: text.clone(),
                }),
            },
        }
    }

    /// Parses a command-line string without interpreting it yet.
    pub fn from_arg(value: &str) -> Self {
        OptionValue::Text(value.to_owned())
    }
}

/// Raw option values for the managed keys, as the operator supplied them.
///
/// Missing options default to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkaroundOptions {
    #[serde(default)]
    pub skip_cpu_compare_at_startup: OptionValue,
    #[serde(default)]
    pub skip_cpu_compare_on_dest: OptionValue,
}

impl WorkaroundOptions {
    /// Normalises both values.  See [`WorkaroundSettings::from_options`].
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::InvalidBoolean`] for an unrecognised value.
    pub fn normalise(&self) -> Result<WorkaroundSettings, OptionError> {
        WorkaroundSettings::from_options(
            &self.skip_cpu_compare_at_startup,
            &self.skip_cpu_compare_on_dest,
        )
    }
}

/// Desired values for the managed workaround keys.
///
/// This is the explicit parameter struct handed to the merge; nothing here
/// reads a global configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkaroundSettings {
    pub skip_cpu_compare_at_startup: bool,
    pub skip_cpu_compare_on_dest: bool,
}

impl WorkaroundSettings {
    /// Normalises raw option values into settings.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::InvalidBoolean`] for the first value that is
    /// not a recognised boolean.
    pub fn from_options(
        at_startup: &OptionValue,
        on_dest: &OptionValue,
    ) -> Result<Self, OptionError> {
        Ok(Self {
            skip_cpu_compare_at_startup: at_startup.as_bool(KEY_SKIP_AT_STARTUP)?,
            skip_cpu_compare_on_dest: on_dest.as_bool(KEY_SKIP_ON_DEST)?,
        })
    }

    /// The managed settings in their fixed output order.
    pub fn managed_settings(&self) -> Vec<ManagedSetting> {
        vec![
            ManagedSetting::flag(KEY_SKIP_AT_STARTUP, self.skip_cpu_compare_at_startup),
            ManagedSetting::flag(KEY_SKIP_ON_DEST, self.skip_cpu_compare_on_dest),
        ]
    }
}

/// Merges `settings` into the `[workarounds]` section of `doc`.
pub fn apply_workarounds(doc: &ConfigDocument, settings: &WorkaroundSettings) -> ConfigDocument {
    merge_section(doc, WORKAROUNDS_SECTION, &settings.managed_settings())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
