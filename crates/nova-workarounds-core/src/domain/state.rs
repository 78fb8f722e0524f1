//! Unit state: what the hook has already done, and what it last reported.
//!
//! The hook keeps two facts between invocations: whether the unit has been
//! *installed* and whether `nova.conf` is currently *configured* with the
//! requested workarounds.  [`UnitState`] encodes both as one enum so that
//! impossible combinations (configured but never installed) cannot be
//! represented:
//!
//! | State         | installed | configured |
//! |---------------|-----------|------------|
//! | `Uninstalled` | no        | no         |
//! | `Installed`   | yes       | no         |
//! | `Configured`  | yes       | yes        |
//! | `Failed`      | yes       | no         |
//!
//! `Failed` behaves like `Installed` for gating purposes; it only records
//! that the last configure attempt did not succeed.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    #[default]
    Uninstalled,
    Installed,
    Configured,
    Failed,
}

impl UnitState {
    pub fn is_installed(self) -> bool {
        !matches!(self, UnitState::Uninstalled)
    }

    pub fn is_configured(self) -> bool {
        matches!(self, UnitState::Configured)
    }

    /// Sets the installed flag.  Leaves an already installed state alone.
    pub fn set_installed(&mut self) {
        if *self == UnitState::Uninstalled {
            *self = UnitState::Installed;
        }
    }

    pub fn set_configured(&mut self) {
        *self = UnitState::Configured;
    }

    /// Clears the configured flag so the next hook re-runs configuration.
    pub fn clear_configured(&mut self) {
        if *self == UnitState::Configured {
            *self = UnitState::Installed;
        }
    }

    /// Records a failed configure attempt (configured is cleared).
    pub fn mark_failed(&mut self) {
        *self = UnitState::Failed;
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::Uninstalled => "uninstalled",
            UnitState::Installed => "installed",
            UnitState::Configured => "configured",
            UnitState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Workload status level reported to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    #[default]
    Maintenance,
    Active,
    Blocked,
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkloadStatus::Maintenance => "maintenance",
            WorkloadStatus::Active => "active",
            WorkloadStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// A status level plus its human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    #[serde(default)]
    pub workload: WorkloadStatus,
    #[serde(default)]
    pub message: String,
}

impl UnitStatus {
    pub fn new(workload: WorkloadStatus, message: impl Into<String>) -> Self {
        Self {
            workload,
            message: message.into(),
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.workload)
        } else {
            write!(f, "{}: {}", self.workload, self.message)
        }
    }
}

/// Everything persisted between hook invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    #[serde(default)]
    pub state: UnitState,
    #[serde(default)]
    pub status: UnitStatus,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
