//! HookRunner: routes a hook event to the handlers whose gates hold.
//!
//! Two handlers exist, each gated on one flag of the persisted
//! [`UnitState`](nova_workarounds_core::UnitState):
//!
//! | Handler     | Runs when         | On success                 |
//! |-------------|-------------------|----------------------------|
//! | `Install`   | not installed     | installed, `active`        |
//! | `Configure` | not configured    | configured, `active`       |
//!
//! Every event runs the pending handlers, install first.  `config-changed`
//! additionally clears the configured flag beforehand, which forces the
//! configure handler to run with the new option values.  Because a failed
//! configure leaves the unit unconfigured, the next event of any kind
//! retries it.
//!
//! The record is saved after every transition so the reported status is
//! never older than the step in progress.

use std::fmt;
use std::sync::Arc;

use nova_workarounds_core::{UnitRecord, UnitStatus, WorkloadStatus};
use thiserror::Error;
use tracing::{debug, error, info};

use super::configure::{ConfigureError, ConfigureUseCase, StoreError};

/// Status message shown once the unit is fully set up.
pub const READY_MESSAGE: &str = "Unit is ready";

/// Error type for hook dispatch.
///
/// Configure failures are not errors at this level; they become a
/// `blocked` status instead.  Only state persistence can fail the hook.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unit state unavailable: {0}")]
    State(#[from] StoreError),
}

/// Persists the [`UnitRecord`] between invocations.
pub trait StateStore {
    /// Loads the record, or the default record if none was saved yet.
    fn load(&self) -> Result<UnitRecord, StoreError>;

    fn save(&self, record: &UnitRecord) -> Result<(), StoreError>;
}

/// Events the deployment tool can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Install,
    ConfigChanged,
    UpdateStatus,
}

impl HookEvent {
    /// The hook name as the deployment tool spells it.
    pub fn name(self) -> &'static str {
        match self {
            HookEvent::Install => "install",
            HookEvent::ConfigChanged => "config-changed",
            HookEvent::UpdateStatus => "update-status",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handlers that can run during one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Install,
    Configure,
}

/// What one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub event: HookEvent,
    /// Handlers that ran, in order.
    pub handlers: Vec<Handler>,
    /// Record as saved at the end of the event.
    pub record: UnitRecord,
}

impl HookOutcome {
    /// `true` when the event ended with the unit configured.
    pub fn is_configured(&self) -> bool {
        self.record.state.is_configured()
    }
}

/// Runs hook events against the persisted unit state.
pub struct HookRunner {
    state: Arc<dyn StateStore>,
    configure: ConfigureUseCase,
}

impl HookRunner {
    pub fn new(state: Arc<dyn StateStore>, configure: ConfigureUseCase) -> Self {
        Self { state, configure }
    }

    /// Handles one hook event.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::State`] if the unit state cannot be loaded or
    /// saved.  Configure failures are reported through the record's status.
    pub fn run(&self, event: HookEvent) -> Result<HookOutcome, DispatchError> {
        let mut record = self.state.load()?;
        debug!("{event} hook running (state: {})", record.state);

        if event == HookEvent::ConfigChanged {
            info!("Config changed hook running");
            record.state.clear_configured();
            self.set_status(&mut record, WorkloadStatus::Maintenance, "Updating configuration")?;
        }

        let mut handlers = Vec::new();
        if !record.state.is_installed() {
            self.install(&mut record)?;
            handlers.push(Handler::Install);
        }
        if !record.state.is_configured() {
            self.configure(&mut record)?;
            handlers.push(Handler::Configure);
        }

        Ok(HookOutcome {
            event,
            handlers,
            record,
        })
    }

    fn install(&self, record: &mut UnitRecord) -> Result<(), DispatchError> {
        self.set_status(record, WorkloadStatus::Maintenance, "Installing nova-workarounds")?;
        record.state.set_installed();
        self.set_status(record, WorkloadStatus::Active, READY_MESSAGE)
    }

    fn configure(&self, record: &mut UnitRecord) -> Result<(), DispatchError> {
        match self.configure.execute() {
            Ok(_) => {
                record.state.set_configured();
                self.set_status(record, WorkloadStatus::Active, READY_MESSAGE)
            }
            Err(ConfigureError::MissingFile { path }) => {
                error!("Nova config {} does not exist", path.display());
                record.state.mark_failed();
                let message = format!("Nova config not found: {}", path.display());
                self.set_status(record, WorkloadStatus::Blocked, message)
            }
            Err(e) => {
                error!("Error configuring Nova workarounds: {e}");
                record.state.mark_failed();
                self.set_status(record, WorkloadStatus::Blocked, format!("Failed to configure: {e}"))
            }
        }
    }

    fn set_status(
        &self,
        record: &mut UnitRecord,
        workload: WorkloadStatus,
        message: impl Into<String>,
    ) -> Result<(), DispatchError> {
        record.status = UnitStatus::new(workload, message);
        info!("status {} (state: {})", record.status, record.state);
        self.state.save(record)?;
        Ok(())
    }
}

/// Renders a record for the `status` command.
pub fn describe(record: &UnitRecord) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    format!(
        "state: {}\ninstalled: {}\nconfigured: {}\nstatus: {}",
        record.state,
        yes_no(record.state.is_installed()),
        yes_no(record.state.is_configured()),
        record.status
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
