//! Application layer use cases for the hook.
//!
//! - **`configure`** – Reads `nova.conf`, merges the managed keys, writes the
//!   file back, and restarts the service.  All I/O goes through traits that
//!   the infrastructure layer implements.
//!
//! - **`dispatch`** – Maps a hook event to the handlers whose gates hold
//!   (install when not installed, configure when not configured), turns
//!   their results into unit state and status, and persists both.
//!
//! **Dependency rule**: nothing here imports `crate::infrastructure`.

pub mod configure;
pub mod dispatch;

pub use configure::{
    ConfigStore, ConfigureError, ConfigurePlan, ConfigureReport, ConfigureUseCase, OptionsSource,
    ServiceController, ServiceError, StoreError,
};
pub use dispatch::{
    describe, DispatchError, Handler, HookEvent, HookOutcome, HookRunner, StateStore, READY_MESSAGE,
};
