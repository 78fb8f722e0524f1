//! Service control adapters.
//!
//! - `systemctl` – the production [`ServiceController`], shelling out to
//!   `systemctl restart <service>`.
//! - `mock` – an in-memory controller that records restarts, for tests and
//!   dry runs.
//!
//! [`ServiceController`]: crate::application::ServiceController

pub mod mock;
pub mod systemctl;

pub use mock::RecordingServiceController;
pub use systemctl::{SystemctlController, DEFAULT_SYSTEMCTL};
