//! nova-workarounds-hook library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the hook do? (for beginners)
//!
//! The deployment tool invokes the hook when the unit is installed, when the
//! operator changes an option, and periodically for status updates.  Each
//! invocation:
//!
//! 1. Loads the persisted unit state (installed / configured).
//! 2. Runs the install step once, the first time.
//! 3. Runs the configure step whenever the unit is not configured: read
//!    `nova.conf`, merge the `[workarounds]` keys, replace the file
//!    atomically, and restart `nova-compute`.
//! 4. Reports the outcome as a workload status (`active`, `blocked`, ...)
//!    and saves the new state.
//!
//! A failed configure step never aborts the hook; it leaves the unit
//! `blocked` and not configured, so the next invocation tries again.
//!
//! # Layers
//!
//! - `application` – use cases plus the traits they need (`ConfigStore`,
//!   `OptionsSource`, `ServiceController`, `StateStore`).
//! - `infrastructure` – file, TOML, and `systemctl` implementations of those
//!   traits.

/// Application layer: configure and dispatch use cases.
pub mod application;

/// Infrastructure layer: file storage and service control adapters.
pub mod infrastructure;
