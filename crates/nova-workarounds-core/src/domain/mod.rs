//! Domain entities for nova-workarounds.
//!
//! Nothing in here touches the file system, spawns processes, or reads the
//! environment.  Callers hand in a document and desired values and get a new
//! document back, which keeps every rule in this module testable with plain
//! strings.

/// Runtime paths and names for one hook invocation.
pub mod config;

/// Line-preserving text document.
pub mod document;

/// Section location and the managed-key merge.
pub mod section;

/// The two managed workaround options.
pub mod settings;

/// Installed/configured state and reported workload status.
pub mod state;
