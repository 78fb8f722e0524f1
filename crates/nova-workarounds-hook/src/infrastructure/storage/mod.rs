//! Storage infrastructure: every file the hook reads or writes.
//!
//! - `atomic` – replace a file via temporary file + rename.
//! - `nova_conf` – the INI file being patched ([`FsConfigStore`]).
//! - `state_file` – persisted unit state ([`TomlStateStore`]).
//! - `options` – operator option values ([`TomlOptionsSource`]).

pub mod atomic;
pub mod nova_conf;
pub mod options;
pub mod state_file;

pub use nova_conf::FsConfigStore;
pub use options::{OptionOverrides, TomlOptionsSource};
pub use state_file::TomlStateStore;
