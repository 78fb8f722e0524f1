//! Hook runtime configuration.
//!
//! [`HookConfig`] names every external resource one invocation touches: the
//! file to patch, the section inside it, the service to restart, and where
//! the unit state and operator options live.  It is a plain struct with no
//! environment reads; the binary fills it from CLI arguments and
//! environment variables.

use std::path::PathBuf;

use super::settings::WORKAROUNDS_SECTION;

/// Default location of the file being patched.
pub const DEFAULT_NOVA_CONF: &str = "/etc/nova/nova.conf";

/// Default service restarted after a successful write.
pub const DEFAULT_SERVICE: &str = "nova-compute";

/// Default directory for `state.toml` and `options.toml`.
pub const DEFAULT_STATE_DIR: &str = "/var/lib/nova-workarounds";

/// All runtime configuration for one hook invocation.
///
/// # Example
///
/// ```rust
/// use nova_workarounds_core::HookConfig;
///
/// let cfg = HookConfig::default();
/// assert_eq!(cfg.section, "workarounds");
/// assert!(cfg.state_file().ends_with("state.toml"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// INI file that receives the managed section.
    pub nova_conf: PathBuf,
    /// Section the managed keys are merged into.
    pub section: String,
    /// Service restarted after the file has been written.
    pub service: String,
    /// Directory holding the persisted unit state.
    pub state_dir: PathBuf,
    /// TOML file with the operator-supplied option values.
    pub options_file: PathBuf,
}

impl HookConfig {
    /// Path of the persisted unit state.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.toml")
    }
}

impl Default for HookConfig {
    /// | Field        | Default                                   |
    /// |--------------|-------------------------------------------|
    /// | nova_conf    | `/etc/nova/nova.conf`                     |
    /// | section      | `workarounds`                             |
    /// | service      | `nova-compute`                            |
    /// | state_dir    | `/var/lib/nova-workarounds`               |
    /// | options_file | `/var/lib/nova-workarounds/options.toml`  |
    fn default() -> Self {
        let state_dir = PathBuf::from(DEFAULT_STATE_DIR);
        Self {
            nova_conf: PathBuf::from(DEFAULT_NOVA_CONF),
            section: WORKAROUNDS_SECTION.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            options_file: state_dir.join("options.toml"),
            state_dir,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_nova_conf() {
        let cfg = HookConfig::default();
        assert_eq!(cfg.nova_conf, PathBuf::from("/etc/nova/nova.conf"));
    }

    #[test]
    fn test_default_service_is_nova_compute() {
        let cfg = HookConfig::default();
        assert_eq!(cfg.service, "nova-compute");
    }

    #[test]
    fn test_default_files_live_in_state_dir() {
        let cfg = HookConfig::default();
        assert_eq!(
            cfg.state_file(),
            PathBuf::from("/var/lib/nova-workarounds/state.toml")
        );
        assert_eq!(
            cfg.options_file,
            PathBuf::from("/var/lib/nova-workarounds/options.toml")
        );
    }

    #[test]
    fn test_state_file_follows_custom_state_dir() {
        let cfg = HookConfig {
            state_dir: PathBuf::from("/tmp/unit"),
            ..HookConfig::default()
        };
        assert_eq!(cfg.state_file(), PathBuf::from("/tmp/unit/state.toml"));
    }
}
