//! ConfigureUseCase: merges the managed keys into `nova.conf` and restarts
//! the service.
//!
//! The steps run in a fixed order and stop at the first failure:
//!
//! ```text
//! exists? ─no─> MissingFile
//!   │
//! read nova.conf ──────────> Read
//! load options ────────────> Options
//! normalise to booleans ───> InvalidOption
//! merge [workarounds]
//! replace nova.conf ───────> Write
//! restart service ─────────> Restart
//! ```
//!
//! The file is replaced in one step by the [`ConfigStore`], so a failure at
//! any point leaves either the original file or the fully merged one on
//! disk.  A restart failure happens after a successful write; the merged
//! file stays in place and the next attempt writes identical content.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nova_workarounds_core::{
    merge_section, ConfigDocument, OptionError, WorkaroundOptions, WorkaroundSettings,
    KEY_SKIP_AT_STARTUP, KEY_SKIP_ON_DEST,
};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for storage adapters (config file, options file, state file).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file contents are not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },

    /// The file could not be parsed or serialized.
    #[error("invalid format in {path}: {message}")]
    Format { path: PathBuf, message: String },
}

/// Error type for service control.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service manager could not be started at all.
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The service manager ran but reported failure.
    #[error("failed to restart {service}: {reason}")]
    RestartFailed { service: String, reason: String },
}

/// Error type for the configure step.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("config file {path} does not exist")]
    MissingFile { path: PathBuf },

    #[error("read failed: {0}")]
    Read(#[source] StoreError),

    #[error("could not load options: {0}")]
    Options(#[source] StoreError),

    #[error(transparent)]
    InvalidOption(#[from] OptionError),

    #[error("write failed: {0}")]
    Write(#[source] StoreError),

    #[error(transparent)]
    Restart(#[from] ServiceError),
}

/// Access to the single configuration file being patched.
pub trait ConfigStore {
    /// Path of the file, for messages.
    fn path(&self) -> &Path;

    fn exists(&self) -> bool;

    /// Reads the whole file.
    fn read(&self) -> Result<ConfigDocument, StoreError>;

    /// Replaces the whole file.  Implementations must not leave a partially
    /// written file behind on failure.
    fn write(&self, doc: &ConfigDocument) -> Result<(), StoreError>;
}

/// Source of the operator-supplied option values.
pub trait OptionsSource {
    fn load(&self) -> Result<WorkaroundOptions, StoreError>;
}

/// Restarts a named service.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceController {
    fn restart(&self, service: &str) -> Result<(), ServiceError>;
}

/// The merge computed from the current file and options, before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurePlan {
    pub path: PathBuf,
    pub settings: WorkaroundSettings,
    pub current: ConfigDocument,
    pub merged: ConfigDocument,
}

impl ConfigurePlan {
    /// `true` when writing would change the file.
    pub fn changes_file(&self) -> bool {
        self.current != self.merged
    }
}

/// Result of a successful configure step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    pub path: PathBuf,
    pub settings: WorkaroundSettings,
    /// Whether the written content differs from what was there before.
    pub changed: bool,
}

/// The configure use case.
pub struct ConfigureUseCase {
    store: Arc<dyn ConfigStore>,
    options: Arc<dyn OptionsSource>,
    services: Arc<dyn ServiceController>,
    section: String,
    service: String,
}

impl ConfigureUseCase {
    /// Creates a use case that merges into `section` and restarts `service`.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        options: Arc<dyn OptionsSource>,
        services: Arc<dyn ServiceController>,
        section: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            store,
            options,
            services,
            section: section.into(),
            service: service.into(),
        }
    }

    /// Path of the file this use case patches.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Reads the file and options and computes the merged document without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigureError::MissingFile`], [`ConfigureError::Read`],
    /// [`ConfigureError::Options`], or [`ConfigureError::InvalidOption`].
    pub fn plan(&self) -> Result<ConfigurePlan, ConfigureError> {
        let path = self.store.path().to_path_buf();
        if !self.store.exists() {
            return Err(ConfigureError::MissingFile { path });
        }

        let current = self.store.read().map_err(ConfigureError::Read)?;
        let options = self.options.load().map_err(ConfigureError::Options)?;
        info!(
            "Config values - startup: {}, dest: {}",
            options.skip_cpu_compare_at_startup, options.skip_cpu_compare_on_dest
        );

        let settings = options.normalise()?;
        let merged = merge_section(&current, &self.section, &settings.managed_settings());

        Ok(ConfigurePlan {
            path,
            settings,
            current,
            merged,
        })
    }

    /// Runs the whole configure step: plan, write, restart.
    ///
    /// # Errors
    ///
    /// Any [`ConfigureError`]; see the module docs for which step produces
    /// which variant.
    pub fn execute(&self) -> Result<ConfigureReport, ConfigureError> {
        let plan = self.plan()?;
        let changed = plan.changes_file();
        if !changed {
            debug!("{} already contains the requested settings", plan.path.display());
        }

        self.store.write(&plan.merged).map_err(ConfigureError::Write)?;
        self.services.restart(&self.service)?;

        info!(
            "Updated {} with {KEY_SKIP_AT_STARTUP} = {}",
            plan.path.display(),
            plan.settings.skip_cpu_compare_at_startup
        );
        info!(
            "Updated {} with {KEY_SKIP_ON_DEST} = {}",
            plan.path.display(),
            plan.settings.skip_cpu_compare_on_dest
        );

        Ok(ConfigureReport {
            path: plan.path,
            settings: plan.settings,
            changed,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nova_workarounds_core::OptionValue;
    use std::sync::Mutex;

    // ── Fakes ─────────────────────────────────────────────────────────────────

    /// In-memory config file; `None` means the file does not exist.
    struct MemoryStore {
        content: Mutex<Option<String>>,
        fail_read: bool,
        fail_write: bool,
    }

    impl MemoryStore {
        fn with(content: Option<&str>) -> Self {
            Self {
                content: Mutex::new(content.map(str::to_owned)),
                fail_read: false,
                fail_write: false,
            }
        }

        fn content(&self) -> Option<String> {
            self.content.lock().unwrap().clone()
        }
    }

    fn io_error(path: &Path) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    impl ConfigStore for MemoryStore {
        fn path(&self) -> &Path {
            Path::new("/etc/nova/nova.conf")
        }

        fn exists(&self) -> bool {
            self.content.lock().unwrap().is_some()
        }

        fn read(&self) -> Result<ConfigDocument, StoreError> {
            if self.fail_read {
                return Err(io_error(self.path()));
            }
            let text = self.content().unwrap_or_default();
            Ok(ConfigDocument::parse(&text))
        }

        fn write(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
            if self.fail_write {
                return Err(io_error(self.path()));
            }
            *self.content.lock().unwrap() = Some(doc.render());
            Ok(())
        }
    }

    struct FixedOptions(Result<WorkaroundOptions, ()>);

    impl OptionsSource for FixedOptions {
        fn load(&self) -> Result<WorkaroundOptions, StoreError> {
            self.0.clone().map_err(|()| StoreError::Format {
                path: PathBuf::from("options.toml"),
                message: "expected a table".to_string(),
            })
        }
    }

    fn options(at_startup: OptionValue, on_dest: OptionValue) -> Arc<FixedOptions> {
        Arc::new(FixedOptions(Ok(WorkaroundOptions {
            skip_cpu_compare_at_startup: at_startup,
            skip_cpu_compare_on_dest: on_dest,
        })))
    }

    fn restarts_once() -> MockServiceController {
        let mut services = MockServiceController::new();
        services
            .expect_restart()
            .withf(|service| service == "nova-compute")
            .times(1)
            .returning(|_| Ok(()));
        services
    }

    fn never_restarts() -> MockServiceController {
        let mut services = MockServiceController::new();
        services.expect_restart().never();
        services
    }

    fn use_case(
        store: Arc<MemoryStore>,
        options: Arc<FixedOptions>,
        services: MockServiceController,
    ) -> ConfigureUseCase {
        ConfigureUseCase::new(
            store,
            options,
            Arc::new(services),
            "workarounds",
            "nova-compute",
        )
    }

    // ── Success paths ─────────────────────────────────────────────────────────

    #[test]
    fn test_execute_merges_writes_and_restarts() {
        // Arrange
        let store = Arc::new(MemoryStore::with(Some("[workarounds]\nfoo = bar\n\n[DEFAULT]\n")));
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Bool(true), OptionValue::Bool(false)),
            restarts_once(),
        );

        // Act
        let report = uc.execute().expect("configure succeeds");

        // Assert
        assert!(report.changed);
        assert_eq!(report.path, PathBuf::from("/etc/nova/nova.conf"));
        assert_eq!(
            store.content().unwrap(),
            "[workarounds]\nfoo = bar\nskip_cpu_compare_at_startup = true\n\
             skip_cpu_compare_on_dest = false\n\n[DEFAULT]\n"
        );
    }

    #[test]
    fn test_execute_normalises_text_and_integer_options() {
        let store = Arc::new(MemoryStore::with(Some("[DEFAULT]\n")));
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Text("True".into()), OptionValue::Integer(0)),
            restarts_once(),
        );

        let report = uc.execute().unwrap();

        assert!(report.settings.skip_cpu_compare_at_startup);
        assert!(!report.settings.skip_cpu_compare_on_dest);
        assert!(store
            .content()
            .unwrap()
            .ends_with("[workarounds]\nskip_cpu_compare_at_startup = true\nskip_cpu_compare_on_dest = false\n\n"));
    }

    #[test]
    fn test_execute_restarts_even_when_file_already_merged() {
        // Arrange: the file already holds exactly the requested settings
        let merged = "[workarounds]\nskip_cpu_compare_at_startup = false\n\
                      skip_cpu_compare_on_dest = false\n";
        let store = Arc::new(MemoryStore::with(Some(merged)));
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Bool(false), OptionValue::Bool(false)),
            restarts_once(),
        );

        // Act
        let report = uc.execute().unwrap();

        // Assert
        assert!(!report.changed);
        assert_eq!(store.content().unwrap(), merged);
    }

    #[test]
    fn test_plan_does_not_write_or_restart() {
        let store = Arc::new(MemoryStore::with(Some("[DEFAULT]\n")));
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Bool(true), OptionValue::Bool(true)),
            never_restarts(),
        );

        let plan = uc.plan().unwrap();

        assert!(plan.changes_file());
        assert_eq!(plan.current.render(), "[DEFAULT]\n");
        assert!(plan.merged.render().contains("skip_cpu_compare_on_dest = true\n"));
        assert_eq!(store.content().unwrap(), "[DEFAULT]\n");
    }

    #[test]
    fn test_plan_uses_configured_section_name() {
        let store = Arc::new(MemoryStore::with(Some("")));
        let uc = ConfigureUseCase::new(
            store,
            options(OptionValue::Bool(true), OptionValue::Bool(true)),
            Arc::new(never_restarts()),
            "libvirt_workarounds",
            "nova-compute",
        );

        let plan = uc.plan().unwrap();

        assert!(plan.merged.render().starts_with("[libvirt_workarounds]\n"));
    }

    // ── Failure paths ─────────────────────────────────────────────────────────

    #[test]
    fn test_missing_file_is_reported_without_side_effects() {
        // Arrange
        let store = Arc::new(MemoryStore::with(None));
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Bool(true), OptionValue::Bool(true)),
            never_restarts(),
        );

        // Act
        let err = uc.execute().unwrap_err();

        // Assert
        assert!(
            matches!(err, ConfigureError::MissingFile { ref path } if path == Path::new("/etc/nova/nova.conf"))
        );
        assert!(store.content().is_none(), "missing file must not be created");
    }

    #[test]
    fn test_read_failure_maps_to_read_error() {
        let store = Arc::new(MemoryStore {
            fail_read: true,
            ..MemoryStore::with(Some("[DEFAULT]\n"))
        });
        let uc = use_case(
            store,
            options(OptionValue::Bool(true), OptionValue::Bool(true)),
            never_restarts(),
        );

        let err = uc.execute().unwrap_err();

        assert!(matches!(err, ConfigureError::Read(_)));
        assert!(err.to_string().starts_with("read failed: I/O error accessing"));
    }

    #[test]
    fn test_options_failure_leaves_file_untouched() {
        let store = Arc::new(MemoryStore::with(Some("[DEFAULT]\n")));
        let uc = use_case(
            Arc::clone(&store),
            Arc::new(FixedOptions(Err(()))),
            never_restarts(),
        );

        let err = uc.execute().unwrap_err();

        assert!(matches!(err, ConfigureError::Options(_)));
        assert_eq!(store.content().unwrap(), "[DEFAULT]\n");
    }

    #[test]
    fn test_invalid_option_value_leaves_file_untouched() {
        let store = Arc::new(MemoryStore::with(Some("[DEFAULT]\n")));
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Text("sometimes".into()), OptionValue::Bool(true)),
            never_restarts(),
        );

        let err = uc.execute().unwrap_err();

        assert!(matches!(err, ConfigureError::InvalidOption(_)));
        assert!(err.to_string().contains("skip_cpu_compare_at_startup"));
        assert_eq!(store.content().unwrap(), "[DEFAULT]\n");
    }

    #[test]
    fn test_write_failure_skips_restart() {
        let store = Arc::new(MemoryStore {
            fail_write: true,
            ..MemoryStore::with(Some("[DEFAULT]\n"))
        });
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Bool(true), OptionValue::Bool(true)),
            never_restarts(),
        );

        let err = uc.execute().unwrap_err();

        assert!(matches!(err, ConfigureError::Write(_)));
        assert_eq!(store.content().unwrap(), "[DEFAULT]\n");
    }

    #[test]
    fn test_restart_failure_keeps_merged_file() {
        // Arrange
        let store = Arc::new(MemoryStore::with(Some("[DEFAULT]\n")));
        let mut services = MockServiceController::new();
        services.expect_restart().times(1).returning(|service| {
            Err(ServiceError::RestartFailed {
                service: service.to_string(),
                reason: "unit not found".to_string(),
            })
        });
        let uc = use_case(
            Arc::clone(&store),
            options(OptionValue::Bool(true), OptionValue::Bool(true)),
            services,
        );

        // Act
        let err = uc.execute().unwrap_err();

        // Assert
        assert_eq!(
            err.to_string(),
            "failed to restart nova-compute: unit not found"
        );
        assert!(store.content().unwrap().contains("[workarounds]\n"));
    }
}
