//! nova-workarounds: entry point.
//!
//! The deployment tool runs this binary once per lifecycle event.  Each run
//! loads the persisted unit state, runs whichever handlers are still pending,
//! and saves the new state and status before exiting.
//!
//! # Usage
//!
//! ```text
//! nova-workarounds [OPTIONS] <COMMAND>
//!
//! Commands:
//!   install         Run the install hook
//!   config-changed  Run the config-changed hook
//!   update-status   Run the update-status hook
//!   preview         Print the merged nova.conf without writing it
//!   status          Print the persisted unit state and status
//!
//! Options:
//!   --nova-conf <PATH>                     File to patch [default: /etc/nova/nova.conf]
//!   --section <NAME>                       Section to manage [default: workarounds]
//!   --service <NAME>                       Service to restart [default: nova-compute]
//!   --state-dir <DIR>                      Unit state directory [default: /var/lib/nova-workarounds]
//!   --options <PATH>                       Options file [default: <state-dir>/options.toml]
//!   --systemctl <PROGRAM>                  Restart program, or `none` [default: systemctl]
//!   --skip-cpu-compare-at-startup <VALUE>  Override the options file
//!   --skip-cpu-compare-on-dest <VALUE>     Override the options file
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                                         | Default                     |
//! |--------------------------------------------------|-----------------------------|
//! | `NOVA_WORKAROUNDS_CONF`                          | `/etc/nova/nova.conf`       |
//! | `NOVA_WORKAROUNDS_SECTION`                       | `workarounds`               |
//! | `NOVA_WORKAROUNDS_SERVICE`                       | `nova-compute`              |
//! | `NOVA_WORKAROUNDS_STATE_DIR`                     | `/var/lib/nova-workarounds` |
//! | `NOVA_WORKAROUNDS_OPTIONS`                       | `<state-dir>/options.toml`  |
//! | `NOVA_WORKAROUNDS_SYSTEMCTL`                     | `systemctl`                 |
//! | `NOVA_WORKAROUNDS_SKIP_CPU_COMPARE_AT_STARTUP`   | (unset)                     |
//! | `NOVA_WORKAROUNDS_SKIP_CPU_COMPARE_ON_DEST`      | (unset)                     |
//!
//! # Exit status
//!
//! A hook that ran exits 0 even when configuring failed; the failure is in
//! the reported status.  Non-zero means the state store or the arguments
//! were unusable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nova_workarounds_core::domain::config::{DEFAULT_NOVA_CONF, DEFAULT_SERVICE, DEFAULT_STATE_DIR};
use nova_workarounds_core::{HookConfig, OptionValue, WORKAROUNDS_SECTION};
use nova_workarounds_hook::application::{
    describe, ConfigureUseCase, HookEvent, HookRunner, ServiceController, StateStore,
};
use nova_workarounds_hook::infrastructure::service::{
    RecordingServiceController, SystemctlController, DEFAULT_SYSTEMCTL,
};
use nova_workarounds_hook::infrastructure::storage::{
    FsConfigStore, OptionOverrides, TomlOptionsSource, TomlStateStore,
};

/// `--systemctl` value that disables service restarts.
const NO_SYSTEMCTL: &str = "none";

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Manages the `[workarounds]` section of nova.conf.
#[derive(Debug, Parser)]
#[command(
    name = "nova-workarounds",
    about = "Hook that keeps the nova.conf CPU-compare workarounds in sync",
    version
)]
struct Cli {
    /// INI file that receives the managed section.
    #[arg(long, global = true, default_value = DEFAULT_NOVA_CONF, env = "NOVA_WORKAROUNDS_CONF")]
    nova_conf: PathBuf,

    /// Section the managed keys are merged into.
    #[arg(long, global = true, default_value = WORKAROUNDS_SECTION, env = "NOVA_WORKAROUNDS_SECTION")]
    section: String,

    /// Service restarted after nova.conf has been written.
    #[arg(long, global = true, default_value = DEFAULT_SERVICE, env = "NOVA_WORKAROUNDS_SERVICE")]
    service: String,

    /// Directory holding `state.toml`.
    #[arg(long, global = true, default_value = DEFAULT_STATE_DIR, env = "NOVA_WORKAROUNDS_STATE_DIR")]
    state_dir: PathBuf,

    /// TOML file with the option values.  Defaults to `<state-dir>/options.toml`.
    #[arg(long, global = true, env = "NOVA_WORKAROUNDS_OPTIONS")]
    options: Option<PathBuf>,

    /// Program used as `<program> restart <service>`.  `none` skips restarts.
    #[arg(long, global = true, default_value = DEFAULT_SYSTEMCTL, env = "NOVA_WORKAROUNDS_SYSTEMCTL")]
    systemctl: String,

    /// Value for `skip_cpu_compare_at_startup`, overriding the options file.
    #[arg(long, global = true, env = "NOVA_WORKAROUNDS_SKIP_CPU_COMPARE_AT_STARTUP")]
    skip_cpu_compare_at_startup: Option<String>,

    /// Value for `skip_cpu_compare_on_dest`, overriding the options file.
    #[arg(long, global = true, env = "NOVA_WORKAROUNDS_SKIP_CPU_COMPARE_ON_DEST")]
    skip_cpu_compare_on_dest: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Run the install hook.
    Install,
    /// Run the config-changed hook.
    ConfigChanged,
    /// Run the update-status hook.
    UpdateStatus,
    /// Print the merged nova.conf to stdout without writing or restarting.
    Preview,
    /// Print the persisted unit state and status.
    Status,
}

impl Command {
    fn hook_event(self) -> Option<HookEvent> {
        match self {
            Command::Install => Some(HookEvent::Install),
            Command::ConfigChanged => Some(HookEvent::ConfigChanged),
            Command::UpdateStatus => Some(HookEvent::UpdateStatus),
            Command::Preview | Command::Status => None,
        }
    }
}

impl Cli {
    /// Builds the [`HookConfig`] for this invocation.
    fn to_hook_config(&self) -> HookConfig {
        let options_file = self
            .options
            .clone()
            .unwrap_or_else(|| self.state_dir.join("options.toml"));
        HookConfig {
            nova_conf: self.nova_conf.clone(),
            section: self.section.clone(),
            service: self.service.clone(),
            state_dir: self.state_dir.clone(),
            options_file,
        }
    }

    fn option_overrides(&self) -> OptionOverrides {
        OptionOverrides {
            skip_cpu_compare_at_startup: self
                .skip_cpu_compare_at_startup
                .as_deref()
                .map(OptionValue::from_arg),
            skip_cpu_compare_on_dest: self
                .skip_cpu_compare_on_dest
                .as_deref()
                .map(OptionValue::from_arg),
        }
    }

    fn service_controller(&self) -> Arc<dyn ServiceController> {
        if self.systemctl == NO_SYSTEMCTL {
            Arc::new(RecordingServiceController::new())
        } else {
            Arc::new(SystemctlController::new(self.systemctl.clone()))
        }
    }

    fn configure_use_case(&self, config: &HookConfig) -> ConfigureUseCase {
        let options = TomlOptionsSource::new(&config.options_file)
            .with_overrides(self.option_overrides());
        ConfigureUseCase::new(
            Arc::new(FsConfigStore::new(&config.nova_conf)),
            Arc::new(options),
            self.service_controller(),
            config.section.clone(),
            config.service.clone(),
        )
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `preview` can be redirected into a file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.to_hook_config();

    if let Some(event) = cli.command.hook_event() {
        let state = Arc::new(TomlStateStore::new(config.state_file()));
        let runner = HookRunner::new(state, cli.configure_use_case(&config));
        let outcome = runner
            .run(event)
            .with_context(|| format!("{event} hook could not complete"))?;
        info!(
            "{event} hook finished; handlers: {:?}, status: {}",
            outcome.handlers, outcome.record.status
        );
        return Ok(());
    }

    match cli.command {
        Command::Preview => {
            let plan = cli
                .configure_use_case(&config)
                .plan()
                .with_context(|| format!("cannot preview {}", config.nova_conf.display()))?;
            if !plan.changes_file() {
                info!("{} is already up to date", plan.path.display());
            }
            print!("{}", plan.merged.render());
        }
        Command::Status => {
            let state_file = config.state_file();
            let record = TomlStateStore::new(&state_file)
                .load()
                .with_context(|| format!("cannot read unit state {}", state_file.display()))?;
            println!("{}", describe(&record));
        }
        Command::Install | Command::ConfigChanged | Command::UpdateStatus => {}
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
