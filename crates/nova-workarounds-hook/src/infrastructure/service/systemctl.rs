//! [`ServiceController`] that runs `systemctl restart <service>`.

use std::process::Command;

use tracing::{debug, info};

use crate::application::{ServiceController, ServiceError};

/// Program used when none is configured.
pub const DEFAULT_SYSTEMCTL: &str = "systemctl";

/// Restarts services through a `systemctl`-compatible program.
///
/// The program is configurable so hosts with a wrapper (or tests with a
/// stand-in such as `true`) can substitute it.
#[derive(Debug, Clone)]
pub struct SystemctlController {
    program: String,
}

impl SystemctlController {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SystemctlController {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEMCTL)
    }
}

impl ServiceController for SystemctlController {
    fn restart(&self, service: &str) -> Result<(), ServiceError> {
        debug!("Running {} restart {service}", self.program);
        let output = Command::new(&self.program)
            .args(["restart", service])
            .output()
            .map_err(|source| ServiceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(ServiceError::RestartFailed {
                service: service.to_string(),
                reason,
            });
        }

        info!("Restarted {service}");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
