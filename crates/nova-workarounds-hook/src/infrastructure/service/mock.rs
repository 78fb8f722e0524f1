//! In-memory [`ServiceController`] that records every restart request.
//!
//! Used by the integration tests and by `--systemctl none`, where the file
//! is patched but no service is touched.

use std::sync::Mutex;

use crate::application::{ServiceController, ServiceError};

/// Records the services it was asked to restart.
#[derive(Debug, Default)]
pub struct RecordingServiceController {
    restarts: Mutex<Vec<String>>,
    /// When `true`, every restart fails after being recorded.
    pub should_fail: bool,
}

impl RecordingServiceController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            restarts: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    /// Services restarted so far, in call order.
    pub fn restarts(&self) -> Vec<String> {
        self.restarts
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ServiceController for RecordingServiceController {
    fn restart(&self, service: &str) -> Result<(), ServiceError> {
        if let Ok(mut restarts) = self.restarts.lock() {
            restarts.push(service.to_string());
        }
        if self.should_fail {
            return Err(ServiceError::RestartFailed {
                service: service.to_string(),
                reason: "mock restart failure".to_string(),
            });
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
