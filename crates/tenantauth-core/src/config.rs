//! Settings for directory operations.
//!
//! Provider configurations are per tenant and come from the configuration store; the settings
//! here are process-wide and bound how long a single directory interaction may take.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Default connection timeout (seconds) when dialing a directory server.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Default timeout (seconds) for a single bind, search or unbind.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

/// Process-wide settings for directory sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DirectorySettings {
    /// Dial timeout in seconds, covering TCP connect and TLS/STARTTLS negotiation
    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-operation timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

impl DirectorySettings {
    /// Create settings with the default timeouts.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }

    /// Set the dial timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    /// Set the per-operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }

    /// Get the dial timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get the per-operation timeout as a Duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if a timeout is out of range.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid directory settings: {e}")))
    }
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self::new()
    }
}
