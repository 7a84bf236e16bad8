//! Stage-level directory failures.
//!
//! These carry operator detail (URLs, server diagnostics) and never leave the crate as-is: the
//! service logs them and collapses them into [`tenantauth_core::Error`].

use tenantauth_core::Error;
use thiserror::Error as ThisError;
use tracing::{debug, error, warn};

/// Failure of a single directory step.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The configured host and port do not form a usable URL
    #[error("invalid directory URL: {0}")]
    InvalidUrl(String),

    /// TCP connect or implicit TLS handshake failed
    #[error("dial failed: {0}")]
    Dial(String),

    /// STARTTLS negotiation failed
    #[error("STARTTLS negotiation failed: {0}")]
    StartTls(String),

    /// The connection broke after it was established
    #[error("connection lost: {0}")]
    Transport(String),

    /// TLS connector could not be built
    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// A simple bind was rejected
    #[error("bind rejected: {0}")]
    Bind(String),

    /// The service account bind was rejected
    #[error("service bind rejected: {0}")]
    ServiceBind(String),

    /// The directory refused or failed the search
    #[error("search failed: {0}")]
    Search(String),

    /// The search did not yield exactly one entry
    #[error("expected one directory entry, found {matches}")]
    UserNotFound {
        /// Number of entries the search returned
        matches: usize,
    },

    /// The user bind with the submitted password was rejected
    #[error("user bind rejected: {0}")]
    UserBind(String),

    /// A directory operation exceeded the operation timeout
    #[error("{operation} timed out")]
    Timeout {
        /// Operation that timed out
        operation: &'static str,
    },

    /// The request deadline passed before the operation finished
    #[error("request deadline exceeded")]
    Deadline,

    /// Any other protocol level failure (unbind, unexpected response)
    #[error("directory protocol error: {0}")]
    Protocol(String),
}

impl DirectoryError {
    /// Short name of the failing stage, used as a log field.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) | Self::Dial(_) => "dial",
            Self::StartTls(_) => "starttls",
            Self::Tls(_) => "tls",
            Self::Transport(_) => "transport",
            Self::Bind(_) => "bind",
            Self::ServiceBind(_) => "service_bind",
            Self::Search(_) => "search",
            Self::UserNotFound { .. } => "user_lookup",
            Self::UserBind(_) => "user_bind",
            Self::Timeout { .. } => "timeout",
            Self::Deadline => "deadline",
            Self::Protocol(_) => "protocol",
        }
    }

    /// Returns true if the directory could not be reached in time.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_)
                | Self::Dial(_)
                | Self::StartTls(_)
                | Self::Tls(_)
                | Self::Transport(_)
                | Self::Timeout { .. }
                | Self::Deadline
        )
    }

    pub(crate) fn at_service_bind(self) -> Self {
        match self {
            Self::Bind(message) => Self::ServiceBind(message),
            other => other,
        }
    }

    pub(crate) fn at_user_bind(self) -> Self {
        match self {
            Self::Bind(message) => Self::UserBind(message),
            other => other,
        }
    }

    /// Collapse into the public taxonomy used by sign-in and profile lookups.
    pub(crate) fn into_public(self, provider: &str) -> Error {
        if self.is_connection_failure() {
            Error::ConnectionFailed(provider.to_string())
        } else {
            Error::InvalidCredentials
        }
    }

    /// Collapse for a connectivity check, where a rejected service bind or an unexpected
    /// response is a connection problem.
    pub(crate) fn into_check_failure(self, provider: &str) -> Error {
        match self {
            Self::Bind(_) | Self::ServiceBind(_) | Self::Protocol(_) => {
                Error::ConnectionFailed(provider.to_string())
            }
            other => other.into_public(provider),
        }
    }
}

/// Log a directory failure with the detail an operator needs.
pub(crate) fn report(provider: &str, url: &str, err: &DirectoryError) {
    let stage = err.stage();
    match err {
        DirectoryError::InvalidUrl(_)
        | DirectoryError::Dial(_)
        | DirectoryError::StartTls(_)
        | DirectoryError::Tls(_)
        | DirectoryError::Transport(_) => {
            error!(provider, url, stage, error = %err, "directory connection failed");
        }
        DirectoryError::ServiceBind(_) => {
            error!(provider, url, stage, error = %err, "service account bind rejected");
        }
        DirectoryError::Search(_) => {
            error!(provider, url, stage, error = %err, "user search failed");
        }
        DirectoryError::Timeout { .. } | DirectoryError::Deadline => {
            warn!(provider, url, stage, error = %err, "directory did not answer in time");
        }
        DirectoryError::UserNotFound { matches } => {
            debug!(provider, stage, matches, "no unique directory entry for username");
        }
        DirectoryError::UserBind(_) => {
            debug!(provider, stage, "user bind rejected");
        }
        DirectoryError::Bind(_) | DirectoryError::Protocol(_) => {
            warn!(provider, url, stage, error = %err, "directory operation failed");
        }
    }
}
