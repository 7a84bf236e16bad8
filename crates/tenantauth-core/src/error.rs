//! Error types for tenant directory sign-in.
//!
//! The taxonomy is deliberately coarse: directory failures are logged with operator detail where
//! they happen and then collapsed into one of these variants before they reach a caller. None of
//! the variants carries a hostname or distinguished name.

use serde::Serialize;
use thiserror::Error;

/// Main error type for sign-in operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No provider configuration exists for the tenant and provider key
    #[error("Provider configuration not found: {0}")]
    ConfigurationNotFound(String),

    /// Dialing, TLS negotiation or STARTTLS failed, or the directory did not answer in time
    #[error("Could not connect to directory provider: {0}")]
    ConnectionFailed(String),

    /// The credential could not be verified
    #[error("Username or password is invalid.")]
    InvalidCredentials,

    /// The tenant only accepts invited users and no account matched
    #[error("User is not invited to this tenant")]
    NotInvited,

    /// Registering a user or attaching a provider identity failed
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A collaborator store could not be read
    #[error("Store error: {0}")]
    StoreError(String),
}

/// Specialized result type for sign-in operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Response class a handler layer should use for an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// The request itself was unacceptable (400)
    BadRequest,
    /// The addressed resource does not exist (404)
    NotFound,
    /// An upstream dependency failed or timed out (504)
    GatewayTimeout,
    /// The caller should be redirected to a guidance page
    Redirect,
    /// Anything else (500)
    Internal,
}

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Optional request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigurationNotFound(_) => "CONFIGURATION_NOT_FOUND",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NotInvited => "NOT_INVITED",
            Self::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::StoreError(_) => "STORE_ERROR",
        }
    }

    /// Returns the response class the handler layer should surface.
    #[must_use]
    pub const fn status_class(&self) -> StatusClass {
        match self {
            Self::ConfigurationNotFound(_) => StatusClass::NotFound,
            Self::InvalidCredentials | Self::ValidationError(_) => StatusClass::BadRequest,
            Self::ConnectionFailed(_) => StatusClass::GatewayTimeout,
            Self::NotInvited => StatusClass::Redirect,
            Self::PersistenceFailure(_) | Self::ConfigError(_) | Self::StoreError(_) => {
                StatusClass::Internal
            }
        }
    }

    /// Returns true if retrying the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        self.into_error_response_with_id(None)
    }

    /// Converts the error into an `ErrorResponse` with a request ID.
    #[must_use]
    pub fn into_error_response_with_id(self, request_id: Option<String>) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: None,
            },
            request_id,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::PersistenceFailure(_) | Self::ConfigError(_) | Self::StoreError(_)
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid directory URL: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(first_validation_message(&err).unwrap_or_else(|| err.to_string()))
    }
}

fn first_validation_message(errors: &validator::ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|err| err.message.as_ref().map(ToString::to_string))
}
