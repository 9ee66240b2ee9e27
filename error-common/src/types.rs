use thiserror::Error;

use crate::codes;

/// Error returned at binary boundaries
#[derive(Error, Debug)]
pub enum IpsError {
    /// Input rejected before any backend call
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Login or token refresh failures
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Backend could not be reached or answered with an error
    #[error("Backend error: {message}")]
    BackendError { code: &'static str, message: String },

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Business rule violations; `code` names the rule
    #[error("Business rule violated: {message}")]
    BusinessError { code: &'static str, message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IpsError {
    pub fn business(code: &'static str, message: impl Into<String>) -> Self {
        Self::BusinessError {
            code,
            message: message.into(),
        }
    }

    pub fn backend(code: &'static str, message: impl Into<String>) -> Self {
        Self::BackendError {
            code,
            message: message.into(),
        }
    }

    /// Stable code; business and backend errors keep the code they were raised with
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => codes::validation::INVALID_INPUT,
            Self::AuthError(_) => codes::authentication::SESSION_EXPIRED,
            Self::BackendError { code, .. } | Self::BusinessError { code, .. } => *code,
            Self::NotFound(_) => codes::backend::NOT_FOUND,
            Self::ConfigError(_) => codes::system::CONFIGURATION,
            Self::InternalError(_) | Self::Other(_) => codes::system::INTERNAL,
        }
    }

    /// Process exit code for CLI front ends
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ValidationError(_) | Self::BusinessError { .. } => 2,
            Self::AuthError(_) => 3,
            Self::NotFound(_) => 4,
            Self::ConfigError(_) => 78,
            Self::BackendError { .. } | Self::InternalError(_) | Self::Other(_) => 1,
        }
    }
}

/// Result type alias for IPS billing operations
pub type Result<T> = std::result::Result<T, IpsError>;

/// Log an error once, at the boundary where it is handled
pub fn log_error(context: &str, error: &IpsError) {
    tracing::error!(
        context = context,
        error_code = error.code(),
        error = %error,
        "IPS billing error occurred"
    );
}
