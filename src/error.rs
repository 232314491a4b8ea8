//! Error types for modelgate
//!
//! `GatewayError` is what the catalog, selector and chat client return to
//! their caller. It is `Clone` so a single failed catalog fetch can be handed
//! to every task that was awaiting it. `AppError` wraps it for process-level
//! concerns such as loading the configuration file.

use thiserror::Error;

/// Maximum number of characters of an upstream response body kept in errors
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors surfaced by gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Required configuration (usually the credential) is missing or unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller supplied arguments the gateway would reject
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The gateway answered with a failure, or could not be reached
    #[error("Upstream error: {0}")]
    Upstream(UpstreamFailure),

    /// The gateway answered successfully but broke its response contract
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Why an upstream call failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamFailure {
    #[error("HTTP {status} {reason}: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("{operation} timeout after {timeout_seconds} seconds")]
    Timeout {
        operation: String,
        timeout_seconds: u64,
    },

    #[error("{operation} transport failure: {reason}")]
    Transport { operation: String, reason: String },
}

impl GatewayError {
    /// HTTP status of the upstream response, if the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream(UpstreamFailure::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure was an expired timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Upstream(UpstreamFailure::Timeout { .. }))
    }
}

/// Process-level errors (configuration loading, CLI)
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Convenience type alias for gateway results
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Convenience type alias for process-level results
pub type AppResult<T> = Result<T, AppError>;

/// Truncate an upstream body for inclusion in an error message
///
/// Cuts on a char boundary and appends `...` when anything was dropped.
pub fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
