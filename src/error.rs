//! Error types for the Micetro reconciliation client.
//!
//! Validation, authentication, transport and server errors abort a call.
//! Per-member failures are not errors at this level; they are collected on
//! the [`crate::reconciler::ReconciliationResult`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Micetro reconciliation client.
#[derive(Debug, Error)]
pub enum MicetroError {
    /// Parameter and configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Micetro API errors.
    #[error("Micetro API error: {0}")]
    Api(#[from] ApiError),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Parameter and configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The parameter file was not found.
    #[error("Parameter file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The parameter file could not be parsed.
    #[error("Failed to parse parameters: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed before any network call was made.
    #[error("Parameter validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A required connection setting is missing.
    #[error("Missing connection setting: {name}")]
    MissingEnvVar {
        /// Name of the missing setting.
        name: String,
    },
}

/// Micetro API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credentials.
    #[error("Micetro authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// Network failure or timeout.
    #[error("Network error communicating with Micetro: {message}")]
    Transport {
        /// Description of the network error.
        message: String,
    },

    /// The requested object does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind of object.
        kind: String,
        /// Name or reference that was looked up.
        name: String,
    },

    /// The server answered with a non-2xx status.
    #[error("Micetro API request failed: {status} - {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message supplied by the server.
        message: String,
    },

    /// The response body could not be understood.
    #[error("Invalid response from Micetro API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Reconciliation errors.
///
/// These describe failures of individual items; the reconciler renders
/// them into the result's error list rather than returning them.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A group member does not resolve to an existing user.
    #[error("User '{user}' does not exist, not added to group '{group}'")]
    UnresolvedMember {
        /// Group being reconciled.
        group: String,
        /// User name that could not be resolved.
        user: String,
    },

    /// A membership change was rejected by the server.
    #[error("Failed to {operation} user '{user}' in group '{group}': {reason}")]
    MemberUpdateFailed {
        /// Operation attempted (add or remove).
        operation: String,
        /// Group the user joins or leaves.
        group: String,
        /// User name.
        user: String,
        /// Reason reported by the server.
        reason: String,
    },

    /// A role assignment was rejected by the server.
    #[error("Failed to {operation} role '{role}' for user '{user}': {reason}")]
    RoleUpdateFailed {
        /// Operation attempted (add or remove).
        operation: String,
        /// Role being assigned or revoked.
        role: String,
        /// User name.
        user: String,
        /// Reason reported by the server.
        reason: String,
    },
}

/// Result type alias for Micetro operations.
pub type Result<T> = std::result::Result<T, MicetroError>;

impl MicetroError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns a stable name for the error category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(ConfigError::ValidationError { .. }) => "validation",
            Self::Config(_) => "config",
            Self::Api(ApiError::AuthenticationFailed { .. }) => "auth",
            Self::Api(ApiError::Transport { .. }) => "transport",
            Self::Api(ApiError::NotFound { .. }) => "not_found",
            Self::Api(ApiError::Server { .. }) => "server",
            Self::Api(ApiError::InvalidResponse { .. }) => "invalid_response",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns true if the error was raised before contacting the server.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Config(ConfigError::ValidationError { .. }))
    }

    /// Returns true if a per-item operation failing with this error should
    /// be recorded and skipped instead of aborting the whole call.
    #[must_use]
    pub const fn is_item_level(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::Server { .. } | ApiError::NotFound { .. })
        )
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl ApiError {
    /// Creates a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a not-found error for a named object.
    #[must_use]
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
