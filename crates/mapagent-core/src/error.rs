//! Error types for the map agent session core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire session core.
///
/// Variants are structured so they can be serialized across a UI boundary.
/// Turn-level failures carry the raw diagnostic lines captured up to the
/// point of failure so the caller can show full detail for diagnosis.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapAgentError {
    /// The session has not been initialized yet
    #[error("Session has not been initialized")]
    NotInitialized,

    /// `initialize` was called on a session that already holds state
    #[error("Session is already initialized")]
    AlreadyInitialized,

    /// A turn was submitted while another turn on the same session was running
    #[error("A turn is already in progress for this session")]
    TurnInProgress,

    /// The agent pipeline returned an error
    #[error("Dispatch failed: {message}")]
    Dispatch {
        message: String,
        diagnostics: Vec<String>,
    },

    /// The agent pipeline did not finish within the configured timeout
    #[error("Dispatch timed out after {after_secs}s")]
    DispatchTimeout {
        after_secs: u64,
        diagnostics: Vec<String>,
    },

    /// The turn was cancelled by the caller
    #[error("Dispatch was cancelled")]
    Cancelled { diagnostics: Vec<String> },

    /// Filter settings out of their valid ranges
    #[error("Invalid filter settings: {0}")]
    InvalidFilter(String),

    /// Index-based access past the end of an ordered collection
    #[error("{entity_type} index {index} out of range (len {len})")]
    IndexOutOfRange {
        entity_type: String,
        index: usize,
        len: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MapAgentError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Dispatch error with the diagnostics captured so far
    pub fn dispatch(message: impl Into<String>, diagnostics: Vec<String>) -> Self {
        Self::Dispatch {
            message: message.into(),
            diagnostics,
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidFilter error
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error came out of the agent pipeline call.
    ///
    /// Timeouts and cancellations count: the session boundary treats all
    /// three the same way.
    pub fn is_dispatch_failure(&self) -> bool {
        matches!(
            self,
            Self::Dispatch { .. } | Self::DispatchTimeout { .. } | Self::Cancelled { .. }
        )
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Raw diagnostic lines captured before a dispatch failure.
    ///
    /// Empty for every non-dispatch error.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::Dispatch { diagnostics, .. }
            | Self::DispatchTimeout { diagnostics, .. }
            | Self::Cancelled { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MapAgentError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MapAgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MapAgentError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MapAgentError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for MapAgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, MapAgentError>`.
pub type Result<T> = std::result::Result<T, MapAgentError>;
