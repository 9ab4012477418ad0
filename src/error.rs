//! Error types for shipgen
//!
//! CLI and infrastructure code returns `ShipgenResult<T>`. Failures of the
//! external image API are modelled separately by [`BackendError`], which never
//! reaches the end caller: the ship image service turns every one of them
//! into a fallback image.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shipgen operations
pub type ShipgenResult<T> = Result<T, ShipgenError>;

/// All errors that can surface from shipgen commands
#[derive(Error, Debug)]
pub enum ShipgenError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Ship errors
    #[error("Invalid ship configuration: {0}")]
    InvalidShip(String),

    #[error("Unknown faction: {0}")]
    UnknownFaction(String),

    // Output errors
    #[error("Failed to decode image payload: {0}")]
    Decode(String),

    #[error("Request queue is shut down")]
    QueueClosed,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShipgenError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownFaction(_) => Some("Run: shipgen catalog"),
            Self::ConfigInvalid { .. } => Some("Run: shipgen config init --force"),
            _ => None,
        }
    }
}

/// How a backend failure affects the quota governor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing credentials or similar local misconfiguration
    Configuration,
    /// Rate limit, exhausted quota or billing required; suspends the API
    Quota,
    /// Network failure, bad status, malformed payload
    Transient,
    /// The call succeeded but produced no image
    Empty,
}

/// Failures of a single call to the external image API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("API key missing or rejected")]
    MissingCredentials,

    #[error("quota or billing limit hit (HTTP {status}): {message}")]
    Quota { status: u16, message: String },

    #[error("request failed (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no image part found in response")]
    NoImage,

    #[error("image API suspended after a quota error")]
    Suspended,
}

impl BackendError {
    /// Classify the failure for the governor and for logging
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingCredentials => ErrorClass::Configuration,
            Self::Quota { .. } | Self::Suspended => ErrorClass::Quota,
            Self::NoImage => ErrorClass::Empty,
            Self::Http { .. } | Self::Transport(_) | Self::MalformedResponse(_) => {
                ErrorClass::Transient
            }
        }
    }

    /// Whether this failure should suspend further API calls
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::Quota { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ShipgenError::UnknownFaction("klingon".to_string());
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn error_hint() {
        let err = ShipgenError::UnknownFaction("klingon".to_string());
        assert!(err.hint().unwrap().contains("shipgen catalog"));
        assert_eq!(ShipgenError::QueueClosed.hint(), None);
    }

    #[test]
    fn backend_error_classes() {
        let quota = BackendError::Quota {
            status: 429,
            message: "RESOURCE_EXHAUSTED".to_string(),
        };
        assert_eq!(quota.class(), ErrorClass::Quota);
        assert!(quota.is_quota());

        assert_eq!(BackendError::NoImage.class(), ErrorClass::Empty);
        assert_eq!(
            BackendError::Transport("reset".to_string()).class(),
            ErrorClass::Transient
        );
        assert_eq!(
            BackendError::MissingCredentials.class(),
            ErrorClass::Configuration
        );
        assert!(!BackendError::NoImage.is_quota());
    }
}
