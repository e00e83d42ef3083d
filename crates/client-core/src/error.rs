//! Error types for the session core

use thiserror::Error;

use crate::media::TrackId;

/// Result type for session core operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while configuring or driving a session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Configuration was rejected before any session existed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The capture device could not be opened
    #[error("Capture device error: {message}")]
    CaptureDevice { message: String },

    /// A local track could not be attached to the connection
    #[error("Failed to attach track {track_id}: {message}")]
    TrackAttach { track_id: TrackId, message: String },

    /// The signaling engine refused to start the connection
    #[error("Signaling error: {message}")]
    Signaling { message: String },

    /// Operation not allowed in the current session state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Process-wide platform initialization failed
    #[error("Platform initialization failed: {message}")]
    Platform { message: String },
}

impl ClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a capture device error
    pub fn capture_device(message: impl Into<String>) -> Self {
        Self::CaptureDevice {
            message: message.into(),
        }
    }

    /// Create a track attach error
    pub fn track_attach(track_id: TrackId, message: impl Into<String>) -> Self {
        Self::TrackAttach {
            track_id,
            message: message.into(),
        }
    }

    /// Create a signaling error
    pub fn signaling(message: impl Into<String>) -> Self {
        Self::Signaling {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    /// Whether the error was raised while validating configuration
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Whether the error ends the connection attempt.
    ///
    /// Track attach failures are reported but the session keeps running.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TrackAttach { .. })
    }
}
