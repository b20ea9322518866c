//! Host-facing error type
//!
//! Every error carries a stable code string the host maps to its own
//! exception type, plus a human-readable message.

use serde_json::{json, Value};
use thiserror::Error;

/// Result type for channel calls
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors returned across the host call boundary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Camera permission not granted
    #[error("Camera permission is required")]
    PermissionDenied,

    /// Missing or malformed call argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Method not handled by this channel
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// Camera control failed (e.g. torch)
    #[error("Camera error: {0}")]
    Camera(String),

    /// Scan could not be carried out
    #[error("Scan error: {0}")]
    Scan(String),
}

impl ChannelError {
    /// Stable error code for the host
    pub fn code(&self) -> &'static str {
        match self {
            ChannelError::PermissionDenied => "PERMISSION_DENIED",
            ChannelError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ChannelError::NotImplemented(_) => "NOT_IMPLEMENTED",
            ChannelError::Camera(_) => "CAMERA_ERROR",
            ChannelError::Scan(_) => "SCAN_ERROR",
        }
    }

    /// `{code, message}` pair as sent back to the host
    pub fn to_value(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.to_string(),
        })
    }
}

impl From<scan_core::CameraError> for ChannelError {
    fn from(err: scan_core::CameraError) -> Self {
        match err {
            scan_core::CameraError::PermissionDenied => ChannelError::PermissionDenied,
            other => ChannelError::Camera(other.to_string()),
        }
    }
}
