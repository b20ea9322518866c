//! Error types for the scan core
//!
//! None of these cross the host call boundary as failures of a scan: the
//! session controller and static scanner degrade them to "no result".

use thiserror::Error;

/// Camera acquisition and control errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Camera busy: {0}")]
    Busy(String),

    #[error("Failed to bind camera: {0}")]
    BindFailed(String),

    #[error("Torch not supported")]
    TorchUnsupported,
}

/// Decoder errors (bad image bytes, vendor decode exception)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Decoder failed: {0}")]
    Failed(String),
}

/// Beep/vibrate failures, always ignored by the controller
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("Sound playback failed: {0}")]
    Sound(String),

    #[error("Vibration failed: {0}")]
    Vibration(String),
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A format name outside the canonical tag set
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown format tag: {0}")]
pub struct UnknownFormatTag(pub String);
