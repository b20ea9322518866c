//! Platform capability interfaces
//!
//! Each platform supplies a thin adapter implementing these traits against its
//! native SDK:
//! - [`CameraProvider`] opens the camera and delivers decoded frames
//! - [`StaticDecoder`] runs one decode pass over an encoded image
//! - [`FeedbackProvider`] beeps and vibrates
//!
//! The [`mock`] module provides in-memory implementations for tests and the
//! CLI.

pub mod mock;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::CameraRequest;
use crate::error::{CameraError, DecodeError, FeedbackError};
use crate::models::RawBarcode;

/// Opaque handle to an acquired camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(u64);

impl CameraHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Decoder output for one camera frame
///
/// An error is a dropped frame; the session keeps running.
pub type Frame = Result<Vec<RawBarcode>, DecodeError>;

/// An acquired camera together with its frame feed
///
/// Frames are delivered serially by a single producer.
#[derive(Debug)]
pub struct CameraStream {
    pub handle: CameraHandle,
    pub frames: mpsc::Receiver<Frame>,
}

/// Camera and frame-decoder collaborator
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Open and bind a camera matching the request
    async fn acquire(&self, request: &CameraRequest) -> Result<CameraStream, CameraError>;

    /// Release the camera
    ///
    /// Must have freed the device when the future completes, so that an
    /// immediately following `acquire` does not see it busy.
    async fn release(&self, handle: CameraHandle);

    /// Switch the torch on or off
    async fn set_torch(&self, handle: CameraHandle, enabled: bool) -> Result<(), CameraError>;

    /// Whether the device has a torch at all; needs no bound camera
    async fn has_torch(&self) -> bool;

    /// Platform identifiers of the cameras present, empty when unknown
    async fn available_cameras(&self) -> Vec<String>;
}

/// One-shot decoder for still images
#[async_trait]
pub trait StaticDecoder: Send + Sync {
    /// Decode every code found in an encoded image (PNG, JPEG, ...)
    async fn decode(&self, image: &[u8]) -> Result<Vec<RawBarcode>, DecodeError>;
}

/// Scan feedback side effects; fire-and-forget
#[cfg_attr(test, mockall::automock)]
pub trait FeedbackProvider: Send + Sync {
    fn beep(&self) -> Result<(), FeedbackError>;
    fn vibrate(&self) -> Result<(), FeedbackError>;
}

/// Feedback provider that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl FeedbackProvider for NoFeedback {
    fn beep(&self) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn vibrate(&self) -> Result<(), FeedbackError> {
        Ok(())
    }
}
