//! In-memory providers for testing

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::{CameraHandle, CameraProvider, CameraStream, FeedbackProvider, Frame, StaticDecoder};
use crate::config::CameraRequest;
use crate::error::{CameraError, DecodeError, FeedbackError};
use crate::models::RawBarcode;

const FRAME_BUFFER: usize = 64;

/// Mock camera; frames are pushed in by the test
pub struct MockCamera {
    available: AtomicBool,
    has_torch: AtomicBool,
    torch_on: AtomicBool,
    next_handle: AtomicU64,
    active: Mutex<Option<(CameraHandle, mpsc::Sender<Frame>)>>,
    last_request: Mutex<Option<CameraRequest>>,
    cameras: RwLock<Vec<String>>,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            has_torch: AtomicBool::new(true),
            torch_on: AtomicBool::new(false),
            next_handle: AtomicU64::new(1),
            active: Mutex::new(None),
            last_request: Mutex::new(None),
            cameras: RwLock::new(vec!["0".to_string(), "1".to_string()]),
            acquisitions: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    /// Simulate a missing device or denied permission
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_has_torch(&self, has_torch: bool) {
        self.has_torch.store(has_torch, Ordering::SeqCst);
    }

    pub fn set_cameras(&self, ids: Vec<String>) {
        *self.cameras.write() = ids;
    }

    /// Deliver one decoded frame; false if no camera is acquired or the
    /// consumer went away
    pub async fn send_frame(&self, barcodes: Vec<RawBarcode>) -> bool {
        self.deliver(Ok(barcodes)).await
    }

    /// Deliver a frame whose decode failed
    pub async fn send_decode_error(&self, error: DecodeError) -> bool {
        self.deliver(Err(error)).await
    }

    async fn deliver(&self, frame: Frame) -> bool {
        let tx = match self.active.lock().as_ref() {
            Some((_, tx)) => tx.clone(),
            None => return false,
        };
        tx.send(frame).await.is_ok()
    }

    pub fn is_acquired(&self) -> bool {
        self.active.lock().is_some()
    }

    pub fn torch_enabled(&self) -> bool {
        self.torch_on.load(Ordering::SeqCst)
    }

    pub fn acquisition_count(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CameraRequest> {
        *self.last_request.lock()
    }
}

#[async_trait]
impl CameraProvider for MockCamera {
    async fn acquire(&self, request: &CameraRequest) -> Result<CameraStream, CameraError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CameraError::Unavailable("mock camera disabled".to_string()));
        }

        let mut active = self.active.lock();
        if let Some((handle, _)) = active.as_ref() {
            return Err(CameraError::Busy(format!("handle {} still bound", handle.id())));
        }

        let handle = CameraHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        *active = Some((handle, tx));
        *self.last_request.lock() = Some(*request);
        self.acquisitions.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(handle = handle.id(), ?request, "Mock camera: acquired");
        Ok(CameraStream { handle, frames: rx })
    }

    async fn release(&self, handle: CameraHandle) {
        let mut active = self.active.lock();
        if matches!(active.as_ref(), Some((h, _)) if *h == handle) {
            *active = None;
            self.torch_on.store(false, Ordering::SeqCst);
            self.releases.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(handle = handle.id(), "Mock camera: released");
        }
    }

    async fn set_torch(&self, handle: CameraHandle, enabled: bool) -> Result<(), CameraError> {
        if !self.has_torch.load(Ordering::SeqCst) {
            return Err(CameraError::TorchUnsupported);
        }
        match self.active.lock().as_ref() {
            Some((h, _)) if *h == handle => {
                self.torch_on.store(enabled, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(CameraError::Unavailable("camera not acquired".to_string())),
        }
    }

    async fn has_torch(&self) -> bool {
        self.has_torch.load(Ordering::SeqCst)
    }

    async fn available_cameras(&self) -> Vec<String> {
        if !self.available.load(Ordering::SeqCst) {
            return Vec::new();
        }
        self.cameras.read().clone()
    }
}

/// Static decoder answering from predefined image -> detections pairs
#[derive(Default)]
pub struct ScriptedDecoder {
    responses: RwLock<Vec<(Vec<u8>, Frame)>>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `image` with the given detections
    pub fn add_response(&self, image: Vec<u8>, barcodes: Vec<RawBarcode>) {
        self.responses.write().push((image, Ok(barcodes)));
    }

    /// Answer `image` with a decode failure
    pub fn add_failure(&self, image: Vec<u8>, error: DecodeError) {
        self.responses.write().push((image, Err(error)));
    }
}

#[async_trait]
impl StaticDecoder for ScriptedDecoder {
    async fn decode(&self, image: &[u8]) -> Result<Vec<RawBarcode>, DecodeError> {
        self.responses
            .read()
            .iter()
            .find(|(img, _)| img == image)
            .map(|(_, frame)| frame.clone())
            .unwrap_or_else(|| {
                Err(DecodeError::UnsupportedImage(
                    "no scripted response".to_string(),
                ))
            })
    }
}

/// Feedback provider that counts calls
#[derive(Default)]
pub struct RecordingFeedback {
    beeps: AtomicUsize,
    vibrations: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails (after being counted)
    pub fn failing() -> Self {
        let feedback = Self::default();
        feedback.failing.store(true, Ordering::SeqCst);
        feedback
    }

    pub fn beeps(&self) -> usize {
        self.beeps.load(Ordering::SeqCst)
    }

    pub fn vibrations(&self) -> usize {
        self.vibrations.load(Ordering::SeqCst)
    }
}

impl FeedbackProvider for RecordingFeedback {
    fn beep(&self) -> Result<(), FeedbackError> {
        self.beeps.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FeedbackError::Sound("no audio device".to_string()));
        }
        Ok(())
    }

    fn vibrate(&self) -> Result<(), FeedbackError> {
        self.vibrations.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FeedbackError::Vibration("no vibrator".to_string()));
        }
        Ok(())
    }
}
