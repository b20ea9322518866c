//! Scan session controller

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{PendingScan, SessionState};
use crate::config::{FeedbackConfig, ScanConfiguration};
use crate::error::CameraError;
use crate::models::{RawBarcode, ScanDetection, ScanResult};
use crate::normalizer;
use crate::provider::{CameraHandle, CameraProvider, CameraStream, FeedbackProvider};

struct Inner {
    session_id: Option<Uuid>,
    config: Option<Arc<ScanConfiguration>>,
    state: SessionState,
    /// Taken exactly once, by whichever path ends the session first
    terminal: Option<oneshot::Sender<Option<ScanResult>>>,
    camera: Option<CameraHandle>,
}

/// State shared between the controller and its frame/timeout tasks
struct SessionCore {
    inner: Mutex<Inner>,
    feedback: Arc<dyn FeedbackProvider>,
}

impl SessionCore {
    /// Run the acceptance policy over one batch of detections
    ///
    /// `expected` pins the batch to a session so a frame task outliving its
    /// session cannot touch the next one.
    fn evaluate(&self, expected: Option<Uuid>, detections: Vec<ScanDetection>) {
        let (accepted, feedback, delivery) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            if expected.is_some() && inner.session_id != expected {
                return;
            }
            if !inner.state.is_active || inner.state.is_paused {
                return;
            }
            let Some(config) = inner.config.clone() else {
                return;
            };

            let mut accepted = 0usize;
            let mut terminal = None;

            for detection in detections {
                if detection.payload.is_empty() {
                    debug!("Discarding detection with empty payload");
                    continue;
                }
                if !config.formats.allows(detection.format) {
                    debug!(format = %detection.format, "Discarding detection of filtered format");
                    continue;
                }

                if !config.multi_scan {
                    accepted += 1;
                    terminal = Some(detection);
                    break;
                }

                if inner.state.seen_payloads.contains(&detection.payload) {
                    debug!("Discarding duplicate payload");
                    continue;
                }
                accepted += 1;
                inner.state.seen_payloads.insert(detection.payload.clone());
                inner.state.accepted_count += 1;
                debug!(
                    accepted_count = inner.state.accepted_count,
                    format = %detection.format,
                    "Accepted detection"
                );

                if let Some(limit) = config.scan_limit() {
                    if inner.state.accepted_count >= limit {
                        terminal = Some(detection);
                        break;
                    }
                }
            }

            let delivery = terminal.map(|detection| {
                inner.state.is_active = false;
                (
                    inner.session_id,
                    inner.terminal.take(),
                    ScanResult::capture(detection),
                )
            });

            (accepted, config.feedback, delivery)
        };

        for _ in 0..accepted {
            self.fire_feedback(feedback);
        }

        if let Some((session_id, tx, result)) = delivery {
            info!(
                session_id = ?session_id,
                format = %result.format,
                "Scan session complete"
            );
            if let Some(tx) = tx {
                let _ = tx.send(Some(result));
            }
        }
    }

    /// End a running session with no result
    fn finish(&self, session_id: Uuid, reason: &str) {
        let tx = {
            let mut inner = self.inner.lock();
            if inner.session_id != Some(session_id) || !inner.state.is_active {
                return;
            }
            inner.state.is_active = false;
            inner.terminal.take()
        };

        info!(%session_id, reason, "Scan session ended without result");
        if let Some(tx) = tx {
            let _ = tx.send(None);
        }
    }

    fn is_running(&self, session_id: Uuid) -> bool {
        let inner = self.inner.lock();
        inner.session_id == Some(session_id) && inner.state.is_active
    }

    fn fire_feedback(&self, feedback: FeedbackConfig) {
        if feedback.beep {
            if let Err(e) = self.feedback.beep() {
                warn!(error = %e, "Beep failed");
            }
        }
        if feedback.vibrate {
            if let Err(e) = self.feedback.vibrate() {
                warn!(error = %e, "Vibrate failed");
            }
        }
    }
}

/// Controls camera scanning sessions
///
/// Control calls (`start`, `pause`, `resume`, `stop`) may come from a
/// different context than frame delivery. All state transitions and the
/// acceptance policy run under one lock; `start` and `stop` are additionally
/// serialised so a new session never sees the previous camera still bound.
pub struct ScanSession {
    core: Arc<SessionCore>,
    camera: Arc<dyn CameraProvider>,
    lifecycle: AsyncMutex<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ScanSession {
    pub fn new(camera: Arc<dyn CameraProvider>, feedback: Arc<dyn FeedbackProvider>) -> Self {
        Self {
            core: Arc::new(SessionCore {
                inner: Mutex::new(Inner {
                    session_id: None,
                    config: None,
                    state: SessionState::default(),
                    terminal: None,
                    camera: None,
                }),
                feedback,
            }),
            camera,
            lifecycle: AsyncMutex::new(()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start a new session
    ///
    /// A running session is stopped first. Camera acquisition failures are
    /// not errors: the returned [`PendingScan`] resolves with `None`.
    pub async fn start(&self, config: ScanConfiguration) -> PendingScan {
        let _lifecycle = self.lifecycle.lock().await;
        self.shutdown().await;

        let session_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        let config = Arc::new(config);

        {
            let mut inner = self.core.inner.lock();
            inner.session_id = Some(session_id);
            inner.config = Some(config.clone());
            inner.state = SessionState::activated();
            inner.terminal = Some(tx);
        }

        info!(
            %session_id,
            multi_scan = config.multi_scan,
            max_scans = config.max_scans,
            formats = ?config.formats,
            "Scan session started"
        );

        match self.camera.acquire(&config.camera_request()).await {
            Ok(stream) => self.attach(session_id, &config, stream).await,
            Err(e) => {
                warn!(%session_id, error = %e, "Camera acquisition failed");
                self.core.finish(session_id, "camera unavailable");
            }
        }

        PendingScan::new(session_id, rx)
    }

    async fn attach(&self, session_id: Uuid, config: &ScanConfiguration, stream: CameraStream) {
        let CameraStream { handle, mut frames } = stream;
        self.core.inner.lock().camera = Some(handle);

        if config.enable_flash {
            if let Err(e) = self.camera.set_torch(handle, true).await {
                warn!(%session_id, error = %e, "Failed to enable torch");
            }
        }

        let core = self.core.clone();
        let frame_task = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                match frame {
                    Ok(barcodes) => {
                        let detections = barcodes.iter().map(normalizer::normalize).collect();
                        core.evaluate(Some(session_id), detections);
                    }
                    Err(e) => debug!(%session_id, error = %e, "Dropped frame"),
                }
                if !core.is_running(session_id) {
                    break;
                }
            }
            debug!(%session_id, "Frame feed closed");
        });

        let mut tasks = self.tasks.lock();
        tasks.push(frame_task);

        if let Some(timeout) = config.timeout() {
            let core = self.core.clone();
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                core.finish(session_id, "timeout");
            }));
        }
    }

    /// Suppress evaluation of incoming detections
    pub fn pause(&self) {
        self.core.inner.lock().state.is_paused = true;
        debug!("Scan session paused");
    }

    pub fn resume(&self) {
        self.core.inner.lock().state.is_paused = false;
        debug!("Scan session resumed");
    }

    /// Stop the session and release the camera
    ///
    /// Idempotent. A still-pending scan resolves with `None`.
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        self.shutdown().await;
    }

    async fn shutdown(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in &tasks {
            task.abort();
        }

        let (session_id, camera) = {
            let mut inner = self.core.inner.lock();
            let session_id = inner.session_id.take();
            let camera = inner.camera.take();
            inner.config = None;
            inner.state = SessionState::default();
            // Dropping the sender resolves the pending scan with no result
            inner.terminal = None;
            (session_id, camera)
        };

        if let Some(handle) = camera {
            self.camera.release(handle).await;
        }
        if let Some(session_id) = session_id {
            info!(%session_id, "Scan session stopped");
        }
    }

    /// Evaluate one batch of detections against the current session
    pub fn on_detections(&self, detections: Vec<ScanDetection>) {
        self.core.evaluate(None, detections);
    }

    /// Normalize and evaluate vendor detections
    pub fn on_raw_detections(&self, barcodes: &[RawBarcode]) {
        self.on_detections(barcodes.iter().map(normalizer::normalize).collect());
    }

    /// Switch the torch of the bound camera; no-op without one
    pub async fn set_torch(&self, enabled: bool) -> Result<(), CameraError> {
        let handle = self.core.inner.lock().camera;
        match handle {
            Some(handle) => self.camera.set_torch(handle, enabled).await,
            None => {
                debug!("No camera bound, ignoring torch request");
                Ok(())
            }
        }
    }

    /// Snapshot of the session state
    pub fn state(&self) -> SessionState {
        self.core.inner.lock().state.clone()
    }

    pub fn is_active(&self) -> bool {
        self.core.inner.lock().state.is_active
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.core.inner.lock().session_id
    }

    pub async fn has_torch(&self) -> bool {
        self.camera.has_torch().await
    }

    pub async fn available_cameras(&self) -> Vec<String> {
        self.camera.available_cameras().await
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }

        let Some(handle) = self.core.inner.lock().camera.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(handle = handle.id(), "Releasing camera of dropped session");
                let camera = self.camera.clone();
                runtime.spawn(async move { camera.release(handle).await });
            }
            Err(_) => warn!(
                handle = handle.id(),
                "Scan session dropped outside a runtime with camera still bound"
            ),
        }
    }
}
