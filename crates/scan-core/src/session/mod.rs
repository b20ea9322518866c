//! Scan session management
//!
//! This module owns the camera scanning lifecycle: start, pause, resume and
//! stop, the per-detection acceptance policy (format filter, duplicate
//! suppression, scan cap) and exactly-once delivery of the terminal result.

mod controller;

pub use controller::ScanSession;

use std::collections::HashSet;

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::models::ScanResult;

/// Mutable state of one scanning session
///
/// Reset on every `start`, cleared by `stop`. After a terminal result the
/// session is inactive but the state stays readable until then.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_active: bool,
    pub is_paused: bool,
    /// Payloads accepted so far (multi-scan only)
    pub seen_payloads: HashSet<String>,
    pub accepted_count: u32,
}

impl SessionState {
    fn activated() -> Self {
        Self {
            is_active: true,
            ..Default::default()
        }
    }
}

/// Terminal result of a started session
///
/// Resolves exactly once: with the accepted result, or with `None` when the
/// camera could not be acquired, the session timed out or was stopped.
#[derive(Debug)]
pub struct PendingScan {
    session_id: Uuid,
    rx: oneshot::Receiver<Option<ScanResult>>,
}

impl PendingScan {
    pub(crate) fn new(session_id: Uuid, rx: oneshot::Receiver<Option<ScanResult>>) -> Self {
        Self { session_id, rx }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Wait for the session to end
    pub async fn wait(self) -> Option<ScanResult> {
        self.rx.await.ok().flatten()
    }

    /// Non-blocking check; `None` while the session is still running
    pub fn try_outcome(&mut self) -> Option<Option<ScanResult>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(None),
        }
    }
}
