//! scan-core - Portable scan session core for barcode scanning
//!
//! This crate holds the logic both platform halves of the scanner plugin
//! share: the scan option model, format-name normalization, the scan session
//! controller and the result normalizer. Platform code only implements the
//! capability traits in [`provider`] against its native SDK.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScanSession                             │
//! │  start / pause / resume / stop / on_detections              │
//! │                                                             │
//! │  ┌───────────────┐  ┌───────────────┐  ┌─────────────────┐  │
//! │  │ScanConfig     │  │SessionState   │  │PendingScan      │  │
//! │  │ (options)     │  │ (dedup/count) │  │ (oneshot)       │  │
//! │  └───────────────┘  └───────────────┘  └─────────────────┘  │
//! │                          │                                  │
//! │                    ┌─────┴─────┐                            │
//! │                    │normalizer │                            │
//! │                    │(vendor ->)│                            │
//! │                    └─────┬─────┘                            │
//! │                          │                                  │
//! │      ┌───────────────────┼────────────────────┐             │
//! │      │CameraProvider     │StaticDecoder       │Feedback     │
//! │      │(ML Kit / Vision)  │(vendor decode)     │Provider     │
//! │      └───────────────────┴────────────────────┘             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod scanner;
pub mod session;

pub use config::{
    CameraFacing, CameraRequest, CameraResolution, FeedbackConfig, ScanConfiguration,
};
pub use error::{CameraError, ConfigError, DecodeError, FeedbackError, UnknownFormatTag};
pub use models::*;
pub use provider::{
    CameraHandle, CameraProvider, CameraStream, FeedbackProvider, Frame, NoFeedback,
    StaticDecoder,
};
pub use scanner::StaticScanner;
pub use session::{PendingScan, ScanSession, SessionState};
