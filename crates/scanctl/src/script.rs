//! Recorded frame scripts
//!
//! A script is a JSON document holding the frames a camera delivered during
//! one session, in order, plus an optional scan configuration:
//!
//! ```json
//! {
//!   "config": { "multiScan": true, "maxScans": 2 },
//!   "frames": [
//!     { "barcodes": [] },
//!     { "error": "motion blur" },
//!     { "barcodes": [{ "rawValue": "4006381333931", "format": { "vendor": "ml_kit", "value": 32 } }] }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use scan_core::{RawBarcode, ScanConfiguration};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FrameScript {
    #[serde(default)]
    pub config: Option<ScanConfiguration>,
    pub frames: Vec<ScriptFrame>,
}

/// One analysed camera frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptFrame {
    Detections { barcodes: Vec<RawBarcode> },
    Failure { error: String },
}

impl FrameScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read frame script: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse frame script: {}", path.display()))
    }
}

/// Detections a scripted decoder answers with for one image fixture
pub fn load_fixture(path: &Path) -> Result<Vec<RawBarcode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fixture: {}", path.display()))
}
