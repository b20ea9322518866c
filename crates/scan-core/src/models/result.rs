//! Platform-neutral detection and result records

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FormatTag;

/// A point in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    pub x: f64,
    pub y: f64,
}

impl ScanPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One normalized detection, consumed immediately by the session controller
#[derive(Debug, Clone, PartialEq)]
pub struct ScanDetection {
    pub payload: String,
    pub format: FormatTag,
    /// Either empty or four corners in TL, TR, BR, BL order
    pub corner_points: Vec<ScanPoint>,
    pub metadata: Map<String, Value>,
}

impl ScanDetection {
    pub fn new(payload: impl Into<String>, format: FormatTag) -> Self {
        Self {
            payload: payload.into(),
            format,
            corner_points: Vec::new(),
            metadata: Map::new(),
        }
    }
}

/// Serializable snapshot of a detection, returned across the host boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub data: String,
    pub format: FormatTag,
    /// Capture time in milliseconds since the Unix epoch
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,
    #[serde(default)]
    pub corner_points: Vec<ScanPoint>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ScanResult {
    /// Snapshot a detection with an explicit capture time
    pub fn from_detection(detection: ScanDetection, timestamp_millis: i64) -> Self {
        Self {
            data: detection.payload,
            format: detection.format,
            timestamp_millis,
            corner_points: detection.corner_points,
            metadata: detection.metadata,
        }
    }

    /// Snapshot a detection stamped with the current time
    pub fn capture(detection: ScanDetection) -> Self {
        Self::from_detection(detection, Utc::now().timestamp_millis())
    }
}
