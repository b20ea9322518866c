//! Scan configuration
//!
//! A [`ScanConfiguration`] is built once per session, either from a TOML file
//! (serde defaults) or from the loosely-typed argument bag the host passes
//! with a method call ([`ScanConfiguration::from_args`]). Every field has a
//! default, so an empty configuration gives single-scan, all formats,
//! feedback on.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::models::FormatFilter;

/// Configuration for one scanning session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfiguration {
    /// Allowed formats; empty means accept all
    #[serde(default)]
    pub formats: FormatFilter,
    /// Keep scanning after the first accepted code
    #[serde(default)]
    pub multi_scan: bool,
    /// Cap on distinct accepted codes in multi-scan mode (<= 0 is unbounded)
    #[serde(default = "default_max_scans")]
    pub max_scans: i64,
    /// Beep/vibrate on each accepted code
    #[serde(flatten)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub camera_facing: CameraFacing,
    #[serde(default)]
    pub camera_resolution: CameraResolution,
    /// Turn the torch on once the camera is bound
    #[serde(default)]
    pub enable_flash: bool,
    #[serde(default = "default_true")]
    pub auto_focus: bool,
    /// Also look for light-on-dark codes
    #[serde(default)]
    pub detect_inverted: bool,
    /// Only analyse a centred region of the frame
    #[serde(default)]
    pub restrict_scan_area: bool,
    /// Side of the centred region relative to the frame
    #[serde(default = "default_scan_area_ratio")]
    pub scan_area_ratio: f64,
    /// Attach the analysed frame to results
    #[serde(default)]
    pub return_image: bool,
    /// Encoder quality for a returned frame, 0.0 to 1.0
    #[serde(default = "default_image_quality")]
    pub image_quality: f64,
    /// End the session with no result after this many seconds (<= 0 disables)
    #[serde(default)]
    pub timeout_seconds: i64,
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self {
            formats: FormatFilter::Any,
            multi_scan: false,
            max_scans: default_max_scans(),
            feedback: FeedbackConfig::default(),
            camera_facing: CameraFacing::default(),
            camera_resolution: CameraResolution::default(),
            enable_flash: false,
            auto_focus: default_true(),
            detect_inverted: false,
            restrict_scan_area: false,
            scan_area_ratio: default_scan_area_ratio(),
            return_image: false,
            image_quality: default_image_quality(),
            timeout_seconds: 0,
        }
    }
}

fn default_max_scans() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_scan_area_ratio() -> f64 {
    0.7
}

fn default_image_quality() -> f64 {
    0.8
}

impl ScanConfiguration {
    /// Build a configuration from a host argument bag
    ///
    /// Each field is read independently; a missing key or a value of the
    /// wrong type falls back to that field's default. Non-object bags yield
    /// the default configuration.
    pub fn from_args(args: &Value) -> Self {
        let empty = Map::new();
        let args = args.as_object().unwrap_or(&empty);
        let defaults = Self::default();

        let formats = match args.get("formats").and_then(Value::as_array) {
            Some(list) => FormatFilter::from_names(list.iter().filter_map(Value::as_str)),
            None => FormatFilter::Any,
        };

        Self {
            formats,
            multi_scan: bool_arg(args, "multiScan", defaults.multi_scan),
            max_scans: int_arg(args, "maxScans", defaults.max_scans),
            feedback: FeedbackConfig {
                beep: bool_arg(args, "beepOnScan", defaults.feedback.beep),
                vibrate: bool_arg(args, "vibrateOnScan", defaults.feedback.vibrate),
            },
            camera_facing: args
                .get("cameraFacing")
                .and_then(Value::as_str)
                .map(CameraFacing::from_name)
                .unwrap_or_default(),
            camera_resolution: args
                .get("cameraResolution")
                .and_then(Value::as_str)
                .map(CameraResolution::from_name)
                .unwrap_or_default(),
            enable_flash: bool_arg(args, "enableFlash", defaults.enable_flash),
            auto_focus: bool_arg(args, "autoFocus", defaults.auto_focus),
            detect_inverted: bool_arg(args, "detectInverted", defaults.detect_inverted),
            restrict_scan_area: bool_arg(args, "restrictScanArea", defaults.restrict_scan_area),
            scan_area_ratio: float_arg(args, "scanAreaRatio", defaults.scan_area_ratio),
            return_image: bool_arg(args, "returnImage", defaults.return_image),
            image_quality: float_arg(args, "imageQuality", defaults.image_quality),
            timeout_seconds: int_arg(args, "timeoutSeconds", defaults.timeout_seconds),
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The effective cap on accepted codes, if any
    ///
    /// Only multi-scan sessions have one; single-scan always ends on the
    /// first accepted code.
    pub fn scan_limit(&self) -> Option<u32> {
        if self.multi_scan && self.max_scans > 0 {
            Some(u32::try_from(self.max_scans).unwrap_or(u32::MAX))
        } else {
            None
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Selection hints for the camera provider
    pub fn camera_request(&self) -> CameraRequest {
        CameraRequest {
            facing: self.camera_facing,
            resolution: self.camera_resolution,
            auto_focus: self.auto_focus,
            detect_inverted: self.detect_inverted,
            scan_area: self.restrict_scan_area.then_some(self.scan_area_ratio),
            return_image: self.return_image,
            image_quality: self.image_quality,
        }
    }
}

fn bool_arg(args: &Map<String, Value>, key: &str, default: bool) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn int_arg(args: &Map<String, Value>, key: &str, default: i64) -> i64 {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        _ => default,
    }
}

fn float_arg(args: &Map<String, Value>, key: &str, default: f64) -> f64 {
    args.get(key).and_then(Value::as_f64).unwrap_or(default)
}

/// Feedback side effects fired on each accepted code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(rename = "beepOnScan", default = "default_true")]
    pub beep: bool,
    #[serde(rename = "vibrateOnScan", default = "default_true")]
    pub vibrate: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            beep: true,
            vibrate: true,
        }
    }
}

/// Which camera to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    /// Lenient parse; anything but "FRONT" selects the back camera
    pub fn from_name(name: &str) -> Self {
        if name == "FRONT" {
            Self::Front
        } else {
            Self::Back
        }
    }
}

/// Target analysis resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraResolution {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl CameraResolution {
    /// Lenient parse; unknown names select MEDIUM
    pub fn from_name(name: &str) -> Self {
        match name {
            "LOW" => Self::Low,
            "HIGH" => Self::High,
            "VERY_HIGH" => Self::VeryHigh,
            _ => Self::Medium,
        }
    }

    /// Width and height in pixels
    pub fn target_size(&self) -> (u32, u32) {
        match self {
            CameraResolution::Low => (640, 480),
            CameraResolution::Medium => (1280, 720),
            CameraResolution::High => (1920, 1080),
            CameraResolution::VeryHigh => (3840, 2160),
        }
    }
}

/// What the core asks of the camera provider; not interpreted further
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRequest {
    pub facing: CameraFacing,
    pub resolution: CameraResolution,
    pub auto_focus: bool,
    pub detect_inverted: bool,
    /// Relative side of the centred analysis region, when restricted
    pub scan_area: Option<f64>,
    pub return_image: bool,
    pub image_quality: f64,
}
