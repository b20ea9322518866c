//! scan-channel - Host method-call dispatcher
//!
//! Accepts named operations with a loosely-typed JSON argument bag, routes
//! them to the scan core and answers with JSON or a `(code, message)` error.
//!
//! | method                | arguments                      | result                  |
//! |-----------------------|--------------------------------|-------------------------|
//! | `scanWithCamera`      | scan options                   | `ScanResult` or `null`  |
//! | `scanFromImage`       | `imagePath` + scan options     | list of `ScanResult`    |
//! | `scanFromBytes`       | `imageBytes` + scan options    | list of `ScanResult`    |
//! | `getSupportedFormats` | -                              | list of format tags     |
//! | `hasCameraPermission` | -                              | bool                    |
//! | `requestCameraPermission` | -                          | bool                    |
//! | `hasFlash`            | -                              | bool                    |
//! | `getAvailableCameras` | -                              | list of camera ids      |
//! | `getPlatformVersion`  | -                              | string                  |
//! | `toggleFlash`         | `enable`                       | `null`                  |
//! | `pauseScanner`        | -                              | `null`                  |
//! | `resumeScanner`       | -                              | `null`                  |
//! | `stopScanner`         | -                              | `null`                  |

mod error;

pub use error::{ChannelError, ChannelResult};

use std::sync::Arc;

use async_trait::async_trait;
use scan_core::{FormatTag, ScanConfiguration, ScanSession, StaticScanner};
use serde_json::Value;
use tracing::{debug, info};

/// Camera permission check, supplied by the platform
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn has_camera_permission(&self) -> bool;

    /// Ask the user for camera access; platforms without a prompt just
    /// report the current state
    async fn request_camera_permission(&self) -> bool {
        self.has_camera_permission().await
    }
}

/// Permission gate that always grants access
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

#[async_trait]
impl PermissionGate for AlwaysGranted {
    async fn has_camera_permission(&self) -> bool {
        true
    }
}

/// Routes host method calls to the scan core
#[derive(Clone)]
pub struct ScanChannel {
    session: Arc<ScanSession>,
    scanner: StaticScanner,
    permissions: Arc<dyn PermissionGate>,
    platform_version: String,
}

impl ScanChannel {
    pub fn new(
        session: Arc<ScanSession>,
        scanner: StaticScanner,
        permissions: Arc<dyn PermissionGate>,
    ) -> Self {
        Self {
            session,
            scanner,
            permissions,
            platform_version: std::env::consts::OS.to_string(),
        }
    }

    /// Override the string answered to `getPlatformVersion`
    pub fn with_platform_version(mut self, version: impl Into<String>) -> Self {
        self.platform_version = version.into();
        self
    }

    pub fn session(&self) -> &Arc<ScanSession> {
        &self.session
    }

    /// Handle one method call
    ///
    /// `scanWithCamera` completes only when the session ends, so control
    /// calls for it must be issued concurrently.
    pub async fn handle(&self, method: &str, args: &Value) -> ChannelResult<Value> {
        debug!(method, "Handling method call");
        match method {
            "scanWithCamera" => self.scan_with_camera(args).await,
            "scanFromImage" => self.scan_from_image(args).await,
            "scanFromBytes" => self.scan_from_bytes(args).await,
            "getSupportedFormats" => Ok(supported_formats()),
            "getPlatformVersion" => Ok(Value::String(self.platform_version.clone())),
            "hasCameraPermission" => Ok(Value::Bool(
                self.permissions.has_camera_permission().await,
            )),
            "requestCameraPermission" => Ok(Value::Bool(
                self.permissions.request_camera_permission().await,
            )),
            "hasFlash" => Ok(Value::Bool(self.session.has_torch().await)),
            "getAvailableCameras" => to_json(&self.session.available_cameras().await),
            "toggleFlash" => {
                let enable = args.get("enable").and_then(Value::as_bool).unwrap_or(false);
                self.session.set_torch(enable).await?;
                Ok(Value::Null)
            }
            "pauseScanner" => {
                self.session.pause();
                Ok(Value::Null)
            }
            "resumeScanner" => {
                self.session.resume();
                Ok(Value::Null)
            }
            "stopScanner" => {
                self.session.stop().await;
                Ok(Value::Null)
            }
            other => Err(ChannelError::NotImplemented(other.to_string())),
        }
    }

    async fn scan_with_camera(&self, args: &Value) -> ChannelResult<Value> {
        if !self.permissions.has_camera_permission().await {
            return Err(ChannelError::PermissionDenied);
        }

        let config = ScanConfiguration::from_args(args);
        let pending = self.session.start(config).await;
        let session_id = pending.session_id();

        match pending.wait().await {
            Some(result) => {
                info!(%session_id, format = %result.format, "Camera scan returned a result");
                to_json(&result)
            }
            None => {
                info!(%session_id, "Camera scan returned no result");
                Ok(Value::Null)
            }
        }
    }

    async fn scan_from_image(&self, args: &Value) -> ChannelResult<Value> {
        let path = args
            .get("imagePath")
            .and_then(Value::as_str)
            .ok_or_else(|| ChannelError::InvalidArgument("imagePath".to_string()))?;
        let config = ScanConfiguration::from_args(args);

        let results = self.scanner.scan_from_image_path(path, &config).await;
        to_json(&results)
    }

    async fn scan_from_bytes(&self, args: &Value) -> ChannelResult<Value> {
        let image = image_bytes(args)?;
        let config = ScanConfiguration::from_args(args);

        let results = self.scanner.scan_from_bytes(&image, &config).await;
        to_json(&results)
    }
}

/// Canonical format tags a scanner can report
pub fn supported_formats() -> Value {
    Value::Array(
        FormatTag::SUPPORTED
            .iter()
            .map(|tag| Value::String(tag.as_str().to_string()))
            .collect(),
    )
}

fn image_bytes(args: &Value) -> ChannelResult<Vec<u8>> {
    let list = args
        .get("imageBytes")
        .and_then(Value::as_array)
        .ok_or_else(|| ChannelError::InvalidArgument("imageBytes".to_string()))?;

    list.iter()
        .map(|v| {
            v.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| ChannelError::InvalidArgument(format!("imageBytes: {}", v)))
        })
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T) -> ChannelResult<Value> {
    serde_json::to_value(value).map_err(|e| ChannelError::Scan(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_supported_formats_exclude_unknown() {
        let formats = supported_formats();
        let list = formats.as_array().unwrap();
        assert_eq!(list.len(), 13);
        assert_eq!(list[0], "QR_CODE");
        assert!(!list.contains(&json!("UNKNOWN")));
    }

    #[test]
    fn test_image_bytes_parsing() {
        assert_eq!(
            image_bytes(&json!({ "imageBytes": [0, 127, 255] })).unwrap(),
            vec![0, 127, 255]
        );
        assert!(matches!(
            image_bytes(&json!({ "imageBytes": [256] })),
            Err(ChannelError::InvalidArgument(_))
        ));
        assert!(matches!(
            image_bytes(&json!({})),
            Err(ChannelError::InvalidArgument(_))
        ));
    }
}
