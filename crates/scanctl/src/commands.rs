//! Command implementations for scanctl

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scan_channel::{AlwaysGranted, ScanChannel};
use scan_core::provider::mock::{MockCamera, ScriptedDecoder};
use scan_core::{
    DecodeError, FeedbackError, FeedbackProvider, NoFeedback, ScanConfiguration, ScanSession,
    StaticScanner,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::script::{FrameScript, ScriptFrame};

/// Feedback that only logs; a terminal has no vibrator
struct LogFeedback;

impl FeedbackProvider for LogFeedback {
    fn beep(&self) -> Result<(), FeedbackError> {
        info!("beep");
        Ok(())
    }

    fn vibrate(&self) -> Result<(), FeedbackError> {
        info!("vibrate");
        Ok(())
    }
}

fn channel(
    camera: Arc<MockCamera>,
    decoder: Arc<ScriptedDecoder>,
    feedback: Arc<dyn FeedbackProvider>,
) -> ScanChannel {
    let session = Arc::new(ScanSession::new(camera, feedback));
    ScanChannel::new(session, StaticScanner::new(decoder), Arc::new(AlwaysGranted))
}

/// Replay a frame script through a camera scan
///
/// Frames are delivered in order until the session stops taking them. If
/// no result arrives within `grace` after the last frame the session is
/// stopped, which yields `null`.
pub async fn replay(
    script: &FrameScript,
    config: &ScanConfiguration,
    grace: Duration,
) -> Result<Value> {
    let camera = Arc::new(MockCamera::new());
    let channel = channel(
        camera.clone(),
        Arc::new(ScriptedDecoder::new()),
        Arc::new(LogFeedback),
    );
    let args = serde_json::to_value(config).context("Failed to encode scan configuration")?;

    let mut call = {
        let channel = channel.clone();
        tokio::spawn(async move { channel.handle("scanWithCamera", &args).await })
    };

    while !camera.is_acquired() && !call.is_finished() {
        tokio::task::yield_now().await;
    }

    for (index, frame) in script.frames.iter().enumerate() {
        let delivered = match frame {
            ScriptFrame::Detections { barcodes } => camera.send_frame(barcodes.clone()).await,
            ScriptFrame::Failure { error } => {
                camera
                    .send_decode_error(DecodeError::Failed(error.clone()))
                    .await
            }
        };
        if !delivered {
            debug!(frame = index, "Session no longer takes frames");
            break;
        }
    }

    let outcome = match tokio::time::timeout(grace, &mut call).await {
        Ok(joined) => joined,
        Err(_) => {
            info!("No result after last frame, stopping scanner");
            channel.handle("stopScanner", &Value::Null).await?;
            call.await
        }
    };
    let value = outcome.context("Scan task failed")??;

    channel.handle("stopScanner", &Value::Null).await?;
    Ok(value)
}

/// Scan an image file, answering with the fixture's detections
pub async fn image(
    path: &Path,
    fixture: Vec<scan_core::RawBarcode>,
    config: &ScanConfiguration,
) -> Result<Value> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image: {}", path.display()))?;

    let decoder = Arc::new(ScriptedDecoder::new());
    decoder.add_response(bytes, fixture);
    // Static scans never fire feedback
    let channel = channel(Arc::new(MockCamera::new()), decoder, Arc::new(NoFeedback));

    let mut args = serde_json::to_value(config).context("Failed to encode scan configuration")?;
    if let Value::Object(map) = &mut args {
        map.insert(
            "imagePath".to_string(),
            Value::String(path.display().to_string()),
        );
    }

    Ok(channel.handle("scanFromImage", &args).await?)
}

/// Formats this scanner can report
pub async fn formats() -> Result<Value> {
    let channel = channel(
        Arc::new(MockCamera::new()),
        Arc::new(ScriptedDecoder::new()),
        Arc::new(NoFeedback),
    );
    Ok(channel.handle("getSupportedFormats", &Value::Null).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scan_core::{RawBarcode, VendorFormat};
    use serde_json::json;
    use std::io::Write;

    fn frame(values: &[&str]) -> ScriptFrame {
        ScriptFrame::Detections {
            barcodes: values
                .iter()
                .map(|v| RawBarcode::new(*v, VendorFormat::MlKit(256)))
                .collect(),
        }
    }

    fn script(frames: Vec<ScriptFrame>) -> FrameScript {
        FrameScript {
            config: None,
            frames,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_single_scan() {
        let frames = script(vec![
            frame(&[]),
            ScriptFrame::Failure {
                error: "blur".to_string(),
            },
            frame(&["first"]),
            frame(&["second"]),
        ]);

        let value = replay(
            &frames,
            &ScanConfiguration::default(),
            Duration::from_millis(200),
        )
        .await
        .unwrap();
        assert_eq!(value["data"], "first");
        assert_eq!(value["format"], "QR_CODE");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_multi_scan_threshold() {
        let config = ScanConfiguration::from_args(&json!({ "multiScan": true, "maxScans": 2 }));
        let frames = script(vec![frame(&["a", "a"]), frame(&["a", "b", "c"])]);

        let value = replay(&frames, &config, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(value["data"], "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_without_match_yields_null() {
        let config = ScanConfiguration::from_args(&json!({ "formats": ["EAN_8"] }));
        let frames = script(vec![frame(&["qr only"])]);

        let value = replay(&frames, &config, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_keeps_rejecting_filter() {
        let config = ScanConfiguration::from_args(&json!({ "formats": ["RSS_14"] }));
        let frames = script(vec![frame(&["qr"]), frame(&["another"])]);

        let value = replay(&frames, &config, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_image_with_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fixture").unwrap();

        let value = image(
            file.path(),
            vec![
                RawBarcode::new("one", VendorFormat::MlKit(256)),
                RawBarcode::new("", VendorFormat::MlKit(256)),
                RawBarcode::new("one", VendorFormat::MlKit(256)),
            ],
            &ScanConfiguration::default(),
        )
        .await
        .unwrap();

        // Static scans drop empty payloads but keep duplicates
        let list = value.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["data"], "one");
    }

    #[tokio::test]
    async fn test_formats() {
        let value = formats().await.unwrap();
        assert_eq!(value.as_array().unwrap().len(), 13);
    }
}
