//! Method dispatch tests against mock providers

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use scan_channel::{AlwaysGranted, ChannelError, PermissionGate, ScanChannel};
use scan_core::provider::mock::{MockCamera, RecordingFeedback, ScriptedDecoder};
use scan_core::{BarcodeValue, RawBarcode, ScanResult, ScanSession, StaticScanner, VendorFormat};
use serde_json::{json, Value};

struct Denied;

#[async_trait]
impl PermissionGate for Denied {
    async fn has_camera_permission(&self) -> bool {
        false
    }
}

struct Fixture {
    channel: ScanChannel,
    camera: Arc<MockCamera>,
    decoder: Arc<ScriptedDecoder>,
}

fn fixture(permissions: Arc<dyn PermissionGate>) -> Fixture {
    let camera = Arc::new(MockCamera::new());
    let decoder = Arc::new(ScriptedDecoder::new());
    let session = Arc::new(ScanSession::new(
        camera.clone(),
        Arc::new(RecordingFeedback::new()),
    ));
    let channel = ScanChannel::new(session, StaticScanner::new(decoder.clone()), permissions);
    Fixture {
        channel,
        camera,
        decoder,
    }
}

async fn wait_until_scanning(channel: &ScanChannel) {
    while !channel.session().is_active() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_scan_with_camera_returns_result_map() {
    let fx = fixture(Arc::new(AlwaysGranted));
    let channel = fx.channel.clone();
    let call = tokio::spawn(async move {
        channel
            .handle("scanWithCamera", &json!({ "formats": ["QR_CODE"] }))
            .await
    });

    wait_until_scanning(&fx.channel).await;
    let raw = RawBarcode::new("WIFI:S:lab;;", VendorFormat::MlKit(256))
        .with_corners([(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)])
        .with_value(BarcodeValue::Wifi {
            ssid: Some("lab".to_string()),
            password: None,
            encryption_type: 1,
        });
    assert!(fx.camera.send_frame(vec![raw]).await);

    let value = call.await.unwrap().unwrap();
    assert_eq!(value["data"], "WIFI:S:lab;;");
    assert_eq!(value["format"], "QR_CODE");
    assert_eq!(value["metadata"]["wifi"]["password"], "");

    // The host data format decodes back into the same result
    let decoded: ScanResult = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(serde_json::to_value(&decoded).unwrap(), value);
}

#[tokio::test]
async fn test_stop_scanner_resolves_camera_call_with_null() {
    let fx = fixture(Arc::new(AlwaysGranted));
    let channel = fx.channel.clone();
    let call = tokio::spawn(async move { channel.handle("scanWithCamera", &json!({})).await });

    wait_until_scanning(&fx.channel).await;
    assert_eq!(
        fx.channel.handle("pauseScanner", &Value::Null).await,
        Ok(Value::Null)
    );
    assert!(fx.channel.session().state().is_paused);
    fx.channel.handle("resumeScanner", &Value::Null).await.unwrap();
    fx.channel.handle("stopScanner", &Value::Null).await.unwrap();
    fx.channel.handle("stopScanner", &Value::Null).await.unwrap();

    assert_eq!(call.await.unwrap(), Ok(Value::Null));
    assert!(!fx.camera.is_acquired());
}

#[tokio::test]
async fn test_camera_unavailable_returns_null() {
    let fx = fixture(Arc::new(AlwaysGranted));
    fx.camera.set_available(false);

    let value = fx.channel.handle("scanWithCamera", &json!({})).await;
    assert_eq!(value, Ok(Value::Null));
}

#[tokio::test]
async fn test_permission_denied() {
    let fx = fixture(Arc::new(Denied));
    let err = fx
        .channel
        .handle("scanWithCamera", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, ChannelError::PermissionDenied);
    assert_eq!(fx.camera.acquisition_count(), 0);

    assert_eq!(
        fx.channel.handle("hasCameraPermission", &Value::Null).await,
        Ok(Value::Bool(false))
    );
    assert_eq!(
        fx.channel.handle("requestCameraPermission", &Value::Null).await,
        Ok(Value::Bool(false))
    );
}

#[tokio::test]
async fn test_permission_queries_when_granted() {
    let fx = fixture(Arc::new(AlwaysGranted));
    assert_eq!(
        fx.channel.handle("hasCameraPermission", &Value::Null).await,
        Ok(Value::Bool(true))
    );
    assert_eq!(
        fx.channel.handle("requestCameraPermission", &json!({})).await,
        Ok(Value::Bool(true))
    );
}

#[tokio::test]
async fn test_has_flash() {
    let fx = fixture(Arc::new(AlwaysGranted));
    assert_eq!(
        fx.channel.handle("hasFlash", &Value::Null).await,
        Ok(Value::Bool(true))
    );

    fx.camera.set_has_torch(false);
    assert_eq!(
        fx.channel.handle("hasFlash", &Value::Null).await,
        Ok(Value::Bool(false))
    );
}

#[tokio::test]
async fn test_available_cameras() {
    let fx = fixture(Arc::new(AlwaysGranted));
    assert_eq!(
        fx.channel.handle("getAvailableCameras", &Value::Null).await,
        Ok(json!(["0", "1"]))
    );

    fx.camera.set_cameras(vec!["back-wide".to_string()]);
    assert_eq!(
        fx.channel.handle("getAvailableCameras", &Value::Null).await,
        Ok(json!(["back-wide"]))
    );

    fx.camera.set_available(false);
    assert_eq!(
        fx.channel.handle("getAvailableCameras", &Value::Null).await,
        Ok(json!([]))
    );
}

#[tokio::test]
async fn test_platform_version() {
    let fx = fixture(Arc::new(AlwaysGranted));
    assert_eq!(
        fx.channel.handle("getPlatformVersion", &Value::Null).await,
        Ok(Value::String(std::env::consts::OS.to_string()))
    );

    let channel = fx.channel.clone().with_platform_version("Android 14");
    assert_eq!(
        channel.handle("getPlatformVersion", &Value::Null).await,
        Ok(json!("Android 14"))
    );
}

#[tokio::test]
async fn test_scan_from_bytes() {
    let fx = fixture(Arc::new(AlwaysGranted));
    fx.decoder.add_response(
        vec![1, 2, 3],
        vec![
            RawBarcode::new("a", VendorFormat::MlKit(256)),
            RawBarcode::new("b", VendorFormat::MlKit(32)),
        ],
    );

    let value = fx
        .channel
        .handle("scanFromBytes", &json!({ "imageBytes": [1, 2, 3] }))
        .await
        .unwrap();
    let list = value.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1]["format"], "EAN_13");

    let filtered = fx
        .channel
        .handle(
            "scanFromBytes",
            &json!({ "imageBytes": [1, 2, 3], "formats": ["EAN_13"] }),
        )
        .await
        .unwrap();
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let undecodable = fx
        .channel
        .handle("scanFromBytes", &json!({ "imageBytes": [9] }))
        .await
        .unwrap();
    assert_eq!(undecodable, json!([]));
}

#[tokio::test]
async fn test_scan_from_image() {
    let fx = fixture(Arc::new(AlwaysGranted));
    fx.decoder.add_response(
        b"image".to_vec(),
        vec![RawBarcode::new("file", VendorFormat::MlKit(4096))],
    );
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"image").unwrap();

    let value = fx
        .channel
        .handle(
            "scanFromImage",
            &json!({ "imagePath": file.path().to_str().unwrap() }),
        )
        .await
        .unwrap();
    assert_eq!(value[0]["format"], "AZTEC");

    let missing = fx
        .channel
        .handle("scanFromImage", &json!({ "imagePath": "/nonexistent.png" }))
        .await
        .unwrap();
    assert_eq!(missing, json!([]));

    let err = fx
        .channel
        .handle("scanFromImage", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_toggle_flash() {
    let fx = fixture(Arc::new(AlwaysGranted));
    // Without a bound camera the call is a no-op
    assert_eq!(
        fx.channel
            .handle("toggleFlash", &json!({ "enable": true }))
            .await,
        Ok(Value::Null)
    );

    let channel = fx.channel.clone();
    let call = tokio::spawn(async move { channel.handle("scanWithCamera", &json!({})).await });
    wait_until_scanning(&fx.channel).await;
    while !fx.camera.is_acquired() {
        tokio::task::yield_now().await;
    }

    fx.channel
        .handle("toggleFlash", &json!({ "enable": true }))
        .await
        .unwrap();
    assert!(fx.camera.torch_enabled());

    fx.camera.set_has_torch(false);
    let err = fx
        .channel
        .handle("toggleFlash", &json!({ "enable": false }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CAMERA_ERROR");

    fx.channel.handle("stopScanner", &Value::Null).await.unwrap();
    assert_eq!(call.await.unwrap(), Ok(Value::Null));
}

#[tokio::test]
async fn test_unknown_method() {
    let fx = fixture(Arc::new(AlwaysGranted));
    let err = fx
        .channel
        .handle("generateQrCode", &json!({ "data": "x" }))
        .await
        .unwrap_err();
    assert_eq!(err, ChannelError::NotImplemented("generateQrCode".to_string()));
}
