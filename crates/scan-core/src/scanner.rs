//! One-shot scanning of still images
//!
//! Stateless: one decode pass, every detection that passes the format filter
//! is returned. No deduplication, no termination policy, and no interaction
//! with a running camera session.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ScanConfiguration;
use crate::models::ScanResult;
use crate::normalizer;
use crate::provider::StaticDecoder;

/// Scans encoded images through a [`StaticDecoder`]
#[derive(Clone)]
pub struct StaticScanner {
    decoder: Arc<dyn StaticDecoder>,
}

impl StaticScanner {
    pub fn new(decoder: Arc<dyn StaticDecoder>) -> Self {
        Self { decoder }
    }

    /// Scan an encoded image held in memory
    ///
    /// Decode failures yield an empty list.
    pub async fn scan_from_bytes(
        &self,
        image: &[u8],
        config: &ScanConfiguration,
    ) -> Vec<ScanResult> {
        let barcodes = match self.decoder.decode(image).await {
            Ok(barcodes) => barcodes,
            Err(e) => {
                warn!(error = %e, bytes = image.len(), "Static decode failed");
                return Vec::new();
            }
        };

        let results: Vec<ScanResult> = barcodes
            .iter()
            .map(normalizer::normalize)
            .filter(|d| !d.payload.is_empty() && config.formats.allows(d.format))
            .map(ScanResult::capture)
            .collect();

        debug!(
            found = barcodes.len(),
            returned = results.len(),
            "Static scan complete"
        );
        results
    }

    /// Scan an image file
    ///
    /// A missing or unreadable file yields an empty list.
    pub async fn scan_from_image_path(
        &self,
        path: impl AsRef<Path>,
        config: &ScanConfiguration,
    ) -> Vec<ScanResult> {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(image) => self.scan_from_bytes(&image, config).await,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read image");
                Vec::new()
            }
        }
    }
}
