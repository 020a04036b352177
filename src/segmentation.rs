//! Background removal through an external segmentation service
//!
//! The pipeline only depends on the [`BackgroundRemover`] trait; [`RembgClient`]
//! is the HTTP implementation that uploads the photo and decodes the returned
//! transparent-background cutout.

use crate::config::SegmentationConfig;
use crate::error::{Result, StampError};
use async_trait::async_trait;
use image::RgbaImage;
use reqwest::{multipart, Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Multipart field holding the uploaded image
pub const IMAGE_FIELD: &str = "image";

/// Capability that turns a photo into a transparent-background cutout
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background from encoded image bytes
    ///
    /// # Errors
    /// - `SegmentationFailed` when the provider rejects the request or is unreachable
    /// - `Image` when the returned cutout cannot be decoded
    async fn remove_background(&self, image_bytes: &[u8]) -> Result<RgbaImage>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Client for the rembg-compatible HTTP segmentation API
#[derive(Debug, Clone)]
pub struct RembgClient {
    client: Client,
    config: SegmentationConfig,
}

impl RembgClient {
    /// Create a client from explicit configuration
    ///
    /// # Errors
    /// - Empty API key
    /// - Failed to create HTTP client
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(StampError::invalid_config(
                "segmentation API key is not set (use --api-key or REMBG_API_KEY)",
            ));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            StampError::invalid_config(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl BackgroundRemover for RembgClient {
    #[instrument(skip(self, image_bytes), fields(bytes = image_bytes.len(), endpoint = %self.config.endpoint))]
    async fn remove_background(&self, image_bytes: &[u8]) -> Result<RgbaImage> {
        let part = multipart::Part::bytes(image_bytes.to_vec()).file_name(IMAGE_FIELD);
        let form = multipart::Form::new().part(IMAGE_FIELD, part);

        let start = instant::Instant::now();
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(API_KEY_HEADER, &self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("Segmentation request failed: {}", e);
                StampError::segmentation_failed(None, e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            // Body is error detail here, never a cutout.
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Segmentation service rejected request");
            let detail = if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body.trim())
            };
            return Err(StampError::segmentation_failed(
                Some(status.as_u16()),
                detail,
            ));
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| StampError::segmentation_failed(Some(status.as_u16()), e.to_string()))?;
        debug!(
            payload_bytes = payload.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Cutout received"
        );

        let cutout = image::load_from_memory(&payload)?.to_rgba8();
        info!(
            width = cutout.width(),
            height = cutout.height(),
            "Background removed"
        );
        Ok(cutout)
    }

    fn name(&self) -> &str {
        "rembg"
    }
}
