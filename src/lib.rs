#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # sigstamp
//!
//! Turns a photographed or scanned handwritten signature into a print-ready
//! signature stamp: a 480x120 white canvas holding a clean black signature mark
//! above a centered caption (name, registration ID, optional free text).
//!
//! ## Pipeline
//!
//! 1. **Segmentation**: the photo is sent to an external background-removal
//!    service behind the [`BackgroundRemover`] trait ([`RembgClient`] by default).
//! 2. **Cleanup**: [`processing::clean_mark`] thresholds the cutout into a
//!    hard-edged pure black mark and crops it with a small margin.
//! 3. **Composition**: [`processing::compose`] fits and softens the mark, lays
//!    out the caption, and paints both onto the canvas.
//!
//! Every stage returns a new image; nothing is cached or shared between requests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sigstamp::{generate_signature_stamp, services::StampIOService, StampConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = StampConfig::builder()
//!     .api_key(std::env::var("REMBG_API_KEY")?)
//!     .build()?;
//! let photo = StampIOService::read_source("signature.jpg")?;
//! let stamp = generate_signature_stamp(&photo, "Dr. Ana Lima", "12345-SP", None, &config).await?;
//! StampIOService::save_stamp(&stamp, "stamp.png", config.dpi)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line front end and tracing subscriber setup
//! - `web` (default): HTTP form front end served by `sigstamp --serve`
//! - `webp-support` (default): WebP input support

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod encoders;
pub mod error;
pub mod processing;
pub mod segmentation;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
#[cfg(feature = "web")]
pub mod web;

use image::{RgbImage, RgbaImage};
use std::sync::Arc;
use tracing::{info, instrument};

// Public API exports
pub use config::{SegmentationConfig, StampConfig, StampConfigBuilder};
pub use error::{Result, StampError};
pub use processing::{clean_mark, compose, fit_and_soften, CaptionFont};
pub use segmentation::{BackgroundRemover, RembgClient};
pub use types::{BoundingBox, Caption};

#[cfg(feature = "cli")]
pub use tracing_config::{TracingConfig, TracingFormat};

/// Clean a cutout and compose it with `caption`, without any network access
///
/// # Errors
/// - `EmptyMask` when the cutout holds no ink after thresholding
/// - `InfeasibleLayout` when the caption is too tall
pub fn render_stamp(cutout: &RgbaImage, caption: &Caption, font: &CaptionFont) -> Result<RgbImage> {
    let mark = clean_mark(cutout).ok_or(StampError::EmptyMask)?;
    compose(&mark, caption, font)
}

/// Full pipeline bound to one segmentation provider and configuration
///
/// Holds no per-request state, so one stamper can serve concurrent requests.
/// The caption font is loaded once, when the stamper is built.
pub struct SignatureStamper {
    remover: Arc<dyn BackgroundRemover>,
    config: StampConfig,
    font: CaptionFont,
}

impl SignatureStamper {
    #[must_use]
    pub fn new(remover: Arc<dyn BackgroundRemover>, config: StampConfig) -> Self {
        let font = CaptionFont::load(config.font_path.as_deref(), config.font_size);
        Self {
            remover,
            config,
            font,
        }
    }

    /// Stamper using the HTTP segmentation client from `config`
    ///
    /// # Errors
    /// - Invalid configuration (missing API key, bad values)
    pub fn from_config(config: StampConfig) -> Result<Self> {
        config.validate()?;
        let client = RembgClient::new(config.segmentation.clone())?;
        Ok(Self::new(Arc::new(client), config))
    }

    #[must_use]
    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Caption font resolved from the configuration
    #[must_use]
    pub fn font(&self) -> &CaptionFont {
        &self.font
    }

    /// Build the caption for this stamper's registration label
    ///
    /// # Errors
    /// - Empty name or registration
    pub fn caption(&self, name: &str, registration: &str, free_text: Option<&str>) -> Result<Caption> {
        Caption::validated(name, &self.config.registration_label, registration, free_text)
    }

    /// Run segmentation, cleanup and composition for one photo
    ///
    /// # Errors
    /// - `InvalidInput` for empty image bytes
    /// - `SegmentationFailed` / `Image` from the provider
    /// - `EmptyMask`, `InfeasibleLayout` from the pipeline
    #[instrument(skip(self, image_bytes, caption), fields(provider = self.remover.name(), bytes = image_bytes.len()))]
    pub async fn generate(&self, image_bytes: &[u8], caption: &Caption) -> Result<RgbImage> {
        if image_bytes.is_empty() {
            return Err(StampError::invalid_input("image data is empty"));
        }

        let start = instant::Instant::now();
        let cutout = self.remover.remove_background(image_bytes).await?;
        let stamp = render_stamp(&cutout, caption, &self.font)?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Signature stamp generated for {}",
            caption.name()
        );
        Ok(stamp)
    }
}

/// One-call entry point: photo bytes and caption fields in, stamp out
///
/// # Errors
/// - Invalid configuration or caption fields
/// - Any pipeline error from [`SignatureStamper::generate`]
pub async fn generate_signature_stamp(
    image_bytes: &[u8],
    name: &str,
    registration_id: &str,
    caption_line: Option<&str>,
    config: &StampConfig,
) -> Result<RgbImage> {
    let stamper = SignatureStamper::from_config(config.clone())?;
    let caption = stamper.caption(name, registration_id, caption_line)?;
    stamper.generate(image_bytes, &caption).await
}
