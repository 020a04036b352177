//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use sigstamp::{BackgroundRemover, StampConfig, StampError};
use std::io::Cursor;

/// 200x100 cutout holding one 100x20 ink stroke at (50, 40)
pub fn signature_cutout() -> RgbaImage {
    RgbaImage::from_fn(200, 100, |x, y| {
        if (50..150).contains(&x) && (40..60).contains(&y) {
            Rgba([20, 20, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Cutout with nothing left after thresholding
pub fn faint_cutout() -> RgbaImage {
    RgbaImage::from_pixel(120, 60, Rgba([0, 0, 0, 5]))
}

pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// Configuration that never touches the file system for fonts
pub fn builtin_font_config() -> StampConfig {
    StampConfig::builder().font_path(None::<&str>).build().unwrap()
}

/// Remover that always answers with the same cutout
pub struct MockRemover {
    cutout: RgbaImage,
}

impl MockRemover {
    pub fn new(cutout: RgbaImage) -> Self {
        Self { cutout }
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove_background(&self, _image_bytes: &[u8]) -> sigstamp::Result<RgbaImage> {
        Ok(self.cutout.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Remover standing in for an unreachable provider
pub struct FailingRemover;

#[async_trait]
impl BackgroundRemover for FailingRemover {
    async fn remove_background(&self, _image_bytes: &[u8]) -> sigstamp::Result<RgbaImage> {
        Err(StampError::segmentation_failed(Some(503), "HTTP 503 Service Unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// True when any channel is darker than mid grey
pub fn is_dark(pixel: &image::Rgb<u8>) -> bool {
    pixel.0.iter().any(|&c| c < 128)
}
