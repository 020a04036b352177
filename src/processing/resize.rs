//! Proportional resize and softening of the cleaned mark

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

/// Gaussian blur sigma that rounds off the thresholded edges
pub const BLUR_SIGMA: f32 = 0.35;

/// Brightness multiplier applied after the blur
pub const BRIGHTNESS_FACTOR: f32 = 0.92;

/// Contrast multiplier applied after the brightness pass (1.0 leaves the image untouched)
pub const SOFTEN_CONTRAST_FACTOR: f32 = 1.0;

/// Scale `mark` uniformly to fit `max_width` x `max_height`, then soften it
///
/// The scale factor is `min(max_width / w, max_height / h)`, so aspect ratio
/// is kept and the result never exceeds the box. Output size is
/// `round(w * scale) x round(h * scale)`, at least one pixel per side.
#[instrument(skip(mark), fields(width = mark.width(), height = mark.height()))]
pub fn fit_and_soften(mark: &RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (width, height) = fitted_dimensions(mark.width(), mark.height(), max_width, max_height);
    debug!(target_width = width, target_height = height, "Resizing mark");

    let resized = imageops::resize(mark, width, height, FilterType::CatmullRom);
    let blurred = soften_edges(&resized, BLUR_SIGMA);
    let brightened = scale_brightness(&blurred, BRIGHTNESS_FACTOR);
    if (SOFTEN_CONTRAST_FACTOR - 1.0).abs() > f32::EPSILON {
        return super::cleanup::adjust_contrast(&brightened, SOFTEN_CONTRAST_FACTOR);
    }
    brightened
}

/// Target dimensions for a uniform fit into `max_width` x `max_height`
#[must_use]
pub fn fitted_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = (f64::from(max_width) / f64::from(width)).min(f64::from(max_height) / f64::from(height));
    let fit = |side: u32, limit: u32| ((f64::from(side) * scale).round() as u32).clamp(1, limit.max(1));
    (fit(width, max_width), fit(height, max_height))
}

/// Gaussian blur with sub-pixel precision kept until the final rounding
///
/// Blurring the `u8` buffer directly truncates each pass, which leaves solid
/// ink interiors at alpha 254 instead of 255.
pub fn soften_edges(image: &RgbaImage, sigma: f32) -> RgbaImage {
    let float = DynamicImage::ImageRgba8(image.clone()).into_rgba32f();
    let blurred = gaussian_blur_f32(&float, sigma);
    DynamicImage::ImageRgba32F(blurred).into_rgba8()
}

/// Scale the color channels toward black by `factor`; alpha is kept
pub fn scale_brightness(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (f32::from(*channel) * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
