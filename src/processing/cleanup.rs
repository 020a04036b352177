//! Cutout cleanup: turns a noisy segmentation cutout into a hard-edged black mark

use crate::types::BoundingBox;
use image::{Rgba, RgbaImage};
use tracing::{debug, instrument};

/// Contrast boost applied before thresholding
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Alpha values below this become fully transparent, the rest fully opaque
pub const ALPHA_THRESHOLD: u8 = 25;

/// Transparent margin kept around the ink when cropping
pub const CROP_MARGIN: u32 = 10;

/// 3x3 edge-enhancement kernel and its divisor
const EDGE_ENHANCE_KERNEL: [[f32; 3]; 3] = [[-1.0, -1.0, -1.0], [-1.0, 10.0, -1.0], [-1.0, -1.0, -1.0]];
const EDGE_ENHANCE_SCALE: f32 = 2.0;

/// Clean a cutout into a monochrome mark
///
/// Steps, each over the whole image: contrast x2 around mid-gray on the color
/// channels, edge enhancement, hard alpha threshold, ink forced to pure black,
/// then a crop to the ink bounding box plus [`CROP_MARGIN`]. Alpha is only
/// touched by the edge filter, so inside flat strokes the threshold sees the
/// cutout's own alpha.
///
/// Returns `None` when nothing survives thresholding.
#[instrument(skip(cutout), fields(width = cutout.width(), height = cutout.height()))]
pub fn clean_mark(cutout: &RgbaImage) -> Option<RgbaImage> {
    let contrasted = adjust_contrast(cutout, CONTRAST_FACTOR);
    let sharpened = edge_enhance(&contrasted);
    let mark = threshold_to_black(&sharpened, ALPHA_THRESHOLD);

    let Some(bbox) = BoundingBox::of_opaque(&mark) else {
        debug!("No ink left after thresholding");
        return None;
    };
    let crop = bbox.expand(CROP_MARGIN, mark.width(), mark.height());
    debug!(?bbox, ?crop, "Cropping mark");

    Some(image::imageops::crop_imm(&mark, crop.left, crop.top, crop.width(), crop.height()).to_image())
}

/// Scale each color channel's distance from mid-gray by `factor`; alpha is kept
pub fn adjust_contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = clamp_u8(128.0 + factor * (f32::from(*channel) - 128.0));
        }
    }
    out
}

/// Sharpen strokes with the fixed 3x3 edge-enhancement kernel
///
/// Border pixels are copied unchanged.
pub fn edge_enhance(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = [0.0f32; 4];
            for (ky, row) in EDGE_ENHANCE_KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let src = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for (sum, value) in acc.iter_mut().zip(src.0) {
                        *sum += weight * f32::from(value);
                    }
                }
            }
            let pixel = out.get_pixel_mut(x, y);
            for (channel, sum) in pixel.0.iter_mut().zip(acc) {
                *channel = clamp_u8(sum / EDGE_ENHANCE_SCALE);
            }
        }
    }
    out
}

/// Binarize alpha at `threshold` and paint every surviving pixel pure black
pub fn threshold_to_black(image: &RgbaImage, threshold: u8) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        *dst = if src[3] < threshold {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([0, 0, 0, 255])
        };
    }
    out
}

fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cutout_with_rect(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32, ink: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
                ink
            } else {
                Rgba([255, 255, 255, 0])
            }
        })
    }

    #[test]
    fn test_fully_transparent_cutout_yields_none() {
        let cutout = RgbaImage::from_pixel(64, 32, Rgba([40, 40, 40, 0]));
        assert!(clean_mark(&cutout).is_none());
    }

    #[test]
    fn test_semi_transparent_ink_survives() {
        for alpha in [30, 50] {
            let cutout = cutout_with_rect(200, 100, 50, 40, 100, 20, Rgba([20, 20, 20, alpha]));
            let mark = clean_mark(&cutout).unwrap();
            assert_eq!(mark.dimensions(), (120, 40), "alpha {}", alpha);
            assert_eq!(*mark.get_pixel(60, 20), Rgba([0, 0, 0, 255]));
        }
    }

    #[test]
    fn test_threshold_applies_to_cutout_alpha() {
        // Flat fills: the edge filter leaves alpha as it came from the cutout.
        let below = RgbaImage::from_pixel(64, 32, Rgba([20, 20, 20, 24]));
        assert!(clean_mark(&below).is_none());

        for alpha in [25, 60] {
            let cutout = RgbaImage::from_pixel(64, 32, Rgba([20, 20, 20, alpha]));
            let mark = clean_mark(&cutout).unwrap();
            assert_eq!(mark.dimensions(), (64, 32));
            assert!(mark.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
        }
    }

    #[test]
    fn test_crop_keeps_margin() {
        let cutout = cutout_with_rect(200, 100, 50, 40, 100, 20, Rgba([0, 0, 0, 255]));
        let mark = clean_mark(&cutout).unwrap();
        assert_eq!(mark.dimensions(), (120, 40));

        assert_eq!(*mark.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*mark.get_pixel(9, 9), Rgba([0, 0, 0, 0]));
        assert_eq!(*mark.get_pixel(10, 10), Rgba([0, 0, 0, 255]));
        assert_eq!(*mark.get_pixel(109, 29), Rgba([0, 0, 0, 255]));
        assert_eq!(*mark.get_pixel(110, 30), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_crop_margin_is_clamped_at_edges() {
        let cutout = cutout_with_rect(100, 50, 2, 0, 30, 5, Rgba([0, 0, 0, 255]));
        let mark = clean_mark(&cutout).unwrap();
        // left 2-10 -> 0, top 0, right 32+10, bottom 5+10
        assert_eq!(mark.dimensions(), (42, 15));
    }

    #[test]
    fn test_colored_ink_becomes_black() {
        let cutout = cutout_with_rect(60, 60, 20, 20, 20, 20, Rgba([30, 60, 200, 255]));
        let mark = clean_mark(&cutout).unwrap();
        for pixel in mark.pixels() {
            assert!(pixel[3] == 0 || pixel[3] == 255);
            assert_eq!(&pixel.0[..3], &[0, 0, 0]);
        }
        assert_eq!(*mark.get_pixel(15, 15), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let cutout = cutout_with_rect(200, 100, 50, 40, 100, 20, Rgba([0, 0, 0, 255]));
        let once = clean_mark(&cutout).unwrap();
        let twice = clean_mark(&once).unwrap();
        assert_eq!(once.dimensions(), twice.dimensions());
        assert_eq!(once.as_raw(), twice.as_raw());
        assert_eq!(BoundingBox::of_opaque(&once), BoundingBox::of_opaque(&twice));
    }

    #[test]
    fn test_adjust_contrast_clamps() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 100, 200, 30]));
        let out = adjust_contrast(&img, 2.0);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 72, 255, 30]));
    }

    #[test]
    fn test_edge_enhance_flat_region_unchanged() {
        let img = RgbaImage::from_pixel(5, 5, Rgba([90, 90, 90, 255]));
        assert_eq!(edge_enhance(&img).as_raw(), img.as_raw());
    }

    #[test]
    fn test_threshold_boundary() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 24]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 25]));
        let out = threshold_to_black(&img, ALPHA_THRESHOLD);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*out.get_pixel(1, 0), Rgba([0, 0, 0, 255]));
    }
}
