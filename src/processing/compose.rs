//! Canvas composition: mark above a centered caption on a fixed white canvas

use super::resize::fit_and_soften;
use super::text::{CaptionFont, TextBlock};
use crate::error::{Result, StampError};
use crate::types::Caption;
use image::{Rgb, RgbImage, RgbaImage};
use tracing::{debug, instrument};

pub const CANVAS_WIDTH: u32 = 480;
pub const CANVAS_HEIGHT: u32 = 120;

/// Upper bounds for the scaled mark
pub const MARK_MAX_WIDTH: u32 = 280;
pub const MARK_MAX_HEIGHT: u32 = 50;

/// Total horizontal margin (split between both sides)
pub const HORIZONTAL_MARGIN: u32 = 40;
pub const TOP_MARGIN: u32 = 10;
pub const BOTTOM_MARGIN: u32 = 5;

/// Vertical gap between mark and caption
pub const MARK_TEXT_GAP: u32 = 5;

/// Extra pixels between caption lines
pub const LINE_SPACING: u32 = 1;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Where mark and caption land on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub mark_x: u32,
    pub mark_y: u32,
    pub mark_width: u32,
    pub mark_height: u32,
    pub text_x: u32,
    pub text_y: u32,
    pub text_width: u32,
    pub text_height: u32,
}

/// Size budget for the mark given the caption height
///
/// # Errors
/// - `InfeasibleLayout` when the caption leaves no positive height for the mark
pub fn mark_budget(text_height: u32) -> Result<(u32, u32)> {
    let max_width = MARK_MAX_WIDTH.min(CANVAS_WIDTH - HORIZONTAL_MARGIN);
    let available = i64::from(CANVAS_HEIGHT)
        - i64::from(TOP_MARGIN)
        - i64::from(BOTTOM_MARGIN)
        - i64::from(text_height);
    let max_height = i64::from(MARK_MAX_HEIGHT).min(available);
    if max_height <= 0 {
        return Err(StampError::InfeasibleLayout {
            caption_height: text_height,
            available_height: max_height,
        });
    }
    Ok((max_width, max_height as u32))
}

/// Center the mark + gap + caption block vertically, each part horizontally
#[must_use]
pub fn place(mark_width: u32, mark_height: u32, text_width: u32, text_height: u32) -> Placement {
    let content_height = mark_height + MARK_TEXT_GAP + text_height;
    let mark_y = CANVAS_HEIGHT.saturating_sub(content_height) / 2;
    Placement {
        mark_x: CANVAS_WIDTH.saturating_sub(mark_width) / 2,
        mark_y,
        mark_width,
        mark_height,
        text_x: CANVAS_WIDTH.saturating_sub(text_width) / 2,
        text_y: mark_y + mark_height + MARK_TEXT_GAP,
        text_width,
        text_height,
    }
}

/// Compose the final opaque 480x120 stamp
///
/// # Errors
/// - `InfeasibleLayout` when the caption is too tall for any mark
#[instrument(skip_all, fields(mark_width = mark.width(), mark_height = mark.height(), lines = caption.line_count()))]
pub fn compose(mark: &RgbaImage, caption: &Caption, font: &CaptionFont) -> Result<RgbImage> {
    let block = TextBlock::layout(caption, font, CANVAS_WIDTH - HORIZONTAL_MARGIN, LINE_SPACING);
    let (max_width, max_height) = mark_budget(block.height())?;

    let scaled = fit_and_soften(mark, max_width, max_height);
    let placement = place(scaled.width(), scaled.height(), block.width(), block.height());
    debug!(?placement, "Layout computed");

    let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, WHITE);
    paste_with_alpha(&mut canvas, &scaled, placement.mark_x, placement.mark_y);
    block.draw(
        &mut canvas,
        font,
        placement.text_x as i32,
        placement.text_y as i32,
        BLACK,
    );
    Ok(canvas)
}

/// Alpha-blend `overlay` onto `canvas` at (`x`, `y`), clipping at the edges
pub fn paste_with_alpha(canvas: &mut RgbImage, overlay: &RgbaImage, x: u32, y: u32) {
    for (ox, oy, src) in overlay.enumerate_pixels() {
        let alpha = u32::from(src[3]);
        if alpha == 0 {
            continue;
        }
        let (cx, cy) = (x + ox, y + oy);
        if cx >= canvas.width() || cy >= canvas.height() {
            continue;
        }
        let dst = canvas.get_pixel_mut(cx, cy);
        for (d, s) in dst.0.iter_mut().zip(src.0) {
            let blended = (u32::from(s) * alpha + u32::from(*d) * (255 - alpha) + 127) / 255;
            *d = blended as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_mark(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_budget_for_two_line_caption() {
        assert_eq!(mark_budget(17).unwrap(), (280, 50));
        assert_eq!(mark_budget(80).unwrap(), (280, 25));
    }

    #[test]
    fn test_budget_infeasible() {
        assert!(mark_budget(104).is_ok());
        let err = mark_budget(105).unwrap_err();
        assert!(matches!(
            err,
            StampError::InfeasibleLayout {
                caption_height: 105,
                available_height: 0
            }
        ));
    }

    #[test]
    fn test_place_centers_content() {
        let p = place(150, 50, 97, 17);
        assert_eq!((p.mark_x, p.mark_y), (165, 24));
        assert_eq!((p.text_x, p.text_y), (191, 79));
    }

    #[test]
    fn test_compose_canvas_is_fixed_and_white_cornered() {
        let font = CaptionFont::builtin();
        let caption = Caption::new("Dr. Ana Lima", "12345-SP", Some("Assinatura digital"));
        for (w, h) in [(120, 40), (600, 20), (30, 300), (1, 1)] {
            let stamp = compose(&solid_mark(w, h), &caption, &font).unwrap();
            assert_eq!(stamp.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
            for (x, y) in [(0, 0), (479, 0), (0, 119), (479, 119)] {
                assert_eq!(stamp.get_pixel(x, y).0, [255, 255, 255]);
            }
        }
    }

    #[test]
    fn test_compose_rejects_tall_caption() {
        let font = CaptionFont::builtin();
        let long = "palavra ".repeat(200);
        let caption = Caption::new("Dr. Ana Lima", "12345-SP", Some(&long));
        let err = compose(&solid_mark(100, 20), &caption, &font).unwrap_err();
        assert!(matches!(err, StampError::InfeasibleLayout { .. }));
    }

    #[test]
    fn test_paste_respects_alpha() {
        let mut canvas = RgbImage::from_pixel(4, 1, WHITE);
        let mut overlay = RgbaImage::new(3, 1);
        overlay.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        overlay.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        overlay.put_pixel(2, 0, Rgba([0, 0, 0, 235]));
        paste_with_alpha(&mut canvas, &overlay, 1, 0);

        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(2, 0).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(3, 0).0, [20, 20, 20]);
    }
}
