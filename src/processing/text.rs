//! Caption text measurement, wrapping and drawing

use crate::error::{Result, StampError};
use crate::types::Caption;
use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Cell size of the built-in bitmap font
const BUILTIN_CELL: u32 = 8;

/// System font roots searched for bare font file names
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Directory depth walked below each font root
const FONT_SEARCH_DEPTH: usize = 4;

/// Font used to render the caption
///
/// Loading never fails: any problem with the TrueType file falls back to the
/// built-in 8x8 bitmap font.
pub enum CaptionFont {
    /// Scalable font loaded from disk
    TrueType { font: FontVec, scale: PxScale },
    /// `font8x8` bitmap glyphs drawn with a one-pixel overstrike for bold
    Builtin,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrueType { scale, .. } => f
                .debug_struct("TrueType")
                .field("scale", &(scale.x, scale.y))
                .finish_non_exhaustive(),
            Self::Builtin => write!(f, "Builtin"),
        }
    }
}

impl CaptionFont {
    /// Load `path` at `size` pixels per em, or the built-in font
    ///
    /// Missing and corrupt font files are treated alike: logged, then replaced.
    #[must_use]
    pub fn load(path: Option<&Path>, size: f32) -> Self {
        let Some(requested) = path else {
            return Self::Builtin;
        };
        let Some(path) = locate_font(requested) else {
            warn!(path = %requested.display(), "Font not found, using built-in font");
            return Self::Builtin;
        };
        let path = path.as_path();
        match std::fs::read(path) {
            Ok(bytes) => match Self::from_bytes(bytes, size) {
                Ok(font) => {
                    debug!(path = %path.display(), size, "Loaded caption font");
                    font
                },
                Err(e) => {
                    warn!(path = %path.display(), "Font unavailable ({}), using built-in font", e);
                    Self::Builtin
                },
            },
            Err(e) => {
                warn!(path = %path.display(), "Font unavailable ({}), using built-in font", e);
                Self::Builtin
            },
        }
    }

    /// Parse TrueType/OpenType bytes
    ///
    /// # Errors
    /// - Bytes are not a parseable font
    pub fn from_bytes(bytes: Vec<u8>, size: f32) -> Result<Self> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| StampError::processing(format!("invalid font data: {}", e)))?;
        // PxScale is ascent-to-descent height; convert from the em size.
        let units_per_em = font.units_per_em().unwrap_or(1000.0);
        let scale = PxScale::from(size * font.height_unscaled() / units_per_em);
        Ok(Self::TrueType { font, scale })
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self::Builtin
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Height of one rendered line in pixels
    #[must_use]
    pub fn line_height(&self) -> u32 {
        match self {
            Self::TrueType { font, scale } => font.as_scaled(*scale).height().ceil() as u32,
            Self::Builtin => BUILTIN_CELL,
        }
    }

    /// Advance width of `text` in pixels
    #[must_use]
    pub fn text_width(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        match self {
            Self::TrueType { font, scale } => text_size(*scale, font, text).0,
            // +1 for the bold overstrike on the last column
            Self::Builtin => text.chars().count() as u32 * BUILTIN_CELL + 1,
        }
    }

    /// Pixel extents of the ink `text` leaves, relative to where it is drawn
    ///
    /// `None` when nothing would be painted.
    #[must_use]
    pub fn ink_box(&self, text: &str) -> Option<InkBox> {
        match self {
            Self::TrueType { font, scale } => truetype_ink_box(font, *scale, text),
            Self::Builtin if text.is_empty() => None,
            Self::Builtin => Some(InkBox {
                left: 0,
                top: 0,
                right: self.text_width(text) as i32,
                bottom: BUILTIN_CELL as i32,
            }),
        }
    }

    /// Draw one line with its top-left corner at (`x`, `y`)
    pub fn draw_line(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        match self {
            Self::TrueType { font, scale } => draw_text_mut(canvas, color, x, y, *scale, font, text),
            Self::Builtin => draw_builtin(canvas, x, y, text, color),
        }
    }
}

/// Resolve a font file as given, or by bare file name in the font directories
///
/// Mirrors how desktop toolkits find `DejaVuSans-Bold.ttf` without a path.
#[must_use]
pub fn locate_font(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if path.components().count() != 1 {
        return None;
    }
    find_font_in(path.file_name()?, &font_search_dirs())
}

fn font_search_dirs() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = dirs::font_dir().into_iter().collect();
    if let Some(data) = dirs::data_dir() {
        roots.push(data.join("fonts"));
    }
    roots.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));
    roots
}

/// First file called `file_name` below any of `roots`, in root order
#[must_use]
pub fn find_font_in(file_name: &OsStr, roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().filter(|root| root.is_dir()).find_map(|root| {
        WalkDir::new(root)
            .max_depth(FONT_SEARCH_DEPTH)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
            .map(walkdir::DirEntry::into_path)
    })
}

/// Bounding box of painted pixels, in pixels from the draw origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl InkBox {
    #[must_use]
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }
}

// Same caret and kerning walk `draw_text_mut` uses, so the box matches the paint.
fn truetype_ink_box(font: &FontVec, scale: PxScale, text: &str) -> Option<InkBox> {
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0f32;
    let mut last: Option<GlyphId> = None;
    let mut ink: Option<InkBox> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        let glyph = glyph_id.with_scale_and_position(scale, point(caret, scaled.ascent()));
        caret += scaled.h_advance(glyph_id);
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        if let Some(last) = last {
            caret += scaled.kern(glyph_id, last);
        }
        last = Some(glyph_id);

        let bounds = outlined.px_bounds();
        let left = bounds.min.x.round() as i32;
        let top = bounds.min.y.round() as i32;
        let glyph_box = InkBox {
            left,
            top,
            right: left + bounds.width() as i32,
            bottom: top + bounds.height() as i32,
        };
        ink = Some(match ink {
            None => glyph_box,
            Some(acc) => InkBox {
                left: acc.left.min(glyph_box.left),
                top: acc.top.min(glyph_box.top),
                right: acc.right.max(glyph_box.right),
                bottom: acc.bottom.max(glyph_box.bottom),
            },
        });
    }
    ink
}

fn builtin_glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_builtin(canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    for (index, c) in text.chars().enumerate() {
        let origin_x = x + index as i32 * BUILTIN_CELL as i32;
        for (row, bits) in builtin_glyph(c).iter().enumerate() {
            let py = y + row as i32;
            if py < 0 || py >= height {
                continue;
            }
            for col in 0..BUILTIN_CELL as i32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for px in [origin_x + col, origin_x + col + 1] {
                    if px >= 0 && px < width {
                        canvas.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

/// Break `text` into lines no wider than `max_width`
///
/// Words are kept whole where possible; a word wider than the limit is split
/// between characters. Always returns at least one line.
#[must_use]
pub fn wrap_line(text: &str, font: &CaptionFont, max_width: u32) -> Vec<String> {
    if font.text_width(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if font.text_width(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if font.text_width(word) <= max_width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            let mut next = current.clone();
            next.push(ch);
            if !current.is_empty() && font.text_width(&next) > max_width {
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            } else {
                current = next;
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// One wrapped line and its draw origin inside the block
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlacedLine {
    text: String,
    x: i32,
    y: i32,
}

/// A measured, wrapped caption ready to be drawn
///
/// Width and height are the tight box around the painted ink, so the caption
/// sits exactly where the layout places it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    lines: Vec<PlacedLine>,
    width: u32,
    height: u32,
}

impl TextBlock {
    /// Wrap and measure `caption`
    #[must_use]
    pub fn layout(caption: &Caption, font: &CaptionFont, max_width: u32, spacing: u32) -> Self {
        let measured = caption
            .lines()
            .iter()
            .flat_map(|line| wrap_line(line, font, max_width))
            .map(|line| {
                let ink = font.ink_box(&line);
                (line, ink)
            })
            .collect();
        Self::from_measured(measured, font.line_height(), spacing)
    }

    /// Stack measured lines `line_height + spacing` apart and trim to their ink
    fn from_measured(measured: Vec<(String, Option<InkBox>)>, line_height: u32, spacing: u32) -> Self {
        let step = (line_height + spacing) as i32;
        let inked: Vec<(i32, InkBox)> = measured
            .iter()
            .enumerate()
            .filter_map(|(index, (_, ink))| ink.map(|ink| (index as i32 * step, ink)))
            .collect();

        let width = inked.iter().map(|(_, ink)| ink.width()).max().unwrap_or(0);
        let top = inked.iter().map(|(offset, ink)| offset + ink.top).min().unwrap_or(0);
        let bottom = inked.iter().map(|(offset, ink)| offset + ink.bottom).max().unwrap_or(0);

        let lines = measured
            .into_iter()
            .enumerate()
            .map(|(index, (text, ink))| {
                let x = ink.map_or(0, |ink| (width - ink.width()) as i32 / 2 - ink.left);
                PlacedLine {
                    text,
                    x,
                    y: index as i32 * step - top,
                }
            })
            .collect();

        Self {
            lines,
            width,
            height: (bottom - top).max(0) as u32,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rendered lines after wrapping
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    /// Draw the block with its ink's top-left corner at (`x`, `y`), each line centered
    pub fn draw(&self, canvas: &mut RgbImage, font: &CaptionFont, x: i32, y: i32, color: Rgb<u8>) {
        for line in &self.lines {
            font.draw_line(canvas, x + line.x, y + line.y, &line.text, color);
        }
    }
}
