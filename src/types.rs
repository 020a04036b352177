//! Core types shared by the stamp pipeline

use crate::error::{Result, StampError};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Caption block printed beneath the signature mark
///
/// Always two or three lines: the name, `"<label>: <registration>"`, and the
/// free-text line when one was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    lines: Vec<String>,
}

impl Caption {
    /// Build a caption with the default `ID` label
    #[must_use]
    pub fn new(name: &str, registration: &str, free_text: Option<&str>) -> Self {
        Self::with_label(name, "ID", registration, free_text)
    }

    /// Build a caption with a custom registration label (e.g. `CRM`)
    ///
    /// The free-text line is kept only when it is non-empty.
    #[must_use]
    pub fn with_label(
        name: &str,
        label: &str,
        registration: &str,
        free_text: Option<&str>,
    ) -> Self {
        let mut lines = vec![name.to_string(), format!("{}: {}", label, registration)];
        if let Some(text) = free_text.filter(|t| !t.is_empty()) {
            lines.push(text.to_string());
        }
        Self { lines }
    }

    /// Front-end helper: trims the fields and rejects an empty name or registration
    ///
    /// # Errors
    /// - `name` or `registration` is empty after trimming
    pub fn validated(
        name: &str,
        label: &str,
        registration: &str,
        free_text: Option<&str>,
    ) -> Result<Self> {
        let name = name.trim();
        let registration = registration.trim();
        if name.is_empty() {
            return Err(StampError::invalid_input("name must not be empty"));
        }
        if registration.is_empty() {
            return Err(StampError::invalid_input("registration ID must not be empty"));
        }
        Ok(Self::with_label(
            name,
            label,
            registration,
            free_text.map(str::trim),
        ))
    }

    /// Caption lines in print order
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The name line
    #[must_use]
    pub fn name(&self) -> &str {
        self.lines.first().map_or("", String::as_str)
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Minimal rectangle enclosing the non-transparent pixels of an image
///
/// `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    /// Bounding box of every pixel with non-zero alpha, `None` when fully transparent
    #[must_use]
    pub fn of_opaque(image: &RgbaImage) -> Option<Self> {
        let mut bbox: Option<Self> = None;
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel[3] == 0 {
                continue;
            }
            bbox = Some(match bbox {
                None => Self {
                    left: x,
                    top: y,
                    right: x + 1,
                    bottom: y + 1,
                },
                Some(b) => Self {
                    left: b.left.min(x),
                    top: b.top.min(y),
                    right: b.right.max(x + 1),
                    bottom: b.bottom.max(y + 1),
                },
            });
        }
        bbox
    }

    /// Grow by `margin` on every side, clamped to a `width` x `height` image
    #[must_use]
    pub fn expand(&self, margin: u32, width: u32, height: u32) -> Self {
        Self {
            left: self.left.saturating_sub(margin),
            top: self.top.saturating_sub(margin),
            right: self.right.saturating_add(margin).min(width),
            bottom: self.bottom.saturating_add(margin).min(height),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}
