//! Image I/O operations service
//!
//! Keeps file access out of the pipeline: front ends read source bytes and
//! write finished stamps through here.

use crate::encoders::encode_png;
use crate::error::{Result, StampError};
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};

/// Service for handling stamp file input/output operations
pub struct StampIOService;

impl StampIOService {
    /// Read the raw bytes of a source photo
    ///
    /// # Errors
    /// - File does not exist or cannot be read
    /// - File is empty
    ///
    /// # Examples
    /// ```rust,no_run
    /// use sigstamp::services::StampIOService;
    ///
    /// let bytes = StampIOService::read_source("signature.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_source<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(StampError::file_io_error(
                "read source image",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        let data = std::fs::read(path_ref)
            .map_err(|e| StampError::file_io_error("read source image", path_ref, &e))?;
        if data.is_empty() {
            return Err(StampError::invalid_input(format!(
                "source image '{}' is empty",
                path_ref.display()
            )));
        }
        log::debug!("Read {} bytes from {}", data.len(), path_ref.display());
        Ok(data)
    }

    /// Write a stamp as PNG with print resolution metadata
    ///
    /// # Errors
    /// - Output directory cannot be created
    /// - Encoding or write failures
    pub fn save_stamp<P: AsRef<Path>>(stamp: &RgbImage, path: P, dpi: u32) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StampError::file_io_error("create output directory", parent, &e)
            })?;
        }

        let png = encode_png(&DynamicImage::ImageRgb8(stamp.clone()), dpi)?;
        std::fs::write(path_ref, png)
            .map_err(|e| StampError::file_io_error("write stamp", path_ref, &e))?;
        log::info!("Saved stamp to {}", path_ref.display());
        Ok(())
    }

    /// Default output path for a signer, in `dir`
    #[must_use]
    pub fn default_output_path<P: AsRef<Path>>(dir: P, name: &str) -> PathBuf {
        dir.as_ref().join(download_file_name(name))
    }
}

/// File name offered for download: `"Signature - <name>.png"`
///
/// Path separators, quotes and control characters are replaced so the result
/// is safe both as a file name and inside a `Content-Disposition` header.
#[must_use]
pub fn download_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "Signature.png".to_string()
    } else {
        format!("Signature - {}.png", cleaned)
    }
}
