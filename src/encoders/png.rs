//! PNG encoder with print-resolution metadata
//!
//! The `image` crate does not write `pHYs`, so the chunk is built by hand and
//! spliced in before the first `IDAT` chunk.

use crate::error::{Result, StampError};
use image::DynamicImage;
use std::io::Cursor;

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const INCHES_PER_METRE: f64 = 39.370_078_740_157_48;

/// Convert dots per inch to PNG pixels per metre
#[must_use]
pub fn dpi_to_ppm(dpi: u32) -> u32 {
    (f64::from(dpi) * INCHES_PER_METRE).round() as u32
}

/// Encode `image` as PNG carrying a `pHYs` chunk for `dpi`
///
/// # Errors
/// - PNG encoding errors from the underlying image library
/// - Malformed PNG data when inserting the chunk
pub fn encode_png(image: &DynamicImage, dpi: u32) -> Result<Vec<u8>> {
    let mut png_buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_buffer), image::ImageFormat::Png)
        .map_err(|e| StampError::processing(format!("Failed to create PNG buffer: {e}")))?;

    let ppm = dpi_to_ppm(dpi);
    let chunk = phys_chunk(ppm);
    let png = insert_before_idat(&png_buffer, &chunk)?;
    log::debug!(
        "Encoded PNG {}x{} at {} dpi ({} bytes)",
        image.width(),
        image.height(),
        dpi,
        png.len()
    );
    Ok(png)
}

/// Read the `pHYs` resolution back out of PNG bytes as (x, y) pixels per metre
#[must_use]
pub fn read_phys(png_data: &[u8]) -> Option<(u32, u32)> {
    chunks(png_data)
        .find(|(chunk_type, _)| chunk_type == b"pHYs")
        .and_then(|(_, data)| {
            let x = u32::from_be_bytes(data.get(0..4)?.try_into().ok()?);
            let y = u32::from_be_bytes(data.get(4..8)?.try_into().ok()?);
            (data.get(8) == Some(&1)).then_some((x, y))
        })
}

/// Build a complete `pHYs` chunk (length + type + data + CRC), unit = metre
fn phys_chunk(pixels_per_metre: u32) -> Vec<u8> {
    let mut chunk_data = Vec::with_capacity(9);
    chunk_data.extend_from_slice(&pixels_per_metre.to_be_bytes());
    chunk_data.extend_from_slice(&pixels_per_metre.to_be_bytes());
    chunk_data.push(1);

    let mut crc = crc32fast::Hasher::new();
    crc.update(b"pHYs");
    crc.update(&chunk_data);

    let mut chunk = Vec::with_capacity(21);
    chunk.extend_from_slice(&9u32.to_be_bytes());
    chunk.extend_from_slice(b"pHYs");
    chunk.extend_from_slice(&chunk_data);
    chunk.extend_from_slice(&crc.finalize().to_be_bytes());
    chunk
}

fn insert_before_idat(png_data: &[u8], chunk: &[u8]) -> Result<Vec<u8>> {
    if png_data.get(0..8) != Some(PNG_SIGNATURE.as_slice()) {
        return Err(StampError::processing("Invalid PNG signature"));
    }

    let mut result = Vec::with_capacity(png_data.len() + chunk.len());
    result.extend_from_slice(PNG_SIGNATURE);
    let mut pos = 8;
    let mut inserted = false;

    while pos + 8 <= png_data.len() {
        let length_bytes: [u8; 4] = png_data
            .get(pos..pos + 4)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| StampError::processing("Truncated PNG: incomplete chunk length"))?;
        let length = usize::try_from(u32::from_be_bytes(length_bytes))
            .map_err(|_| StampError::processing("PNG chunk length too large for usize"))?;
        let chunk_type = png_data
            .get(pos + 4..pos + 8)
            .ok_or_else(|| StampError::processing("Truncated PNG: incomplete chunk type"))?;

        if chunk_type == b"pHYs" {
            // replaced by ours
            pos += 12 + length;
            continue;
        }
        if chunk_type == b"IDAT" && !inserted {
            result.extend_from_slice(chunk);
            inserted = true;
        }

        let whole = png_data
            .get(pos..pos + 12 + length)
            .ok_or_else(|| StampError::processing("Truncated PNG: incomplete chunk data"))?;
        result.extend_from_slice(whole);
        pos += 12 + length;

        if chunk_type == b"IEND" {
            break;
        }
    }

    if !inserted {
        return Err(StampError::processing("Could not find IDAT chunk to insert pHYs"));
    }
    Ok(result)
}

fn chunks(png_data: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut pos = 8;
    std::iter::from_fn(move || {
        let length = u32::from_be_bytes(png_data.get(pos..pos + 4)?.try_into().ok()?) as usize;
        let chunk_type: [u8; 4] = png_data.get(pos + 4..pos + 8)?.try_into().ok()?;
        let data = png_data.get(pos + 8..pos + 8 + length)?;
        pos += 12 + length;
        Some((chunk_type, data))
    })
}
