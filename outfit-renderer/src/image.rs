//! Image decoding utilities.
//!
//! Part assets are PNG files. Bytes are checked against the PNG signature
//! before decoding so a misnamed asset fails with a clear reason.

use base64::Engine;
use image::RgbaImage;

use crate::error::{RenderError, RenderResult};

/// The eight-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Whether `data` starts with the PNG signature.
#[must_use]
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// Decode PNG bytes into an RGBA buffer.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the bytes are not a decodable PNG.
pub fn decode_image(data: &[u8]) -> RenderResult<RgbaImage> {
    if !is_png(data) {
        return Err(RenderError::Decode(format!(
            "missing PNG signature ({} bytes)",
            data.len()
        )));
    }
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| RenderError::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Decode a base64 PNG data URI such as `data:image/png;base64,iVBOR...`.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the URI is malformed, not base64, or
/// does not hold a PNG.
pub fn decode_data_uri(uri: &str) -> RenderResult<RgbaImage> {
    let (metadata, encoded) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| RenderError::Decode("malformed data URI".to_string()))?;
    if !metadata.ends_with(";base64") {
        return Err(RenderError::Decode(format!(
            "unsupported data URI encoding '{metadata}'"
        )));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| RenderError::Decode(format!("invalid base64: {e}")))?;
    decode_image(&bytes)
}

/// Create a solid color image.
#[must_use]
pub fn solid_color(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba(rgba))
}
