//! PNG and data URI export of rendered images.

use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::{RenderError, RenderResult};

/// Prefix of PNG data URIs.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Wrap PNG bytes in a base64 data URI.
#[must_use]
pub fn png_data_uri(png: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    format!("{PNG_DATA_URI_PREFIX}{encoded}")
}

/// Encode an image straight to a PNG data URI.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if encoding fails.
pub fn to_data_uri(image: &RgbaImage) -> RenderResult<String> {
    encode_png(image).map(|png| png_data_uri(&png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{decode_data_uri, solid_color};

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let png = encode_png(&solid_color(8, 8, [10, 20, 30, 255])).expect("png export");
        assert!(png.len() > 8);
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_data_uri_decodes_back() {
        let image = solid_color(3, 2, [200, 100, 50, 128]);
        let uri = to_data_uri(&image).expect("data uri");
        assert!(uri.starts_with(PNG_DATA_URI_PREFIX));
        assert_eq!(decode_data_uri(&uri).expect("decodes"), image);
    }

    #[test]
    fn test_empty_image_png() {
        let png = encode_png(&RgbaImage::new(1, 1)).expect("empty png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }
}
