//! Fixed-size RGBA drawing surfaces.

use image::{imageops, Rgba, RgbaImage};
use outfit_core::Position;

/// A fixed-size RGBA pixel buffer, transparent when created.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Create a transparent surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    /// Alpha-blend an image at `offset`, optionally multiplied by `tint`.
    ///
    /// Offsets are rounded to whole pixels; parts of the image that fall
    /// outside the surface are clipped.
    #[allow(clippy::cast_possible_truncation)] // offsets are small pixel counts
    pub fn draw(&mut self, image: &RgbaImage, offset: Position, tint: Option<[u8; 4]>) {
        let x = offset.x.round() as i64;
        let y = offset.y.round() as i64;
        match tint {
            Some(tint) => imageops::overlay(&mut self.pixels, &tinted(image, tint), x, y),
            None => imageops::overlay(&mut self.pixels, image, x, y),
        }
    }

    /// Alpha-blend another surface on top of this one.
    pub fn composite(&mut self, top: &Surface) {
        imageops::overlay(&mut self.pixels, &top.pixels, 0, 0);
    }

    /// Whether every pixel is fully transparent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[3] == 0)
    }

    /// The pixel buffer.
    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Consume the surface, returning its pixel buffer.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

fn tinted(image: &RgbaImage, tint: [u8; 4]) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for (channel, factor) in pixel.0.iter_mut().zip(tint) {
            *channel = multiply(*channel, factor);
        }
    }
    out
}

fn multiply(a: u8, b: u8) -> u8 {
    u8::try_from(u16::from(a) * u16::from(b) / 255).unwrap_or(u8::MAX)
}
