//! Part color options and the tokens stored in selections.
//!
//! A part colors its images in one of two ways. In [`ColorMode::Variant`]
//! the token is the color name and the renderer loads an image variant with
//! an `_<name>` filename suffix. In [`ColorMode::Tint`] the token is a
//! `#RRGGBBAA` hex string and the renderer multiplies the base image by it.

use serde::{Deserialize, Serialize};

/// How a part's color choice reaches the rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color names select pre-rendered image variants.
    #[default]
    Variant,
    /// Hex tokens tint the base image.
    Tint,
}

impl ColorMode {
    /// Parse a catalog `colorMode` value.
    ///
    /// `"tint"` and `"hex"` select [`ColorMode::Tint`]; anything else, or no
    /// value at all, selects [`ColorMode::Variant`].
    #[must_use]
    pub fn from_catalog(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("tint" | "hex") => Self::Tint,
            Some("variant" | "name") | None => Self::Variant,
            Some(other) => {
                tracing::warn!("Unknown color mode '{other}', using variant images");
                Self::Variant
            }
        }
    }
}

/// One selectable color of a part.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ColorRecord")]
pub struct Color {
    /// Display name, also the filename suffix in variant mode.
    pub name: String,
    /// Hex color without alpha, with or without a leading `#`.
    pub hex: Option<String>,
    /// Opacity in `0.0..=1.0`; absent means fully opaque.
    pub transparency: Option<f64>,
}

impl Color {
    /// Create a named color with no hex value.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: None,
            transparency: None,
        }
    }

    /// The selection token for this color under the given mode.
    #[must_use]
    pub fn token(&self, mode: ColorMode) -> String {
        match mode {
            ColorMode::Variant => self.name.clone(),
            ColorMode::Tint => self.hex_token(),
        }
    }

    /// `#RRGGBBAA` token, alpha being `floor(transparency * 255)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=255
    pub fn hex_token(&self) -> String {
        let hex = self
            .hex
            .as_deref()
            .map_or("000000", |h| h.trim_start_matches('#'));
        let opacity = self.transparency.unwrap_or(1.0).clamp(0.0, 1.0);
        let alpha = (opacity * 255.0).floor() as u8;
        format!("#{hex}{alpha:02x}")
    }
}

/// Catalog form of a color: either a bare name or an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRecord {
    Name(String),
    Full {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        hex: Option<String>,
        #[serde(default)]
        transparency: Option<f64>,
    },
}

impl From<ColorRecord> for Color {
    fn from(record: ColorRecord) -> Self {
        match record {
            ColorRecord::Name(name) => Self::named(name),
            ColorRecord::Full {
                name,
                hex,
                transparency,
            } => Self {
                name: name.or_else(|| hex.clone()).unwrap_or_default(),
                hex,
                transparency,
            },
        }
    }
}

/// Parse a `#RRGGBB` or `#RRGGBBAA` token into RGBA channels.
///
/// Returns `None` for anything that is not a hex color token.
#[must_use]
pub fn parse_hex_token(token: &str) -> Option<[u8; 4]> {
    let digits = token.strip_prefix('#')?;
    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_catalog() {
        assert_eq!(ColorMode::from_catalog(None), ColorMode::Variant);
        assert_eq!(ColorMode::from_catalog(Some("hex")), ColorMode::Tint);
        assert_eq!(ColorMode::from_catalog(Some("Tint")), ColorMode::Tint);
        assert_eq!(ColorMode::from_catalog(Some("sparkly")), ColorMode::Variant);
    }

    #[test]
    fn test_hex_token_alpha() {
        let color = Color {
            name: "sky".into(),
            hex: Some("#3366ff".into()),
            transparency: Some(0.5),
        };
        assert_eq!(color.hex_token(), "#3366ff7f");

        let opaque = Color {
            name: "ink".into(),
            hex: Some("000000".into()),
            transparency: None,
        };
        assert_eq!(opaque.hex_token(), "#000000ff");
    }

    #[test]
    fn test_small_alpha_is_padded() {
        let color = Color {
            name: "ghost".into(),
            hex: Some("ffffff".into()),
            transparency: Some(0.01),
        };
        assert_eq!(color.hex_token(), "#ffffff02");
    }

    #[test]
    fn test_token_by_mode() {
        let color = Color::named("red");
        assert_eq!(color.token(ColorMode::Variant), "red");
        assert_eq!(color.token(ColorMode::Tint), "#000000ff");
    }

    #[test]
    fn test_deserialize_both_forms() {
        let colors: Vec<Color> =
            serde_json::from_str(r##"["red", {"hex": "#00ff00", "transparency": 0.2}]"##)
                .expect("colors parse");
        assert_eq!(colors[0], Color::named("red"));
        assert_eq!(colors[1].name, "#00ff00");
        assert_eq!(colors[1].transparency, Some(0.2));
    }

    #[test]
    fn test_parse_hex_token() {
        assert_eq!(parse_hex_token("#ff000080"), Some([255, 0, 0, 128]));
        assert_eq!(parse_hex_token("#00ff00"), Some([0, 255, 0, 255]));
        assert_eq!(parse_hex_token("red"), None);
        assert_eq!(parse_hex_token("#12345"), None);
        assert_eq!(parse_hex_token("#gg0000"), None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_hex_token_parses_back(r in any::<u8>(), g in any::<u8>(), b in any::<u8>(), t in 0.0f64..=1.0) {
                let color = Color {
                    name: "c".into(),
                    hex: Some(format!("{r:02x}{g:02x}{b:02x}")),
                    transparency: Some(t),
                };
                let rgba = parse_hex_token(&color.hex_token());
                prop_assert!(rgba.is_some());
                let rgba = rgba.unwrap_or_default();
                prop_assert_eq!(&rgba[..3], &[r, g, b][..]);
            }
        }
    }
}
