use std::{fmt, str::FromStr};

use crate::foundation::error::{ReskinError, ReskinResult};

/// Fixed output rectangle, taken from a reference ("match") sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> ReskinResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReskinError::validation("canvas width/height must be non-zero"));
        }
        Ok(Self { width, height })
    }

    pub fn of(img: &image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self { width, height }
    }
}

/// Axis-aligned pixel rectangle. `x1` and `y1` are exclusive, so a single pixel at
/// `(x, y)` is `Bounds { x0: x, y0: y, x1: x + 1, y1: y + 1 }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Bounds {
    pub fn width(self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }
}

/// Straight (non-premultiplied) RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// `#00b140`, the green-screen fill used throughout the pipeline.
    pub const CHROMA_GREEN: Rgb = Rgb::new(0, 177, 64);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional, surrounding whitespace is ignored).
    pub fn parse_hex(value: &str) -> ReskinResult<Self> {
        let cleaned = value.trim().trim_start_matches('#');
        if cleaned.len() != 6 || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ReskinError::validation(format!(
                "expected 6-digit hex color, got '{value}'"
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&cleaned[i..i + 2], 16)
                .map_err(|e| ReskinError::validation(format!("bad hex color '{value}': {e}")))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn opaque(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::CHROMA_GREEN
    }
}

impl FromStr for Rgb {
    type Err = ReskinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ReskinError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
