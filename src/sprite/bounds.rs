use image::{GrayImage, Luma, RgbaImage};

use crate::foundation::core::{Bounds, Rgb};

/// Default per-channel tolerance around the key color.
pub const DEFAULT_TOLERANCE: u8 = 12;

/// Background ("green-screen") color plus a per-channel tolerance.
///
/// A pixel matches when every one of its R/G/B channels lies within `tolerance` of the
/// corresponding key channel. This single metric is used for both bounds extraction and
/// flood-fill keying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyColor {
    pub rgb: Rgb,
    pub tolerance: u8,
}

impl Default for KeyColor {
    fn default() -> Self {
        Self {
            rgb: Rgb::CHROMA_GREEN,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl KeyColor {
    pub fn new(rgb: Rgb, tolerance: u8) -> Self {
        Self { rgb, tolerance }
    }

    pub fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        r.abs_diff(self.rgb.r) <= self.tolerance
            && g.abs_diff(self.rgb.g) <= self.tolerance
            && b.abs_diff(self.rgb.b) <= self.tolerance
    }

    /// Transparent pixels and key-colored pixels are background.
    pub fn is_background(&self, px: &image::Rgba<u8>) -> bool {
        let [r, g, b, a] = px.0;
        a == 0 || self.matches(r, g, b)
    }
}

/// Binary foreground mask: 0 for background, 255 for foreground.
pub fn visible_mask(img: &RgbaImage, key: &KeyColor) -> GrayImage {
    let (w, h) = img.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (x, y, px) in img.enumerate_pixels() {
        if !key.is_background(px) {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask
}

/// Tight bounds of all non-zero mask pixels, or `None` for an empty mask.
pub fn mask_bounds(mask: &GrayImage) -> Option<Bounds> {
    let mut acc: Option<Bounds> = None;
    for (x, y, px) in mask.enumerate_pixels() {
        if px.0[0] == 0 {
            continue;
        }
        acc = Some(match acc {
            None => Bounds {
                x0: x,
                y0: y,
                x1: x + 1,
                y1: y + 1,
            },
            Some(b) => Bounds {
                x0: b.x0.min(x),
                y0: b.y0.min(y),
                x1: b.x1.max(x + 1),
                y1: b.y1.max(y + 1),
            },
        });
    }
    acc
}

/// Bounds of pixels that are neither transparent nor within tolerance of the key color.
pub fn visible_bounds(img: &RgbaImage, key: &KeyColor) -> Option<Bounds> {
    mask_bounds(&visible_mask(img, key))
}

/// Bounds of pixels with non-zero alpha.
pub fn alpha_bounds(img: &RgbaImage) -> Option<Bounds> {
    let (w, h) = img.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (x, y, px) in img.enumerate_pixels() {
        if px.0[3] != 0 {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask_bounds(&mask)
}

#[cfg(test)]
#[path = "../../tests/unit/sprite/bounds.rs"]
mod tests;
