use image::{RgbaImage, imageops};

use crate::foundation::core::Rgb;

/// Pixels to add on each side of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

/// Resolve one side of padding. An absolute pixel value wins over a fraction of `size`.
pub fn pad_amount(pct: Option<f64>, px: Option<f64>, size: u32) -> u32 {
    match (px, pct) {
        (Some(px), _) => px.round().max(0.0) as u32,
        (None, Some(pct)) => (pct * f64::from(size)).round().max(0.0) as u32,
        (None, None) => 0,
    }
}

impl Padding {
    /// New image with `fill` around the source, which is copied (not blended) at
    /// `(left, top)`.
    pub fn apply(&self, src: &RgbaImage, fill: Rgb) -> RgbaImage {
        let w = src.width() + self.left + self.right;
        let h = src.height() + self.top + self.bottom;
        let mut out = RgbaImage::from_pixel(w, h, fill.opaque());
        imageops::replace(&mut out, src, i64::from(self.left), i64::from(self.top));
        out
    }
}

/// Paint a solid border of `thickness` pixels along every edge.
pub fn draw_border(img: &mut RgbaImage, thickness: u32, color: Rgb) {
    let (w, h) = img.dimensions();
    if thickness == 0 || w == 0 || h == 0 {
        return;
    }
    let t = thickness.min(w).min(h);
    let px = color.opaque();
    for (x, y, p) in img.enumerate_pixels_mut() {
        if x < t || y < t || x >= w - t || y >= h - t {
            *p = px;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sprite/frame.rs"]
mod tests;
