use image::RgbaImage;

use crate::{
    foundation::core::{Bounds, Canvas},
    foundation::error::{ReskinError, ReskinResult},
    sprite::bounds::{KeyColor, visible_bounds},
};

/// Size and baseline of a reference sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceMetrics {
    pub canvas: Canvas,
    pub bounds: Bounds,
    pub visible_height: u32,
    /// Distance from the canvas bottom edge to the bottom of the visible content.
    pub baseline_pad: u32,
}

impl ReferenceMetrics {
    /// Measure a reference sprite. `label` names the image in error messages.
    pub fn measure(img: &RgbaImage, key: &KeyColor, label: &str) -> ReskinResult<Self> {
        let canvas = Canvas::of(img);
        let bounds = visible_bounds(img, key)
            .ok_or_else(|| ReskinError::validation(format!("no visible pixels found in {label}")))?;
        let visible_height = bounds.height();
        if visible_height == 0 {
            return Err(ReskinError::validation(format!(
                "{label} visible height is invalid"
            )));
        }
        Ok(Self {
            canvas,
            bounds,
            visible_height,
            baseline_pad: canvas.height - bounds.y1,
        })
    }
}

/// Visible height of a scale reference.
pub fn visible_height(img: &RgbaImage, key: &KeyColor, label: &str) -> ReskinResult<u32> {
    ReferenceMetrics::measure(img, key, label).map(|m| m.visible_height)
}

/// `match_visible_height / scale_ref_visible_height * multiplier`.
pub fn scale_factor(
    match_visible_height: u32,
    scale_ref_visible_height: u32,
    multiplier: f64,
) -> ReskinResult<f64> {
    if match_visible_height == 0 || scale_ref_visible_height == 0 {
        return Err(ReskinError::validation(
            "reference visible heights must be > 0 to compute a scale factor",
        ));
    }
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(ReskinError::validation(format!(
            "scale multiplier must be a positive number, got {multiplier}"
        )));
    }
    Ok(f64::from(match_visible_height) / f64::from(scale_ref_visible_height) * multiplier)
}

/// Uniformly scale a size, rounding each side and never going below one pixel.
pub fn scaled_size(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |v: u32| ((f64::from(v) * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

#[cfg(test)]
#[path = "../../tests/unit/sprite/metrics.rs"]
mod tests;
