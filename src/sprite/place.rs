use image::{RgbaImage, imageops};

use crate::{
    foundation::core::{Canvas, Rgb},
    foundation::error::{ReskinError, ReskinResult},
};

/// What to do when scaled content does not fit the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowMode {
    /// Shrink to `max_height` when taller, then crop whatever still spills past the canvas
    /// (center-crop horizontally, drop rows from the top).
    Clip { max_height: u32 },
    /// Content must sit inside the canvas minus `border` pixels on every side.
    Strict { border: u32 },
}

/// Canvas background under the placed content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CanvasFill {
    #[default]
    Transparent,
    /// Content is alpha-composited over an opaque fill.
    Solid(Rgb),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceOptions {
    pub overflow: OverflowMode,
    pub flip_h: bool,
    pub fill: CanvasFill,
}

/// Top-left position of content on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
}

/// Center horizontally, foot-align vertically so the content bottom sits `baseline_pad`
/// pixels above the canvas bottom.
pub fn placement(canvas: Canvas, baseline_pad: u32, content_w: u32, content_h: u32) -> Placement {
    let x = (i64::from(canvas.width) - i64::from(content_w)).div_euclid(2);
    let y = (i64::from(canvas.height) - i64::from(baseline_pad)) - i64::from(content_h);
    Placement { x, y }
}

/// Apply [`OverflowMode::Clip`] to already-scaled content.
pub fn clip_to_canvas(content: RgbaImage, canvas: Canvas, max_height: u32) -> RgbaImage {
    let mut img = content;

    if max_height > 0 && img.height() > max_height {
        let shrink = f64::from(max_height) / f64::from(img.height());
        let w = ((f64::from(img.width()) * shrink).round() as u32).max(1);
        img = imageops::resize(&img, w, max_height, imageops::FilterType::Lanczos3);
    }

    if img.width() > canvas.width {
        let left = (img.width() - canvas.width) / 2;
        img = imageops::crop_imm(&img, left, 0, canvas.width, img.height()).to_image();
    }

    if img.height() > canvas.height {
        let top = img.height() - canvas.height;
        img = imageops::crop_imm(&img, 0, top, img.width(), canvas.height).to_image();
    }

    img
}

/// Reject placements that leave the frame guide's safe interior.
pub fn check_strict(
    at: Placement,
    content_w: u32,
    content_h: u32,
    canvas: Canvas,
    border: u32,
) -> ReskinResult<()> {
    let b = i64::from(border);
    let max_x = i64::from(canvas.width) - b;
    let max_y = i64::from(canvas.height) - b;
    let fits = at.x >= b
        && at.y >= b
        && at.x + i64::from(content_w) <= max_x
        && at.y + i64::from(content_h) <= max_y;
    if !fits {
        return Err(ReskinError::validation(format!(
            "content exceeds frame guide safe area: {content_w}x{content_h} at ({}, {}) on a {}x{} canvas with {border}px border",
            at.x, at.y, canvas.width, canvas.height
        )));
    }
    Ok(())
}

/// Place scaled content on a fresh canvas.
///
/// The flip happens before placement, so an off-center placement keeps its position and
/// only the content is mirrored.
pub fn compose(
    content: RgbaImage,
    canvas: Canvas,
    baseline_pad: u32,
    opts: &PlaceOptions,
) -> ReskinResult<RgbaImage> {
    let content = match opts.overflow {
        OverflowMode::Clip { max_height } => clip_to_canvas(content, canvas, max_height),
        OverflowMode::Strict { .. } => content,
    };

    let at = placement(canvas, baseline_pad, content.width(), content.height());
    if let OverflowMode::Strict { border } = opts.overflow {
        check_strict(at, content.width(), content.height(), canvas, border)?;
    }

    let content = if opts.flip_h {
        imageops::flip_horizontal(&content)
    } else {
        content
    };

    let out = match opts.fill {
        CanvasFill::Transparent => {
            let mut out = RgbaImage::new(canvas.width, canvas.height);
            imageops::replace(&mut out, &content, at.x, at.y);
            out
        }
        CanvasFill::Solid(rgb) => {
            let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, rgb.opaque());
            imageops::overlay(&mut out, &content, at.x, at.y);
            out
        }
    };
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/sprite/place.rs"]
mod tests;
