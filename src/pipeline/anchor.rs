use std::path::{Path, PathBuf};

use image::{RgbaImage, imageops};

use crate::{
    assets::{
        files::list_files_with_ext,
        png::{load_rgba, write_png_atomic},
    },
    foundation::{
        core::Rgb,
        error::{ReskinError, ReskinResult},
    },
    sprite::{
        bounds::{DEFAULT_TOLERANCE, KeyColor, alpha_bounds},
        frame::draw_border,
        keying::clear_corner_background,
        metrics::{ReferenceMetrics, scale_factor, scaled_size},
        place::{CanvasFill, OverflowMode, PlaceOptions, compose},
    },
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorOptions {
    /// Key used to measure the match sprite.
    pub key: KeyColor,
    /// Flat fill behind the placed character.
    pub bg: Rgb,
    pub border_color: Rgb,
    pub border_thickness: u32,
    pub scale_multiplier: f64,
    /// Tolerance for the corner flood fill run on the source.
    pub keying_tolerance: u8,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            key: KeyColor::default(),
            bg: Rgb::CHROMA_GREEN,
            border_color: Rgb::WHITE,
            border_thickness: 2,
            scale_multiplier: 1.0,
            keying_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnchorImages {
    pub base: RgbaImage,
    pub framed: RgbaImage,
}

/// Fit a background-removed character onto the match sprite's canvas and baseline.
///
/// The character must fit inside the border; anything that would be cut off is an error.
pub fn build_anchor(
    mut source: RgbaImage,
    match_img: &RgbaImage,
    opts: &AnchorOptions,
) -> ReskinResult<AnchorImages> {
    let reference = ReferenceMetrics::measure(match_img, &opts.key, "match sprite")?;

    let cleared = clear_corner_background(&mut source, opts.keying_tolerance);
    tracing::debug!(cleared, "cleared corner background");
    let bounds = alpha_bounds(&source)
        .ok_or_else(|| ReskinError::validation("no visible pixels found in input image"))?;
    let cropped = imageops::crop_imm(
        &source,
        bounds.x0,
        bounds.y0,
        bounds.width(),
        bounds.height(),
    )
    .to_image();

    let factor = scale_factor(
        reference.visible_height,
        cropped.height(),
        opts.scale_multiplier,
    )?;
    let (w, h) = scaled_size(cropped.width(), cropped.height(), factor);
    let scaled = imageops::resize(&cropped, w, h, imageops::FilterType::Lanczos3);

    let base = compose(
        scaled,
        reference.canvas,
        reference.baseline_pad,
        &PlaceOptions {
            overflow: OverflowMode::Strict {
                border: opts.border_thickness,
            },
            flip_h: false,
            fill: CanvasFill::Solid(opts.bg),
        },
    )?;
    let mut framed = base.clone();
    draw_border(&mut framed, opts.border_thickness, opts.border_color);
    Ok(AnchorImages { base, framed })
}

/// Write the base anchor and, when requested, the framed one.
pub fn write_anchor(
    images: &AnchorImages,
    base_out: &Path,
    framed_out: Option<&Path>,
) -> ReskinResult<()> {
    write_png_atomic(&images.base, base_out)?;
    tracing::info!(path = %base_out.display(), "saved base anchor");
    if let Some(framed_out) = framed_out {
        write_png_atomic(&images.framed, framed_out)?;
        tracing::info!(path = %framed_out.display(), "saved framed anchor");
    }
    Ok(())
}

/// Paint over a `thickness` border with `fill` in every PNG directly inside `dir`.
pub fn unframe_dir(dir: &Path, thickness: u32, fill: Rgb) -> ReskinResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ReskinError::precondition(format!(
            "input folder not found: {}",
            dir.display()
        )));
    }
    let mut touched = Vec::new();
    if thickness == 0 {
        return Ok(touched);
    }
    for path in list_files_with_ext(dir, &["png"])? {
        let mut img = load_rgba(&path)?;
        draw_border(&mut img, thickness, fill);
        write_png_atomic(&img, &path)?;
        touched.push(path);
    }
    Ok(touched)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/anchor.rs"]
mod tests;
