use image::{RgbaImage, imageops};

use crate::{
    foundation::core::Canvas,
    foundation::error::{ReskinError, ReskinResult},
    sprite::bounds::{KeyColor, visible_bounds},
    sprite::metrics::{ReferenceMetrics, scale_factor, scaled_size, visible_height},
    sprite::place::{CanvasFill, OverflowMode, PlaceOptions, compose},
};

/// Turns source frames into canvas-sized sprites matching a reference.
#[derive(Clone, Debug)]
pub enum FrameAligner {
    /// Crop to visible content, scale by one shared factor and foot-align on the reference
    /// baseline.
    Baseline {
        reference: ReferenceMetrics,
        scale: f64,
        key: KeyColor,
        opts: PlaceOptions,
    },
    /// Skip bounds and scale; stretch the whole source onto the canvas.
    Canvas { canvas: Canvas, flip_h: bool },
}

impl FrameAligner {
    /// Baseline aligner with clipping overflow and a transparent background.
    pub fn baseline(
        match_img: &RgbaImage,
        scale_ref_img: &RgbaImage,
        multiplier: f64,
        key: KeyColor,
        flip_h: bool,
    ) -> ReskinResult<Self> {
        let reference = ReferenceMetrics::measure(match_img, &key, "match sprite")?;
        let ref_h = visible_height(scale_ref_img, &key, "scale reference")?;
        let scale = scale_factor(reference.visible_height, ref_h, multiplier)?;
        tracing::debug!(
            visible_height = reference.visible_height,
            baseline_pad = reference.baseline_pad,
            scale,
            "measured match sprite"
        );
        Ok(Self::Baseline {
            reference,
            scale,
            key,
            opts: PlaceOptions {
                overflow: OverflowMode::Clip {
                    max_height: reference.visible_height,
                },
                flip_h,
                fill: CanvasFill::Transparent,
            },
        })
    }

    pub fn canvas(canvas: Canvas, flip_h: bool) -> Self {
        Self::Canvas { canvas, flip_h }
    }

    pub fn target(&self) -> Canvas {
        match self {
            Self::Baseline { reference, .. } => reference.canvas,
            Self::Canvas { canvas, .. } => *canvas,
        }
    }

    pub fn align(&self, src: &RgbaImage) -> ReskinResult<RgbaImage> {
        match self {
            Self::Baseline {
                reference,
                scale,
                key,
                opts,
            } => {
                let bounds = visible_bounds(src, key).ok_or_else(|| {
                    ReskinError::validation("no visible pixels after green-screen mask")
                })?;
                let cropped =
                    imageops::crop_imm(src, bounds.x0, bounds.y0, bounds.width(), bounds.height())
                        .to_image();
                let (w, h) = scaled_size(cropped.width(), cropped.height(), *scale);
                let scaled = imageops::resize(&cropped, w, h, imageops::FilterType::Lanczos3);
                compose(scaled, reference.canvas, reference.baseline_pad, opts)
            }
            Self::Canvas { canvas, flip_h } => {
                let mut img = if src.dimensions() == (canvas.width, canvas.height) {
                    src.clone()
                } else {
                    imageops::resize(
                        src,
                        canvas.width,
                        canvas.height,
                        imageops::FilterType::Lanczos3,
                    )
                };
                if *flip_h {
                    imageops::flip_horizontal_in_place(&mut img);
                }
                Ok(img)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sprite/align.rs"]
mod tests;
