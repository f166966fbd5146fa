use std::collections::BTreeMap;

use crate::foundation::error::{ReskinError, ReskinResult};

/// Models, defaults and prompt fragments used by the generation commands.
///
/// Passed explicitly to everything that submits jobs.
#[derive(Clone, Debug)]
pub struct GenerationPresets {
    pub image_model: String,
    pub video_model: String,
    pub bg_remove_model: String,
    pub num_images: u32,
    pub image_resolution: String,
    pub output_format: String,
    pub video_resolution: String,
    pub video_duration: String,
    pub default_negative: String,
    /// Allowed aspect ratios in preference order, with their numeric value.
    pub aspect_ratios: Vec<(String, f64)>,
    /// Named constraint blocks appended to video prompts.
    pub constraints: BTreeMap<String, String>,
}

impl Default for GenerationPresets {
    fn default() -> Self {
        let ratio = |name: &str, w: f64, h: f64| (name.to_owned(), w / h);
        Self {
            image_model: "fal-ai/nano-banana-pro/edit".to_owned(),
            video_model: "fal-ai/kling-video/v2.6/pro/image-to-video".to_owned(),
            bg_remove_model: "fal-ai/bria/background/remove".to_owned(),
            num_images: 3,
            image_resolution: "4K".to_owned(),
            output_format: "png".to_owned(),
            video_resolution: "1080p".to_owned(),
            video_duration: "5".to_owned(),
            default_negative: "low resolution, error, worst quality, low quality, defects"
                .to_owned(),
            aspect_ratios: vec![
                ratio("21:9", 21.0, 9.0),
                ratio("16:9", 16.0, 9.0),
                ratio("3:2", 3.0, 2.0),
                ratio("4:3", 4.0, 3.0),
                ratio("5:4", 5.0, 4.0),
                ratio("1:1", 1.0, 1.0),
                ratio("4:5", 4.0, 5.0),
                ratio("3:4", 3.0, 4.0),
                ratio("2:3", 2.0, 3.0),
                ratio("9:16", 9.0, 16.0),
            ],
            constraints: BTreeMap::from([(
                "walk_horizontal".to_owned(),
                "walks straight left-to-right on a flat horizontal ground line, \
                 no diagonal drift, feet stay on the same baseline, \
                 no camera movement or tilt, no zoom"
                    .to_owned(),
            )]),
        }
    }
}

impl GenerationPresets {
    /// Closest allowed ratio to `width / height`; earlier entries win ties.
    pub fn nearest_aspect_ratio(&self, width: u32, height: u32) -> String {
        if height == 0 {
            return "1:1".to_owned();
        }
        let target = f64::from(width) / f64::from(height);
        let mut best = ("1:1", f64::INFINITY);
        for (name, value) in &self.aspect_ratios {
            let delta = (target - value).abs();
            if delta < best.1 {
                best = (name.as_str(), delta);
            }
        }
        best.0.to_owned()
    }

    pub fn constraint(&self, preset: &str) -> ReskinResult<&str> {
        self.constraints.get(preset).map(String::as_str).ok_or_else(|| {
            let known: Vec<&str> = self.constraints.keys().map(String::as_str).collect();
            ReskinError::validation(format!(
                "unknown prompt preset '{preset}' (known: {})",
                known.join(", ")
            ))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/presets.rs"]
mod tests;
