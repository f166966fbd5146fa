use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::Deserialize;

use crate::{
    assets::files::require_exists,
    foundation::{
        core::Rgb,
        error::{ReskinError, ReskinResult},
    },
    frames::select::{OutputNaming, parse_index_spec},
    sprite::frame::{Padding, pad_amount},
};

/// Batch file: one `[global]` table and any number of `[[animation]]` entries.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub animation: Vec<AnimationConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub anchor_image: Option<PathBuf>,
    pub scale_ref: Option<PathBuf>,
    #[serde(rename = "match")]
    pub match_sprite: Option<PathBuf>,
    pub output_root: PathBuf,
    pub extract_fps: u32,
    pub pad_color: Rgb,
    pub output_width: usize,
    pub constraints: Option<String>,
    pub negative: Option<String>,
    pub resolution: String,
    pub duration: TextOrNumber,
    pub bg_remove: bool,
    pub workers: usize,
    pub poll_seconds: f64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            anchor_image: None,
            scale_ref: None,
            match_sprite: None,
            output_root: PathBuf::from("outputs/fal"),
            extract_fps: 6,
            pad_color: Rgb::CHROMA_GREEN,
            output_width: 2,
            constraints: None,
            negative: None,
            resolution: "1080p".to_owned(),
            duration: TextOrNumber::Text("3".to_owned()),
            bg_remove: true,
            workers: 3,
            poll_seconds: 2.0,
        }
    }
}

/// TOML value that may be written as `"5"` or `5`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for TextOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Frame indices as `"2,4-6"` or `[2, 4, 5, 6]`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IndexList {
    Spec(String),
    List(Vec<u32>),
}

impl IndexList {
    pub fn resolve(&self) -> ReskinResult<Vec<u32>> {
        match self {
            Self::Spec(s) => parse_index_spec(s),
            Self::List(v) => Ok(v.clone()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub name: Option<String>,
    pub enabled: bool,
    pub prompt: Option<String>,
    pub prompt_variations: Vec<String>,
    pub constraints: Option<String>,
    pub negative: Option<String>,
    pub resolution: Option<String>,
    pub duration: Option<TextOrNumber>,
    pub extract_fps: Option<u32>,
    pub bg_remove: Option<bool>,
    pub pad_color: Option<Rgb>,
    pub pad_top_pct: Option<f64>,
    pub pad_bottom_pct: Option<f64>,
    pub pad_left_pct: Option<f64>,
    pub pad_right_pct: Option<f64>,
    pub pad_top_px: Option<f64>,
    pub pad_bottom_px: Option<f64>,
    pub pad_left_px: Option<f64>,
    pub pad_right_px: Option<f64>,
    pub scale_multiplier: Option<f64>,
    pub frame_indices: Option<IndexList>,
    pub output_indices: Option<IndexList>,
    pub output_start: Option<u32>,
    pub output_width: Option<usize>,
    pub dest_dir: Option<PathBuf>,
    pub prefix: String,
    pub single_frame: bool,
    pub flip_h: bool,
    #[serde(rename = "match")]
    pub match_sprite: Option<PathBuf>,
    pub end_image: Option<PathBuf>,
}

/// Per-side padding as fraction of the anchor size or absolute pixels (pixels win).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PadSpec {
    pub top: (Option<f64>, Option<f64>),
    pub bottom: (Option<f64>, Option<f64>),
    pub left: (Option<f64>, Option<f64>),
    pub right: (Option<f64>, Option<f64>),
}

impl PadSpec {
    /// Zero values count as unset.
    pub fn is_set(&self) -> bool {
        [self.top, self.bottom, self.left, self.right]
            .iter()
            .flat_map(|(pct, px)| [pct, px])
            .any(|v| v.is_some_and(|v| v != 0.0))
    }

    pub fn resolve(&self, width: u32, height: u32) -> Padding {
        Padding {
            top: pad_amount(self.top.0, self.top.1, height),
            bottom: pad_amount(self.bottom.0, self.bottom.1, height),
            left: pad_amount(self.left.0, self.left.1, width),
            right: pad_amount(self.right.0, self.right.1, width),
        }
    }
}

/// One runnable animation with every global default applied.
#[derive(Clone, Debug)]
pub struct BatchItem {
    pub name: String,
    /// Prompt with constraints already appended.
    pub prompt: String,
    pub negative: Option<String>,
    pub resolution: String,
    pub duration: String,
    pub extract_fps: u32,
    pub bg_remove: bool,
    pub pad_color: Rgb,
    pub padding: PadSpec,
    pub scale_multiplier: f64,
    pub frame_indices: Option<Vec<u32>>,
    pub naming: OutputNaming,
    pub dest_dir: Option<PathBuf>,
    pub prefix: String,
    pub flip_h: bool,
    pub match_sprite: Option<PathBuf>,
    pub end_image: Option<PathBuf>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl BatchConfig {
    pub fn parse(text: &str) -> ReskinResult<Self> {
        let cfg: Self =
            toml::from_str(text).map_err(|e| ReskinError::config(format!("invalid batch config: {e}")))?;
        if cfg.global.anchor_image.is_none() {
            return Err(ReskinError::config("global.anchor_image is required"));
        }
        if cfg.global.workers == 0 {
            return Err(ReskinError::config("global.workers must be >= 1"));
        }
        if !(cfg.global.poll_seconds.is_finite() && cfg.global.poll_seconds >= 0.0) {
            return Err(ReskinError::config("global.poll_seconds must be >= 0"));
        }
        Ok(cfg)
    }

    pub fn load(path: &Path) -> ReskinResult<Self> {
        require_exists(path, "config")?;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::parse(&text)
    }

    /// Runnable items in file order. Entries without a name are ignored; disabled entries
    /// and entries without a prompt are skipped with a warning. Prompt variations expand
    /// into `<name>_v<i>`. `only` filters by base or expanded name when non-empty.
    pub fn items(&self, only: &[String]) -> ReskinResult<Vec<BatchItem>> {
        let mut out = Vec::new();
        for anim in &self.animation {
            let Some(name) = non_empty(&anim.name) else {
                continue;
            };
            let wanted = |n: &str| only.is_empty() || only.iter().any(|o| o == n);

            if !anim.enabled {
                if wanted(name) {
                    tracing::warn!(name, "skipping (disabled)");
                }
                continue;
            }

            let variants: Vec<(String, &str)> = if anim.prompt_variations.is_empty() {
                match non_empty(&anim.prompt) {
                    Some(p) => vec![(name.to_owned(), p)],
                    None => {
                        if wanted(name) {
                            tracing::warn!(name, "skipping (missing prompt)");
                        }
                        continue;
                    }
                }
            } else {
                anim.prompt_variations
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (format!("{name}_v{}", i + 1), p.as_str()))
                    .collect()
            };

            for (item_name, prompt) in variants {
                if !(wanted(name) || wanted(&item_name)) {
                    continue;
                }
                out.push(self.resolve(anim, item_name, prompt)?);
            }
        }
        Ok(out)
    }

    fn resolve(&self, anim: &AnimationConfig, name: String, prompt: &str) -> ReskinResult<BatchItem> {
        let g = &self.global;
        let prompt = match non_empty(&anim.constraints).or(non_empty(&g.constraints)) {
            Some(c) => format!("{prompt}. {c}"),
            None => prompt.to_owned(),
        };
        let width = anim.output_width.unwrap_or(g.output_width);
        let naming = if anim.single_frame {
            OutputNaming::Single
        } else if let Some(indices) = &anim.output_indices {
            OutputNaming::Explicit {
                indices: indices.resolve()?,
                width,
            }
        } else {
            OutputNaming::Sequential {
                start: anim.output_start.unwrap_or(0),
                width,
            }
        };
        let scale_multiplier = anim.scale_multiplier.unwrap_or(1.0);
        if !(scale_multiplier.is_finite() && scale_multiplier > 0.0) {
            return Err(ReskinError::config(format!(
                "{name}: scale_multiplier must be > 0"
            )));
        }

        Ok(BatchItem {
            prompt,
            negative: non_empty(&anim.negative)
                .or(non_empty(&g.negative))
                .map(str::to_owned),
            resolution: non_empty(&anim.resolution)
                .unwrap_or(g.resolution.as_str())
                .to_owned(),
            duration: anim.duration.as_ref().unwrap_or(&g.duration).to_string(),
            extract_fps: anim.extract_fps.unwrap_or(g.extract_fps),
            bg_remove: anim.bg_remove.unwrap_or(g.bg_remove),
            pad_color: anim.pad_color.unwrap_or(g.pad_color),
            padding: PadSpec {
                top: (anim.pad_top_pct, anim.pad_top_px),
                bottom: (anim.pad_bottom_pct, anim.pad_bottom_px),
                left: (anim.pad_left_pct, anim.pad_left_px),
                right: (anim.pad_right_pct, anim.pad_right_px),
            },
            scale_multiplier,
            frame_indices: anim
                .frame_indices
                .as_ref()
                .map(IndexList::resolve)
                .transpose()?,
            naming,
            dest_dir: anim.dest_dir.clone(),
            prefix: anim.prefix.clone(),
            flip_h: anim.flip_h,
            match_sprite: anim.match_sprite.clone().or_else(|| g.match_sprite.clone()),
            end_image: anim.end_image.clone(),
            name,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
