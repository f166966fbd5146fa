use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    assets::{
        files::{displace_existing, require_exists},
        png::{load_rgba, write_png_atomic},
    },
    foundation::error::{ReskinError, ReskinResult},
    frames::{
        apply::{ApplyReport, ApplyRequest, apply_frames},
        select::{list_frames, select_frames},
    },
    media::ffmpeg::{DEFAULT_MAX_DIM, MAX_UPLOAD_BYTES, extract_frames},
    pipeline::{
        config::{BatchConfig, BatchItem},
        generate::{VideoRequest, generate_video, remove_backgrounds},
        presets::GenerationPresets,
    },
    remote::{client::JobApi, pool::run_bounded},
    sprite::{align::FrameAligner, bounds::KeyColor},
};

/// Which stages a batch run executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stages {
    pub video: bool,
    pub extract: bool,
    pub bg_remove: bool,
    pub apply: bool,
}

/// Command-line stage selection before it is folded into [`Stages`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StageFlags {
    pub make_videos: bool,
    pub make_frames: bool,
    pub apply_sprites: bool,
    pub skip_video: bool,
    pub skip_extract: bool,
    pub skip_bg_remove: bool,
}

impl Stages {
    /// Mode flags win over skip flags: `apply_sprites` runs only apply, `make_videos` only
    /// video, `make_frames` extract and bg-remove. Without a mode, everything but apply runs.
    pub fn from_flags(f: StageFlags) -> Self {
        if f.apply_sprites {
            Self {
                video: false,
                extract: false,
                bg_remove: false,
                apply: true,
            }
        } else if f.make_videos {
            Self {
                video: true,
                extract: false,
                bg_remove: false,
                apply: false,
            }
        } else if f.make_frames {
            Self {
                video: false,
                extract: true,
                bg_remove: true,
                apply: false,
            }
        } else {
            Self {
                video: !f.skip_video,
                extract: !f.skip_extract,
                bg_remove: !f.skip_bg_remove,
                apply: false,
            }
        }
    }

    pub fn needs_remote(&self) -> bool {
        self.video || self.bg_remove
    }
}

/// Where batch artifacts live under the output root.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn video(&self, name: &str) -> PathBuf {
        self.root.join("video").join(format!("{name}.mp4"))
    }

    pub fn raw_frames(&self, name: &str) -> PathBuf {
        self.root.join("frames").join(format!("{name}_raw"))
    }

    pub fn no_bg_frames(&self, name: &str) -> PathBuf {
        self.root.join("frames").join(format!("{name}_no_bg"))
    }

    pub fn final_frames(&self, name: &str) -> PathBuf {
        self.root.join("frames").join("final").join(name)
    }

    pub fn padded(&self, name: &str) -> PathBuf {
        self.root.join("padded").join(format!("{name}.png"))
    }

    /// Frames to align: background-removed when present, else raw.
    pub fn apply_source(&self, name: &str) -> PathBuf {
        let no_bg = self.no_bg_frames(name);
        if no_bg.is_dir() {
            no_bg
        } else {
            self.raw_frames(name)
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub videos: Vec<PathBuf>,
    pub extracted: Vec<(String, usize)>,
    pub bg_removed: Vec<(String, usize)>,
    pub applied: Vec<(String, ApplyReport)>,
    pub skipped: Vec<String>,
}

pub struct BatchRunner<'a> {
    pub project_root: PathBuf,
    pub config: &'a BatchConfig,
    pub presets: &'a GenerationPresets,
    /// Required when a remote stage runs.
    pub api: Option<&'a dyn JobApi>,
    pub stages: Stages,
}

impl BatchRunner<'_> {
    fn path(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.project_root.join(p)
        }
    }

    fn api(&self) -> ReskinResult<&dyn JobApi> {
        self.api
            .ok_or_else(|| ReskinError::precondition("remote stages need a generation client"))
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.path(&self.config.global.output_root))
    }

    fn poll(&self) -> Duration {
        Duration::from_secs_f64(self.config.global.poll_seconds)
    }

    #[tracing::instrument(skip_all, fields(stages = ?self.stages))]
    pub fn run(&self, only: &[String]) -> ReskinResult<BatchReport> {
        let items = self.config.items(only)?;
        let mut report = BatchReport::default();
        if items.is_empty() {
            tracing::warn!("no runnable animations");
            return Ok(report);
        }

        if self.stages.video {
            report.videos = self.make_videos(&items)?;
        }
        for item in &items {
            if self.stages.extract {
                let frames = extract_frames(
                    &self.layout().video(&item.name),
                    item.extract_fps,
                    &self.layout().raw_frames(&item.name),
                )?;
                report.extracted.push((item.name.clone(), frames.len()));
            }
            if self.stages.bg_remove && item.bg_remove {
                let done = remove_backgrounds(
                    self.api()?,
                    self.presets,
                    &self.layout().raw_frames(&item.name),
                    &self.layout().no_bg_frames(&item.name),
                    self.config.global.workers,
                    self.poll(),
                )?;
                report.bg_removed.push((item.name.clone(), done.len()));
            }
            if self.stages.apply {
                match self.apply_item(item)? {
                    Some(applied) => report.applied.push((item.name.clone(), applied)),
                    None => report.skipped.push(item.name.clone()),
                }
            }
        }
        Ok(report)
    }

    /// Still image submitted for `item`: the anchor, padded into `padded/<name>.png` when
    /// the item asks for padding.
    pub fn video_input(&self, item: &BatchItem) -> ReskinResult<PathBuf> {
        let anchor = self
            .config
            .global
            .anchor_image
            .as_deref()
            .ok_or_else(|| ReskinError::config("global.anchor_image is required"))?;
        let anchor = self.path(anchor);
        require_exists(&anchor, "anchor image")?;
        if !item.padding.is_set() {
            return Ok(anchor);
        }

        let src = load_rgba(&anchor)?;
        let padding = item.padding.resolve(src.width(), src.height());
        let padded = padding.apply(&src, item.pad_color);
        let dest = self.layout().padded(&item.name);
        displace_existing(&dest)?;
        write_png_atomic(&padded, &dest)?;
        tracing::info!(name = %item.name, ?padding, "padded anchor");
        Ok(dest)
    }

    fn make_videos(&self, items: &[BatchItem]) -> ReskinResult<Vec<PathBuf>> {
        let api = self.api()?;
        let mut jobs = Vec::with_capacity(items.len());
        for item in items {
            let image = self.video_input(item)?;
            let dest = self.layout().video(&item.name);
            let req = VideoRequest {
                image,
                prompt: item.prompt.clone(),
                negative: item.negative.clone(),
                resolution: item.resolution.clone(),
                duration: item.duration.clone(),
                preset: None,
                constraints: None,
                end_image: item.end_image.as_deref().map(|p| self.path(p)),
                max_bytes: MAX_UPLOAD_BYTES,
                max_dim: DEFAULT_MAX_DIM,
                poll: self.poll(),
            };
            jobs.push((req, dest));
        }
        run_bounded(self.config.global.workers, &jobs, |(req, dest)| {
            generate_video(api, self.presets, req, dest)
        })
    }

    /// Align the selected frames of `item` into its destination. `None` when the item has
    /// no frame selection.
    pub fn apply_item(&self, item: &BatchItem) -> ReskinResult<Option<ApplyReport>> {
        let Some(labels) = item.frame_indices.as_deref() else {
            tracing::warn!(name = %item.name, "skipping sprite apply (missing frame_indices)");
            return Ok(None);
        };
        let match_path = item
            .match_sprite
            .as_deref()
            .ok_or_else(|| {
                ReskinError::config(format!("{}: no match sprite configured", item.name))
            })?;
        let match_img = load_rgba(&self.path(match_path))?;

        let layout = self.layout();
        let candidates = list_frames(&layout.apply_source(&item.name))?;
        let frames = select_frames(&candidates, labels)?;

        let scale_ref_path = match &self.config.global.scale_ref {
            Some(p) => self.path(p),
            None => frames
                .first()
                .cloned()
                .ok_or_else(|| ReskinError::validation("no frames selected"))?,
        };
        let scale_ref = load_rgba(&scale_ref_path)?;
        let aligner = FrameAligner::baseline(
            &match_img,
            &scale_ref,
            item.scale_multiplier,
            KeyColor::default(),
            item.flip_h,
        )?;

        let dest_dir = match &item.dest_dir {
            Some(d) => self.path(d),
            None => layout.final_frames(&item.name),
        };
        let req = ApplyRequest {
            frames: &frames,
            dest_dir: &dest_dir,
            prefix: &item.prefix,
            naming: item.naming.clone(),
            backup: item.dest_dir.is_some(),
        };
        apply_frames(&req, &aligner).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
