use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context as _;

use crate::{
    assets::{
        files::{list_files_with_ext, require_exists},
        png::{load_rgba, write_png_atomic},
    },
    foundation::error::{ReskinError, ReskinResult},
};

/// Largest upload the remote service accepts inline.
pub const MAX_UPLOAD_BYTES: u64 = 10_485_760;
/// First max-dimension tried when an upload has to be shrunk.
pub const DEFAULT_MAX_DIM: u32 = 1024;

const SHRINK_STEP: f64 = 0.85;
const SHRINK_ATTEMPTS: usize = 6;
const SHRINK_FLOOR: u32 = 256;

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Sample `video` at `fps` into `out_dir/frame_%03d.png` and return the written frames.
#[tracing::instrument(skip_all, fields(video = %video.display(), fps))]
pub fn extract_frames(video: &Path, fps: u32, out_dir: &Path) -> ReskinResult<Vec<PathBuf>> {
    if fps == 0 {
        return Err(ReskinError::validation("extract fps must be non-zero"));
    }
    require_exists(video, "video")?;
    if !is_ffmpeg_on_path() {
        return Err(ReskinError::tool(
            "ffmpeg is required for frame extraction, but was not found on PATH",
        ));
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create frame directory '{}'", out_dir.display()))?;
    let removed = clear_frames(out_dir)?;
    if removed > 0 {
        tracing::debug!(removed, dir = %out_dir.display(), "removed frames from a previous run");
    }

    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-i"])
        .arg(video)
        .args(["-vf", &format!("fps={fps}")])
        .arg(out_dir.join("frame_%03d.png"))
        .stdout(Stdio::null())
        .output()
        .map_err(|e| ReskinError::tool(format!("failed to run ffmpeg: {e}")))?;
    if !out.status.success() {
        return Err(ReskinError::tool(format!(
            "ffmpeg frame extraction failed for '{}' (status {}): {}",
            video.display(),
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frames = list_files_with_ext(out_dir, &["png"])?;
    tracing::info!(count = frames.len(), dir = %out_dir.display(), "extracted frames");
    Ok(frames)
}

/// Delete `frame_*.png` files directly inside `dir`; other files are left alone.
pub fn clear_frames(dir: &Path) -> ReskinResult<usize> {
    let mut removed = 0;
    for path in list_files_with_ext(dir, &["png"])? {
        let is_frame = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with("frame_"));
        if is_frame {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove stale frame '{}'", path.display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Return `path` when it is already small enough, otherwise a downscaled PNG copy under
/// `<dir>/_resized/<stem>_max<dim>.png` that fits in `max_bytes`.
///
/// The longest side starts at `max_dim` and shrinks by 15% per attempt.
pub fn shrink_for_upload(path: &Path, max_bytes: u64, max_dim: u32) -> ReskinResult<PathBuf> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("stat '{}'", path.display()))?
        .len();
    if size <= max_bytes {
        return Ok(path.to_path_buf());
    }

    let src = load_rgba(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let resized_dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("_resized");

    let mut dim = max_dim;
    for _ in 0..SHRINK_ATTEMPTS {
        let out_path = resized_dir.join(format!("{stem}_max{dim}.png"));
        let (w, h) = fit_within(src.width(), src.height(), dim);
        let resized = if (w, h) == src.dimensions() {
            src.clone()
        } else {
            image::imageops::resize(&src, w, h, image::imageops::FilterType::Lanczos3)
        };
        write_png_atomic(&resized, &out_path)?;

        let written = std::fs::metadata(&out_path)
            .with_context(|| format!("stat '{}'", out_path.display()))?
            .len();
        tracing::debug!(dim, bytes = written, "shrunk upload candidate");
        if written <= max_bytes {
            return Ok(out_path);
        }

        dim = (f64::from(dim) * SHRINK_STEP) as u32;
        if dim < SHRINK_FLOOR {
            break;
        }
    }

    Err(ReskinError::validation(format!(
        "resized PNG of '{}' still exceeds max upload size of {max_bytes} bytes; \
         reduce input dimensions or raise the limit",
        path.display()
    )))
}

/// Scale `(w, h)` down so the longest side is at most `max_dim`, keeping the aspect ratio.
pub fn fit_within(w: u32, h: u32, max_dim: u32) -> (u32, u32) {
    let longest = w.max(h);
    if longest <= max_dim || max_dim == 0 {
        return (w.max(1), h.max(1));
    }
    let factor = f64::from(max_dim) / f64::from(longest);
    let scale = |v: u32| ((f64::from(v) * factor).round() as u32).max(1);
    (scale(w), scale(h))
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
