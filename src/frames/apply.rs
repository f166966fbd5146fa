use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use regex::Regex;

use crate::{
    assets::files::timestamp,
    assets::png::{load_rgba, write_png_atomic},
    foundation::{
        core::Canvas,
        error::{ReskinError, ReskinResult},
    },
    frames::select::OutputNaming,
    sprite::align::FrameAligner,
};

/// Write selected frames into a sprite folder.
#[derive(Clone, Debug)]
pub struct ApplyRequest<'a> {
    pub frames: &'a [PathBuf],
    pub dest_dir: &'a Path,
    pub prefix: &'a str,
    pub naming: OutputNaming,
    /// Move previous numbered files into `_backup_<timestamp>/` first.
    pub backup: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ApplyReport {
    pub written: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    /// Size of every written frame.
    pub canvas: Option<Canvas>,
}

/// Names this run owns in the destination: numbered files of exactly `width` digits, or
/// any digit count in single-frame mode.
pub fn numbered_pattern(prefix: &str, naming: &OutputNaming) -> ReskinResult<Regex> {
    let digits = match naming {
        OutputNaming::Sequential { width, .. } | OutputNaming::Explicit { width, .. } => {
            format!(r"\d{{{width}}}")
        }
        OutputNaming::Single => r"\d+".to_string(),
    };
    let src = format!(r"^{}{digits}\.png$", regex::escape(prefix));
    Regex::new(&src)
        .map_err(|e| ReskinError::validation(format!("bad output name pattern '{src}': {e}")))
}

fn matching_files(dir: &Path, pattern: &Regex) -> ReskinResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("read entry in '{}'", dir.display()))?
            .path();
        let name_matches = path
            .file_name()
            .is_some_and(|n| pattern.is_match(&n.to_string_lossy()));
        if path.is_file() && name_matches {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Delete files matching `pattern` whose names are not in `expected`.
pub fn prune_stale(
    dir: &Path,
    pattern: &Regex,
    expected: &BTreeSet<String>,
) -> ReskinResult<Vec<PathBuf>> {
    let mut pruned = Vec::new();
    for path in matching_files(dir, pattern)? {
        let keep = path
            .file_name()
            .is_some_and(|n| expected.contains(n.to_string_lossy().as_ref()));
        if keep {
            continue;
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("remove stale frame '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), "pruned stale frame");
        pruned.push(path);
    }
    Ok(pruned)
}

/// Move files matching `pattern` into a fresh `_backup_<timestamp>` folder inside `dir`.
pub fn backup_matching(dir: &Path, pattern: &Regex) -> ReskinResult<Option<PathBuf>> {
    let files = matching_files(dir, pattern)?;
    if files.is_empty() {
        return Ok(None);
    }
    let backup_dir = dir.join(format!("_backup_{}", timestamp()));
    std::fs::create_dir_all(&backup_dir)
        .with_context(|| format!("create backup folder '{}'", backup_dir.display()))?;
    for path in files {
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = backup_dir.join(name);
        std::fs::rename(&path, &target)
            .with_context(|| format!("back up '{}'", path.display()))?;
    }
    tracing::info!(dir = %backup_dir.display(), "backed up previous frames");
    Ok(Some(backup_dir))
}

/// Align every selected frame and write it under its output name.
///
/// Names are validated before anything in the destination changes. Stale numbered files
/// for this prefix are removed, so afterwards the prefix's numbered set is exactly the
/// expected set.
#[tracing::instrument(skip(req, aligner), fields(dest = %req.dest_dir.display(), frames = req.frames.len()))]
pub fn apply_frames(req: &ApplyRequest<'_>, aligner: &FrameAligner) -> ReskinResult<ApplyReport> {
    let names = req.naming.names(req.prefix, req.frames.len())?;
    let expected: BTreeSet<String> = names.iter().cloned().collect();

    std::fs::create_dir_all(req.dest_dir)
        .with_context(|| format!("create destination '{}'", req.dest_dir.display()))?;

    let pattern = numbered_pattern(req.prefix, &req.naming)?;
    let mut report = ApplyReport {
        canvas: Some(aligner.target()),
        ..ApplyReport::default()
    };
    if req.backup {
        report.backup_dir = backup_matching(req.dest_dir, &pattern)?;
    }
    report.pruned = prune_stale(req.dest_dir, &pattern, &expected)?;

    for (src, name) in req.frames.iter().zip(&names) {
        let img = load_rgba(src)?;
        let out = aligner
            .align(&img)
            .map_err(|e| match e {
                ReskinError::Validation(msg) => {
                    ReskinError::validation(format!("{msg} ({})", src.display()))
                }
                other => other,
            })?;
        let dest = req.dest_dir.join(name);
        write_png_atomic(&out, &dest)?;
        report.written.push(dest);
    }

    let canvas = aligner.target();
    tracing::info!(
        count = report.written.len(),
        width = canvas.width,
        height = canvas.height,
        "wrote frames"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/frames/apply.rs"]
mod tests;
