use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ReskinError, ReskinResult};

pub fn ensure_parent_dir(path: &Path) -> ReskinResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

pub fn require_exists(path: &Path, what: &str) -> ReskinResult<()> {
    if !path.exists() {
        return Err(ReskinError::precondition(format!(
            "{what} not found: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Local timestamp used in backup names, e.g. `20260119_154501`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Move an existing file aside to `<stem>_prev_<timestamp><ext>`.
///
/// Returns the new location, or `None` when there was nothing to move.
pub fn displace_existing(path: &Path) -> ReskinResult<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let backup = path.with_file_name(format!("{stem}_prev_{}{ext}", timestamp()));
    std::fs::rename(path, &backup).with_context(|| {
        format!(
            "move '{}' aside to '{}'",
            path.display(),
            backup.display()
        )
    })?;
    tracing::info!(from = %path.display(), to = %backup.display(), "kept previous file");
    Ok(Some(backup))
}

/// Files directly inside `dir` whose extension matches one of `exts` (case-insensitive),
/// sorted by file name.
pub fn list_files_with_ext(dir: &Path, exts: &[&str]) -> ReskinResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("read entry in '{}'", dir.display()))?
            .path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|e| exts.contains(&e.as_str()));
        if matches {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// A single image, or every png/jpg/jpeg directly inside a directory.
pub fn image_inputs(path: &Path) -> ReskinResult<Vec<PathBuf>> {
    if path.is_dir() {
        list_files_with_ext(path, &["png", "jpg", "jpeg"])
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/files.rs"]
mod tests;
