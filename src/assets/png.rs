use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;

use crate::{
    assets::files::ensure_parent_dir,
    foundation::error::{ReskinError, ReskinResult},
};

/// Decode any supported image file to straight RGBA8.
pub fn load_rgba(path: &Path) -> ReskinResult<RgbaImage> {
    if !path.exists() {
        return Err(ReskinError::precondition(format!(
            "image not found: {}",
            path.display()
        )));
    }
    let img = image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img.to_rgba8())
}

/// Decode encoded image bytes to straight RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> ReskinResult<RgbaImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(img.to_rgba8())
}

/// A fully written temp file waiting to be renamed over its destination.
///
/// Dropping without [`Staged::commit`] removes the temp file and leaves the destination
/// exactly as it was.
#[derive(Debug)]
pub struct Staged {
    tmp: Option<PathBuf>,
    dest: PathBuf,
}

impl Staged {
    pub fn temp_path(&self) -> Option<&Path> {
        self.tmp.as_deref()
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn commit(mut self) -> ReskinResult<()> {
        let Some(tmp) = self.tmp.as_deref() else {
            return Ok(());
        };
        std::fs::rename(tmp, &self.dest).with_context(|| {
            format!(
                "move '{}' into place at '{}'",
                tmp.display(),
                self.dest.display()
            )
        })?;
        self.tmp = None;
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if let Some(path) = self.tmp.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Hidden sibling temp path: `dir/.<name>.tmp<suffix>`.
pub fn temp_sibling(dest: &Path, suffix: &str) -> ReskinResult<PathBuf> {
    let name = dest
        .file_name()
        .ok_or_else(|| {
            ReskinError::validation(format!("'{}' has no file name", dest.display()))
        })?
        .to_string_lossy();
    Ok(dest.with_file_name(format!(".{name}.tmp{suffix}")))
}

/// Encode `img` as PNG next to `dest` without touching `dest`.
pub fn stage_png(img: &RgbaImage, dest: &Path) -> ReskinResult<Staged> {
    ensure_parent_dir(dest)?;
    let tmp = temp_sibling(dest, ".png")?;
    let staged = Staged {
        tmp: Some(tmp.clone()),
        dest: dest.to_path_buf(),
    };
    img.save_with_format(&tmp, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", tmp.display()))?;
    Ok(staged)
}

/// Write bytes next to `dest` without touching `dest`.
pub fn stage_bytes(bytes: &[u8], dest: &Path) -> ReskinResult<Staged> {
    ensure_parent_dir(dest)?;
    let tmp = temp_sibling(dest, "")?;
    let staged = Staged {
        tmp: Some(tmp.clone()),
        dest: dest.to_path_buf(),
    };
    std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
    Ok(staged)
}

/// Write a PNG so that `dest` is either the old file or the complete new one.
pub fn write_png_atomic(img: &RgbaImage, dest: &Path) -> ReskinResult<()> {
    stage_png(img, dest)?.commit()
}

pub fn write_bytes_atomic(bytes: &[u8], dest: &Path) -> ReskinResult<()> {
    stage_bytes(bytes, dest)?.commit()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/png.rs"]
mod tests;
