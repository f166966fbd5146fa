use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    assets::files::list_files_with_ext,
    foundation::error::{ReskinError, ReskinResult},
};

/// Numeric label embedded in a frame file name: the first run of digits in the stem, or 0
/// when there is none. `None` when the digit run does not fit in a `u64`.
pub fn frame_label(path: &Path) -> Option<u64> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let digits: String = stem
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse().ok()
}

/// Parse an index spec such as `"2,4-6,8"`. Ranges are inclusive and may descend
/// (`"6-4"` yields `[6, 5, 4]`). Empty parts are ignored.
pub fn parse_index_spec(spec: &str) -> ReskinResult<Vec<u32>> {
    let parse_num = |s: &str| {
        s.trim().parse::<u32>().map_err(|_| {
            ReskinError::validation(format!("invalid frame index '{}' in '{spec}'", s.trim()))
        })
    };

    let mut out = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse_num(start)?, parse_num(end)?);
                if start <= end {
                    out.extend(start..=end);
                } else {
                    out.extend((end..=start).rev());
                }
            }
            None => out.push(parse_num(part)?),
        }
    }
    Ok(out)
}

/// PNG frames in `dir`, ordered by embedded label (ties broken by file name).
pub fn list_frames(dir: &Path) -> ReskinResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ReskinError::precondition(format!(
            "input folder not found: {}",
            dir.display()
        )));
    }
    let mut files: Vec<PathBuf> = list_files_with_ext(dir, &["png"])?
        .into_iter()
        .filter(|p| {
            let labelled = frame_label(p).is_some();
            if !labelled {
                tracing::warn!(path = %p.display(), "skipping frame with out-of-range label");
            }
            labelled
        })
        .collect();
    files.sort_by_key(|p| frame_label(p));
    if files.is_empty() {
        return Err(ReskinError::precondition(format!(
            "no PNG frames found in {}",
            dir.display()
        )));
    }
    Ok(files)
}

/// Resolve requested labels to frame paths, in request order.
pub fn select_frames(candidates: &[PathBuf], labels: &[u32]) -> ReskinResult<Vec<PathBuf>> {
    let by_label: HashMap<u64, &PathBuf> = candidates
        .iter()
        .filter_map(|p| frame_label(p).map(|label| (label, p)))
        .collect();
    labels
        .iter()
        .map(|label| {
            by_label
                .get(&u64::from(*label))
                .map(|p| (*p).clone())
                .ok_or_else(|| ReskinError::validation(format!("frame label not found: {label}")))
        })
        .collect()
}

/// How destination files are named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputNaming {
    /// `<prefix><start + i>.png`, zero-padded to `width`.
    Sequential { start: u32, width: usize },
    /// `<prefix><indices[i]>.png`, zero-padded to `width`.
    Explicit { indices: Vec<u32>, width: usize },
    /// `<prefix>.png`; exactly one frame.
    Single,
}

impl OutputNaming {
    /// File names for `count` selected frames.
    pub fn names(&self, prefix: &str, count: usize) -> ReskinResult<Vec<String>> {
        match self {
            Self::Sequential { start, width } => {
                let (start, width) = (*start as usize, *width);
                Ok((0..count)
                    .map(|i| format!("{prefix}{:0width$}.png", start + i))
                    .collect())
            }
            Self::Explicit { indices, width } => {
                let width = *width;
                if indices.len() != count {
                    return Err(ReskinError::validation(format!(
                        "output indices count does not match selected frames ({} != {count})",
                        indices.len()
                    )));
                }
                Ok(indices
                    .iter()
                    .map(|i| format!("{prefix}{i:0width$}.png"))
                    .collect())
            }
            Self::Single => {
                if count != 1 {
                    return Err(ReskinError::validation(format!(
                        "single-frame mode requires exactly one selected frame, got {count}"
                    )));
                }
                Ok(vec![format!("{prefix}.png")])
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frames/select.rs"]
mod tests;
