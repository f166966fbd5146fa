use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::ReskinResult;

/// Fields read from a reskin task markdown file. Placeholders (`TBD`, empty) are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskSpec {
    pub source: Option<String>,
    pub prompt: Option<String>,
    pub negative: Option<String>,
    pub references: Vec<String>,
    pub size: Option<(u32, u32)>,
}

/// `None` for missing, blank, or `TBD` (any case) values.
pub fn resolve_text(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("TBD") {
        None
    } else {
        Some(v.to_owned())
    }
}

/// Split a `;`/`,` separated reference list.
pub fn split_references(value: &str) -> Vec<String> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("TBD") {
        return Vec::new();
    }
    v.split([';', ','])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `"WxH"` in pixels.
pub fn parse_size(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.trim().split_once('x')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(w) || !all_digits(h) {
        return None;
    }
    Some((w.parse().ok()?, h.parse().ok()?))
}

pub fn parse_task(text: &str) -> TaskSpec {
    let mut spec = TaskSpec::default();
    for line in text.lines().map(str::trim) {
        let value = |key: &str| line.strip_prefix(key).map(str::trim);
        if let Some(v) = value("Source:") {
            spec.source = resolve_text(Some(v));
        } else if let Some(v) = value("- Prompt:") {
            spec.prompt = resolve_text(Some(v));
        } else if let Some(v) = value("- Negative Prompt:") {
            spec.negative = resolve_text(Some(v));
        } else if let Some(v) = value("- Reference Images:") {
            spec.references = split_references(v);
        } else if let Some(v) = value("Size(px):") {
            spec.size = parse_size(v);
        }
    }
    spec
}

pub fn load_task(path: &Path) -> ReskinResult<TaskSpec> {
    crate::assets::files::require_exists(path, "task file")?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read task file '{}'", path.display()))?;
    Ok(parse_task(&text))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/task.rs"]
mod tests;
