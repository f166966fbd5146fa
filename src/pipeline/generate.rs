use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use image::RgbaImage;
use serde_json::{Value, json};

use crate::{
    assets::{
        files::{displace_existing, image_inputs, list_files_with_ext, require_exists},
        png::{decode_rgba, stage_bytes, write_bytes_atomic},
    },
    foundation::error::{ReskinError, ReskinResult},
    media::ffmpeg::shrink_for_upload,
    pipeline::{
        presets::GenerationPresets,
        task::{TaskSpec, load_task, resolve_text},
    },
    remote::{
        client::JobApi,
        job::{image_url, image_urls, run_job, video_url},
        pool::run_bounded,
    },
};

const REFERENCE_DIR: &str = "source_images";

/// Nearest ancestor of `start` containing `project.godot`, else `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| dir.join("project.godot").exists())
        .map(Path::to_path_buf)
        .unwrap_or(start)
}

#[derive(Clone, Debug)]
pub struct ReskinRequest {
    pub task: PathBuf,
    pub prompt: Option<String>,
    pub negative: Option<String>,
    pub num_images: Option<u32>,
    pub aspect_ratio: Option<String>,
    pub refs: Vec<PathBuf>,
    pub ref_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub download: bool,
    pub poll: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct GeneratedImages {
    pub urls: Vec<String>,
    pub saved: Vec<PathBuf>,
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Reference images in submission order: explicit refs, the reference folder (explicit,
/// else `<root>/source_images` when present), then the task's own references.
pub fn collect_references(
    req: &ReskinRequest,
    task: &TaskSpec,
    project_root: &Path,
) -> ReskinResult<Vec<PathBuf>> {
    let mut refs: Vec<PathBuf> = req.refs.clone();

    let ref_dir = req
        .ref_dir
        .clone()
        .or_else(|| Some(project_root.join(REFERENCE_DIR)).filter(|d| d.is_dir()));
    if let Some(dir) = ref_dir
        && dir.is_dir()
    {
        refs.extend(list_files_with_ext(&dir, &["png", "jpg", "jpeg"])?);
    }

    refs.extend(
        task.references
            .iter()
            .map(|r| absolutize(Path::new(r), project_root)),
    );

    Ok(refs
        .into_iter()
        .filter(|p| {
            let found = p.exists();
            if !found {
                tracing::warn!(path = %p.display(), "reference not found, skipping");
            }
            found
        })
        .collect())
}

/// Aspect ratio to request: explicit override, else nearest to the task size, else `auto`.
pub fn pick_aspect_ratio(
    presets: &GenerationPresets,
    explicit: Option<&str>,
    task: &TaskSpec,
) -> String {
    match (explicit, task.size) {
        (Some(r), _) => r.to_owned(),
        (None, Some((w, h))) => presets.nearest_aspect_ratio(w, h),
        (None, None) => "auto".to_owned(),
    }
}

/// Generate reskin options for one task file.
#[tracing::instrument(skip_all, fields(task = %req.task.display()))]
pub fn generate_reskin(
    api: &dyn JobApi,
    presets: &GenerationPresets,
    project_root: &Path,
    req: &ReskinRequest,
) -> ReskinResult<GeneratedImages> {
    let task = load_task(&req.task)?;
    let source = task
        .source
        .as_deref()
        .ok_or_else(|| ReskinError::validation("task file missing Source: entry"))?;
    let source_path = absolutize(Path::new(source), project_root);
    require_exists(&source_path, "source asset")?;

    let prompt = resolve_text(req.prompt.as_deref())
        .or_else(|| task.prompt.clone())
        .ok_or_else(|| {
            ReskinError::validation(
                "no prompt provided; pass --prompt or set '- Prompt:' in the task file",
            )
        })?;
    let negative = resolve_text(req.negative.as_deref()).or_else(|| task.negative.clone());
    let aspect_ratio = pick_aspect_ratio(presets, req.aspect_ratio.as_deref(), &task);

    let base_url = api.upload_file(&source_path)?;
    let mut image_urls_in = vec![base_url.clone()];
    for path in collect_references(req, &task, project_root)? {
        image_urls_in.push(api.upload_file(&path)?);
    }

    let mut arguments = json!({
        "prompt": prompt,
        "image_urls": image_urls_in,
        "num_images": req.num_images.unwrap_or(presets.num_images),
        "output_format": presets.output_format,
        "reference_image_url": base_url,
        "resolution": presets.image_resolution,
        "aspect_ratio": aspect_ratio,
    });
    if let Some(negative) = negative {
        arguments["negative_prompt"] = Value::String(negative);
    }

    let result = run_job(api, &presets.image_model, &arguments, req.poll)?;
    let urls = image_urls(&result);
    if urls.is_empty() {
        return Err(ReskinError::remote("no images in result"));
    }
    tracing::info!(count = urls.len(), "generation completed");

    let mut out = GeneratedImages {
        urls,
        saved: Vec::new(),
    };
    if req.download {
        let stem = req
            .task
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        for (i, url) in out.urls.iter().enumerate() {
            let dest = req
                .output_dir
                .join(&stem)
                .join(format!("option_{}.{}", i + 1, presets.output_format));
            write_bytes_atomic(&api.download(url)?, &dest)?;
            out.saved.push(dest);
        }
    }
    Ok(out)
}

/// Run several tasks in order. With `chain_option`, each task after the first also gets
/// `option_<k>.png` of the previous task as a reference.
pub fn generate_sequence(
    api: &dyn JobApi,
    presets: &GenerationPresets,
    project_root: &Path,
    tasks: &[PathBuf],
    base: &ReskinRequest,
    chain_option: Option<u32>,
) -> ReskinResult<Vec<GeneratedImages>> {
    let mut chained: Option<PathBuf> = None;
    let mut all = Vec::with_capacity(tasks.len());
    for task in tasks {
        let mut req = base.clone();
        req.task = task.clone();
        req.refs.extend(chained.take());

        all.push(generate_reskin(api, presets, project_root, &req)?);

        if let Some(k) = chain_option {
            let stem = task
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let candidate = base
                .output_dir
                .join(stem)
                .join(format!("option_{k}.{}", presets.output_format));
            if candidate.exists() {
                chained = Some(candidate);
            } else {
                tracing::warn!(path = %candidate.display(), "chained reference not found");
            }
        }
    }
    Ok(all)
}

#[derive(Clone, Debug)]
pub struct VideoRequest {
    pub image: PathBuf,
    pub prompt: String,
    pub negative: Option<String>,
    pub resolution: String,
    pub duration: String,
    pub preset: Option<String>,
    pub constraints: Option<String>,
    pub end_image: Option<PathBuf>,
    pub max_bytes: u64,
    pub max_dim: u32,
    pub poll: Duration,
}

/// Prompt, preset block and custom constraints joined with `". "`.
pub fn compose_video_prompt(prompt: &str, preset: Option<&str>, constraints: Option<&str>) -> String {
    let mut out = prompt.to_owned();
    for extra in [preset, constraints].into_iter().flatten() {
        if !extra.trim().is_empty() {
            out = format!("{out}. {extra}");
        }
    }
    out
}

pub fn video_arguments(
    prompt: &str,
    image_url: &str,
    req: &VideoRequest,
    tail_image_url: Option<&str>,
) -> Value {
    let mut args = json!({
        "prompt": prompt,
        "image_url": image_url,
        "resolution": req.resolution,
        "duration": req.duration,
    });
    if let Some(negative) = req.negative.as_deref().filter(|n| !n.trim().is_empty()) {
        args["negative_prompt"] = Value::String(negative.to_owned());
    }
    if let Some(tail) = tail_image_url {
        args["tail_image_url"] = Value::String(tail.to_owned());
    }
    args
}

/// Generate a clip from a still and save it to `dest`.
///
/// A clip already at `dest` is moved aside only once the new one has been downloaded.
#[tracing::instrument(skip_all, fields(image = %req.image.display(), dest = %dest.display()))]
pub fn generate_video(
    api: &dyn JobApi,
    presets: &GenerationPresets,
    req: &VideoRequest,
    dest: &Path,
) -> ReskinResult<PathBuf> {
    require_exists(&req.image, "image")?;
    let image = shrink_for_upload(&req.image, req.max_bytes, req.max_dim)?;
    let image_url = api.upload_file(&image)?;

    let tail_url = match &req.end_image {
        Some(end) => {
            require_exists(end, "end image")?;
            let end = shrink_for_upload(end, req.max_bytes, req.max_dim)?;
            Some(api.upload_file(&end)?)
        }
        None => None,
    };

    let preset = req
        .preset
        .as_deref()
        .map(|p| presets.constraint(p))
        .transpose()?;
    let prompt = compose_video_prompt(&req.prompt, preset, req.constraints.as_deref());
    let arguments = video_arguments(&prompt, &image_url, req, tail_url.as_deref());

    let result = run_job(api, &presets.video_model, &arguments, req.poll)?;
    let url = video_url(&result)?;
    let staged = stage_bytes(&api.download(&url)?, dest)?;
    displace_existing(dest)?;
    staged.commit()?;
    tracing::info!("saved video");
    Ok(dest.to_path_buf())
}

fn remove_background_bytes(
    api: &dyn JobApi,
    presets: &GenerationPresets,
    path: &Path,
    poll: Duration,
) -> ReskinResult<Vec<u8>> {
    let url = api.upload_file(path)?;
    let result = run_job(
        api,
        &presets.bg_remove_model,
        &json!({ "image_url": url }),
        poll,
    )?;
    api.download(&image_url(&result)?)
}

/// Remove the background of one image and return the decoded result.
pub fn remove_background_image(
    api: &dyn JobApi,
    presets: &GenerationPresets,
    path: &Path,
    poll: Duration,
) -> ReskinResult<RgbaImage> {
    decode_rgba(&remove_background_bytes(api, presets, path, poll)?)
}

/// Remove backgrounds for a file or every image in a folder, saving `<out_dir>/<stem>.png`.
#[tracing::instrument(skip(api, presets))]
pub fn remove_backgrounds(
    api: &dyn JobApi,
    presets: &GenerationPresets,
    input: &Path,
    out_dir: &Path,
    workers: usize,
    poll: Duration,
) -> ReskinResult<Vec<PathBuf>> {
    require_exists(input, "input")?;
    let inputs = image_inputs(input)?;
    run_bounded(workers, &inputs, |path| {
        let bytes = remove_background_bytes(api, presets, path, poll)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dest = out_dir.join(format!("{stem}.png"));
        write_bytes_atomic(&bytes, &dest)?;
        tracing::debug!(dest = %dest.display(), "background removed");
        Ok(dest)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/generate.rs"]
mod tests;
