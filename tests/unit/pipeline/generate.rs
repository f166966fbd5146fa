use image::{Rgba, RgbaImage};

use super::*;
use crate::remote::fake::FakeApi;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_scratch").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]))
        .save(path)
        .unwrap();
}

/// A project with a source sprite, one folder reference and one task file.
fn project(name: &str, prompt: &str) -> PathBuf {
    let root = scratch(name);
    std::fs::write(root.join("project.godot"), b"").unwrap();
    write_png(&root.join("sprites/idle.png"));
    write_png(&root.join("source_images/a.png"));
    write_png(&root.join("extra.png"));
    std::fs::create_dir_all(root.join("tasks")).unwrap();
    std::fs::write(
        root.join("tasks/idle_00.md"),
        format!(
            "Source: sprites/idle.png\nSize(px): 200x300\n- Prompt: {prompt}\n\
             - Reference Images: refs/missing.png; extra.png\n"
        ),
    )
    .unwrap();
    root
}

fn request(root: &Path) -> ReskinRequest {
    ReskinRequest {
        task: root.join("tasks/idle_00.md"),
        prompt: None,
        negative: None,
        num_images: None,
        aspect_ratio: None,
        refs: Vec::new(),
        ref_dir: None,
        output_dir: root.join("out"),
        download: true,
        poll: Duration::ZERO,
    }
}

#[test]
fn project_root_is_nearest_godot_ancestor() {
    let root = scratch("generate_root");
    std::fs::write(root.join("project.godot"), b"").unwrap();
    std::fs::create_dir_all(root.join("a/b")).unwrap();
    assert_eq!(
        find_project_root(&root.join("a/b")),
        std::path::absolute(&root).unwrap()
    );
}

#[test]
fn reskin_submits_source_then_references_and_saves_options() {
    let root = project("generate_reskin", "trooper");
    let api = FakeApi::new();
    let out = generate_reskin(&api, &GenerationPresets::default(), &root, &request(&root)).unwrap();

    let subs = api.submitted();
    assert_eq!(subs.len(), 1);
    let (model, args) = &subs[0];
    assert_eq!(model, "fal-ai/nano-banana-pro/edit");
    assert_eq!(args["prompt"], "trooper");
    assert_eq!(
        args["image_urls"],
        json!(["upload://idle.png", "upload://a.png", "upload://extra.png"])
    );
    assert_eq!(args["reference_image_url"], "upload://idle.png");
    assert_eq!(args["aspect_ratio"], "2:3");
    assert_eq!(args["num_images"], 3);
    assert!(args.get("negative_prompt").is_none());

    assert_eq!(out.saved.len(), 2);
    assert!(out.saved[1].ends_with("idle_00/option_2.png"));
    assert!(out.saved.iter().all(|p| p.exists()));
}

#[test]
fn prompt_override_and_placeholder_task_prompt() {
    let root = project("generate_prompt", "TBD");
    let api = FakeApi::new();
    let presets = GenerationPresets::default();

    let err = generate_reskin(&api, &presets, &root, &request(&root)).unwrap_err();
    assert!(matches!(err, ReskinError::Validation(_)), "{err}");
    assert!(api.submitted().is_empty());

    let mut req = request(&root);
    req.prompt = Some("knight".to_owned());
    req.aspect_ratio = Some("16:9".to_owned());
    req.download = false;
    let out = generate_reskin(&api, &presets, &root, &req).unwrap();
    assert!(out.saved.is_empty());
    assert_eq!(out.urls.len(), 2);
    let (_, args) = &api.submitted()[0];
    assert_eq!(args["prompt"], "knight");
    assert_eq!(args["aspect_ratio"], "16:9");
}

#[test]
fn sequence_chains_previous_option() {
    let root = project("generate_chain", "trooper");
    std::fs::copy(root.join("tasks/idle_00.md"), root.join("tasks/idle_01.md")).unwrap();
    let api = FakeApi::new();
    let tasks = vec![root.join("tasks/idle_00.md"), root.join("tasks/idle_01.md")];
    generate_sequence(
        &api,
        &GenerationPresets::default(),
        &root,
        &tasks,
        &request(&root),
        Some(1),
    )
    .unwrap();

    let subs = api.submitted();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].1["image_urls"].as_array().unwrap().len(), 3);
    assert_eq!(subs[1].1["image_urls"][1], "upload://option_1.png");
}

#[test]
fn video_prompt_joins_preset_and_constraints() {
    assert_eq!(compose_video_prompt("walk", None, None), "walk");
    assert_eq!(
        compose_video_prompt("walk", Some("flat ground"), Some("no zoom")),
        "walk. flat ground. no zoom"
    );
}

#[test]
fn video_job_uploads_end_image_and_saves_clip() {
    let root = scratch("generate_video");
    write_png(&root.join("anchor.png"));
    write_png(&root.join("end.png"));
    let api = FakeApi::new();
    let req = VideoRequest {
        image: root.join("anchor.png"),
        prompt: "walk cycle".to_owned(),
        negative: Some(String::new()),
        resolution: "1080p".to_owned(),
        duration: "3".to_owned(),
        preset: Some("walk_horizontal".to_owned()),
        constraints: None,
        end_image: Some(root.join("end.png")),
        max_bytes: crate::media::ffmpeg::MAX_UPLOAD_BYTES,
        max_dim: 1024,
        poll: Duration::ZERO,
    };
    let dest = root.join("video/walk.mp4");
    generate_video(&api, &GenerationPresets::default(), &req, &dest).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"mp4:mem://video/req-1");
    let (model, args) = &api.submitted()[0];
    assert_eq!(model, "fal-ai/kling-video/v2.6/pro/image-to-video");
    assert!(args["prompt"].as_str().unwrap().starts_with("walk cycle. walks straight"));
    assert_eq!(args["tail_image_url"], "upload://end.png");
    assert_eq!(args["duration"], "3");
    assert!(args.get("negative_prompt").is_none());
}

#[test]
fn unknown_video_preset_fails_before_submitting() {
    let root = scratch("generate_video_preset");
    write_png(&root.join("anchor.png"));
    let api = FakeApi::new();
    let req = VideoRequest {
        image: root.join("anchor.png"),
        prompt: "walk".to_owned(),
        negative: None,
        resolution: "1080p".to_owned(),
        duration: "5".to_owned(),
        preset: Some("moonwalk".to_owned()),
        constraints: None,
        end_image: None,
        max_bytes: crate::media::ffmpeg::MAX_UPLOAD_BYTES,
        max_dim: 1024,
        poll: Duration::ZERO,
    };
    assert!(generate_video(&api, &GenerationPresets::default(), &req, &root.join("v.mp4")).is_err());
    assert!(api.submitted().is_empty());
}

#[test]
fn background_removal_fans_out_over_folder() {
    let root = scratch("generate_bg");
    for i in 1..=3 {
        write_png(&root.join(format!("raw/frame_{i:03}.png")));
    }
    let api = FakeApi::new();
    let out = remove_backgrounds(
        &api,
        &GenerationPresets::default(),
        &root.join("raw"),
        &root.join("no_bg"),
        2,
        Duration::ZERO,
    )
    .unwrap();

    assert_eq!(out.len(), 3);
    assert!(out[0].ends_with("no_bg/frame_001.png"));
    assert!(out.iter().all(|p| p.exists()));
    let subs = api.submitted();
    assert_eq!(subs.len(), 3);
    assert!(subs.iter().all(|(m, _)| m == "fal-ai/bria/background/remove"));
}
