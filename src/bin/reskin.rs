use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use reskin::{
    Canvas, FalClient, FrameAligner, GenerationPresets, KeyColor, OutputNaming, Rgb,
    assets::png::load_rgba,
    frames::{
        apply::{ApplyRequest, apply_frames},
        select::{list_frames, parse_index_spec, select_frames},
    },
    media::ffmpeg::{DEFAULT_MAX_DIM, MAX_UPLOAD_BYTES, extract_frames},
    pipeline::{
        anchor::{AnchorOptions, build_anchor, unframe_dir, write_anchor},
        batch::{BatchRunner, StageFlags, Stages},
        config::BatchConfig,
        generate::{
            ReskinRequest, VideoRequest, find_project_root, generate_sequence, generate_video,
            remove_background_image, remove_backgrounds,
        },
    },
    remote::{client::JobApi, pool::DEFAULT_WORKERS},
};

#[derive(Parser, Debug)]
#[command(name = "reskin", version, about = "Game-art reskin pipeline")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Align selected frames into a sprite folder.
    Align(AlignArgs),
    /// Build a base (and framed) anchor image matched to an existing sprite.
    Anchor(AnchorArgs),
    /// Paint over the frame border of every PNG in a folder.
    Unframe(UnframeArgs),
    /// Extract PNG frames from a video (requires `ffmpeg` on PATH).
    Extract(ExtractArgs),
    /// Generate a video clip from a still image.
    Video(VideoArgs),
    /// Generate reskin options for one or more task files.
    Generate(GenerateArgs),
    /// Remove the background of an image or every image in a folder.
    BgRemove(BgRemoveArgs),
    /// Run the batch pipeline described by a TOML file.
    Batch(BatchArgs),
}

fn parse_rgb(value: &str) -> Result<Rgb, String> {
    Rgb::parse_hex(value).map_err(|e| e.to_string())
}

#[derive(Args, Debug)]
struct AlignArgs {
    /// Folder of `frame_###.png` files.
    #[arg(long)]
    frames: PathBuf,

    /// Frame labels in output order, e.g. `3,5-8`.
    #[arg(long)]
    indices: String,

    /// Existing sprite whose canvas, height and baseline are matched.
    #[arg(long = "match", required_unless_present = "canvas")]
    match_sprite: Option<PathBuf>,

    /// Frame whose visible height defines the shared scale (default: first selected frame).
    #[arg(long)]
    scale_ref: Option<PathBuf>,

    /// Stretch whole frames onto the `--match` sprite's canvas instead of baseline alignment.
    #[arg(long, requires = "match_sprite", conflicts_with = "canvas")]
    use_canvas: bool,

    /// Stretch whole frames onto a fixed `WxH` canvas instead of baseline alignment.
    #[arg(long, conflicts_with = "match_sprite")]
    canvas: Option<String>,

    #[arg(long, default_value_t = 1.0)]
    scale_multiplier: f64,

    #[arg(long)]
    flip_h: bool,

    /// Destination sprite folder.
    #[arg(long)]
    dest: PathBuf,

    #[arg(long, default_value = "")]
    prefix: String,

    #[arg(long, default_value_t = 0)]
    start: u32,

    #[arg(long, default_value_t = 2)]
    width: usize,

    /// Explicit output numbers, e.g. `0,2,4`.
    #[arg(long, conflicts_with = "single")]
    output_indices: Option<String>,

    /// Write exactly one `<prefix>.png`.
    #[arg(long)]
    single: bool,

    /// Move previous numbered files into `_backup_<timestamp>/` first.
    #[arg(long)]
    backup: bool,
}

#[derive(Args, Debug)]
struct AnchorArgs {
    /// Character image (background removed, or use `--remove-bg`).
    #[arg(long = "in")]
    input: PathBuf,

    #[arg(long = "match")]
    match_sprite: PathBuf,

    /// Base anchor output.
    #[arg(long)]
    out: PathBuf,

    /// Framed anchor output.
    #[arg(long)]
    framed_out: Option<PathBuf>,

    #[arg(long, default_value_t = 1.0)]
    scale_multiplier: f64,

    #[arg(long, default_value = "#00b140", value_parser = parse_rgb)]
    bg: Rgb,

    #[arg(long, default_value = "#ffffff", value_parser = parse_rgb)]
    border_color: Rgb,

    #[arg(long, default_value_t = 2)]
    border: u32,

    /// Run remote background removal on the input first.
    #[arg(long)]
    remove_bg: bool,

    #[arg(long, default_value_t = 2.0)]
    poll_seconds: f64,
}

#[derive(Args, Debug)]
struct UnframeArgs {
    dir: PathBuf,

    #[arg(long, default_value_t = 2)]
    thickness: u32,

    #[arg(long, default_value = "#00b140", value_parser = parse_rgb)]
    fill: Rgb,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    video: PathBuf,

    #[arg(long, default_value_t = 6)]
    fps: u32,

    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct VideoArgs {
    #[arg(long)]
    image: PathBuf,

    #[arg(long)]
    prompt: String,

    #[arg(long)]
    negative: Option<String>,

    /// Named constraint block appended to the prompt.
    #[arg(long)]
    preset: Option<String>,

    /// Free-form constraints appended to the prompt.
    #[arg(long)]
    constraints: Option<String>,

    #[arg(long)]
    resolution: Option<String>,

    #[arg(long)]
    duration: Option<String>,

    /// Last frame of the clip.
    #[arg(long)]
    end_image: Option<PathBuf>,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = MAX_UPLOAD_BYTES)]
    max_bytes: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_DIM)]
    max_dim: u32,

    #[arg(long, default_value_t = 2.0)]
    poll_seconds: f64,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Task files, run in order.
    #[arg(required = true)]
    tasks: Vec<PathBuf>,

    #[arg(long)]
    prompt: Option<String>,

    #[arg(long)]
    negative: Option<String>,

    #[arg(long)]
    num_images: Option<u32>,

    #[arg(long)]
    aspect_ratio: Option<String>,

    /// Extra reference image (repeatable).
    #[arg(long = "ref")]
    refs: Vec<PathBuf>,

    #[arg(long)]
    ref_dir: Option<PathBuf>,

    #[arg(long, default_value = "outputs/fal")]
    out: PathBuf,

    /// Print result URLs without downloading.
    #[arg(long)]
    no_download: bool,

    /// Feed `option_<k>.png` of each task to the next one as a reference.
    #[arg(long)]
    chain_option: Option<u32>,

    #[arg(long, default_value_t = 2.0)]
    poll_seconds: f64,
}

#[derive(Args, Debug)]
struct BgRemoveArgs {
    input: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    #[arg(long, default_value_t = 2.0)]
    poll_seconds: f64,
}

#[derive(Args, Debug)]
struct BatchArgs {
    config: PathBuf,

    /// Only run these animations (base or variation names, comma separated).
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    #[arg(long)]
    make_videos: bool,

    #[arg(long)]
    make_frames: bool,

    #[arg(long)]
    apply_sprites: bool,

    #[arg(long)]
    skip_video: bool,

    #[arg(long)]
    skip_extract: bool,

    #[arg(long)]
    skip_bg_remove: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Align(args) => cmd_align(args),
        Command::Anchor(args) => cmd_anchor(args),
        Command::Unframe(args) => cmd_unframe(args),
        Command::Extract(args) => cmd_extract(args),
        Command::Video(args) => cmd_video(args),
        Command::Generate(args) => cmd_generate(args),
        Command::BgRemove(args) => cmd_bg_remove(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn poll(seconds: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(seconds).context("poll interval must be a non-negative number")
}

fn parse_canvas(value: &str) -> anyhow::Result<Canvas> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .with_context(|| format!("canvas must be WxH, got '{value}'"))?;
    let w: u32 = w.trim().parse().context("canvas width")?;
    let h: u32 = h.trim().parse().context("canvas height")?;
    Ok(Canvas::new(w, h)?)
}

fn cmd_align(args: AlignArgs) -> anyhow::Result<()> {
    let labels = parse_index_spec(&args.indices)?;
    let frames = select_frames(&list_frames(&args.frames)?, &labels)?;

    let aligner = match (&args.canvas, &args.match_sprite) {
        (Some(canvas), _) => FrameAligner::canvas(parse_canvas(canvas)?, args.flip_h),
        (None, Some(match_path)) if args.use_canvas => {
            FrameAligner::canvas(Canvas::of(&load_rgba(match_path)?), args.flip_h)
        }
        (None, Some(match_path)) => {
            let match_img = load_rgba(match_path)?;
            let scale_ref_path = match &args.scale_ref {
                Some(p) => p.clone(),
                None => frames.first().cloned().context("no frames selected")?,
            };
            let scale_ref = load_rgba(&scale_ref_path)?;
            FrameAligner::baseline(
                &match_img,
                &scale_ref,
                args.scale_multiplier,
                KeyColor::default(),
                args.flip_h,
            )?
        }
        (None, None) => anyhow::bail!("either --match or --canvas is required"),
    };

    let naming = if args.single {
        OutputNaming::Single
    } else if let Some(spec) = &args.output_indices {
        OutputNaming::Explicit {
            indices: parse_index_spec(spec)?,
            width: args.width,
        }
    } else {
        OutputNaming::Sequential {
            start: args.start,
            width: args.width,
        }
    };

    let report = apply_frames(
        &ApplyRequest {
            frames: &frames,
            dest_dir: &args.dest,
            prefix: &args.prefix,
            naming,
            backup: args.backup,
        },
        &aligner,
    )?;
    if let Some(backup) = &report.backup_dir {
        eprintln!("backed up previous frames to {}", backup.display());
    }
    for path in &report.written {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_anchor(args: AnchorArgs) -> anyhow::Result<()> {
    let source = if args.remove_bg {
        let client = FalClient::from_env()?;
        remove_background_image(
            &client,
            &GenerationPresets::default(),
            &args.input,
            poll(args.poll_seconds)?,
        )?
    } else {
        load_rgba(&args.input)?
    };
    let match_img = load_rgba(&args.match_sprite)?;

    let opts = AnchorOptions {
        bg: args.bg,
        border_color: args.border_color,
        border_thickness: args.border,
        scale_multiplier: args.scale_multiplier,
        ..AnchorOptions::default()
    };
    let images = build_anchor(source, &match_img, &opts)?;
    write_anchor(&images, &args.out, args.framed_out.as_deref())?;

    eprintln!("wrote {}", args.out.display());
    if let Some(framed) = &args.framed_out {
        eprintln!("wrote {}", framed.display());
    }
    Ok(())
}

fn cmd_unframe(args: UnframeArgs) -> anyhow::Result<()> {
    let touched = unframe_dir(&args.dir, args.thickness, args.fill)?;
    eprintln!("unframed {} file(s) in {}", touched.len(), args.dir.display());
    Ok(())
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let frames = extract_frames(&args.video, args.fps, &args.out)?;
    eprintln!("wrote {} frame(s) to {}", frames.len(), args.out.display());
    Ok(())
}

fn cmd_video(args: VideoArgs) -> anyhow::Result<()> {
    let client = FalClient::from_env()?;
    let presets = GenerationPresets::default();
    let req = VideoRequest {
        image: args.image,
        prompt: args.prompt,
        negative: args.negative.or_else(|| Some(presets.default_negative.clone())),
        resolution: args
            .resolution
            .unwrap_or_else(|| presets.video_resolution.clone()),
        duration: args
            .duration
            .unwrap_or_else(|| presets.video_duration.clone()),
        preset: args.preset,
        constraints: args.constraints,
        end_image: args.end_image,
        max_bytes: args.max_bytes,
        max_dim: args.max_dim,
        poll: poll(args.poll_seconds)?,
    };
    let saved = generate_video(&client, &presets, &req, &args.out)?;
    eprintln!("wrote {}", saved.display());
    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let client = FalClient::from_env()?;
    let presets = GenerationPresets::default();
    let cwd = std::env::current_dir().context("resolve current directory")?;
    let root = find_project_root(&cwd);

    let base = ReskinRequest {
        task: PathBuf::new(),
        prompt: args.prompt,
        negative: args.negative,
        num_images: args.num_images,
        aspect_ratio: args.aspect_ratio,
        refs: args.refs,
        ref_dir: args.ref_dir,
        output_dir: args.out,
        download: !args.no_download,
        poll: poll(args.poll_seconds)?,
    };
    let results = generate_sequence(
        &client,
        &presets,
        &root,
        &args.tasks,
        &base,
        args.chain_option,
    )?;
    for (task, result) in args.tasks.iter().zip(&results) {
        eprintln!("{}:", task.display());
        for url in &result.urls {
            eprintln!("  {url}");
        }
        for path in &result.saved {
            eprintln!("  wrote {}", path.display());
        }
    }
    Ok(())
}

fn cmd_bg_remove(args: BgRemoveArgs) -> anyhow::Result<()> {
    let client = FalClient::from_env()?;
    let saved = remove_backgrounds(
        &client,
        &GenerationPresets::default(),
        &args.input,
        &args.out,
        args.workers,
        poll(args.poll_seconds)?,
    )?;
    for path in &saved {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let config = BatchConfig::load(&args.config)?;
    let stages = Stages::from_flags(StageFlags {
        make_videos: args.make_videos,
        make_frames: args.make_frames,
        apply_sprites: args.apply_sprites,
        skip_video: args.skip_video,
        skip_extract: args.skip_extract,
        skip_bg_remove: args.skip_bg_remove,
    });
    let client = if stages.needs_remote() {
        Some(FalClient::from_env()?)
    } else {
        None
    };
    let presets = GenerationPresets::default();
    let config_dir = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let runner = BatchRunner {
        project_root: find_project_root(config_dir),
        config: &config,
        presets: &presets,
        api: client.as_ref().map(|c| c as &dyn JobApi),
        stages,
    };
    let report = runner.run(&args.only)?;

    for video in &report.videos {
        eprintln!("wrote {}", video.display());
    }
    for (name, count) in &report.extracted {
        eprintln!("{name}: extracted {count} frame(s)");
    }
    for (name, count) in &report.bg_removed {
        eprintln!("{name}: removed background from {count} frame(s)");
    }
    for (name, applied) in &report.applied {
        eprintln!(
            "{name}: wrote {} sprite(s), pruned {}",
            applied.written.len(),
            applied.pruned.len()
        );
    }
    Ok(())
}
