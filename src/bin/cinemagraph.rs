use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use cinemagraph::encode::ffmpeg::ensure_parent_dir;
use cinemagraph::pipeline::photo::{find_photo, load_photo};
use cinemagraph::{
    Collaborators, ConstantDepth, DisparityPngDepth, FfmpegSink, FfmpegSinkOpts, FloFlowReader,
    PipelineConfig, PngSequenceSink, PreparedRun, SingleLayerDecomposer, TeeSink, ZeroFlow,
    run_photo,
};

#[derive(Parser, Debug)]
#[command(name = "cinemagraph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the space-time video of a photo (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Directory holding `image.png` or `image.jpg`; output goes to `<dir>/output`.
    #[arg(long)]
    input_dir: PathBuf,

    /// JSON run configuration. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// 16-bit disparity PNG. Without it the scene is flat at `--depth`.
    #[arg(long)]
    disparity: Option<PathBuf>,

    /// Constant depth used when no disparity map is given.
    #[arg(long, default_value_t = 1.0)]
    depth: f32,

    /// Middlebury `.flo` motion field. Without it the scene is still.
    #[arg(long)]
    flow: Option<PathBuf>,

    /// Output frame count.
    #[arg(long)]
    n_frames: Option<usize>,

    /// Camera travel along x, y and z.
    #[arg(long, allow_hyphen_values = true)]
    x_motion: Option<f32>,

    #[arg(long, allow_hyphen_values = true)]
    y_motion: Option<f32>,

    #[arg(long, allow_hyphen_values = true)]
    z_motion: Option<f32>,

    /// Camera path: double-straight-line, straight-line, circle, zoom-in, up-down.
    #[arg(long)]
    path: Option<String>,

    /// The flow is divided by this before integration.
    #[arg(long)]
    flow_scale: Option<f32>,

    /// Downsample the photo and depth by this factor.
    #[arg(long)]
    ds_factor: Option<f32>,

    /// Pixels cropped from every edge.
    #[arg(long)]
    crop: Option<u32>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Encoder quality, 0..=10.
    #[arg(long)]
    quality: Option<u8>,

    /// Also write every frame as PNG under `<dir>/output/frames`.
    #[arg(long, default_value_t = false)]
    save_frames: bool,

    /// Keep an existing output video instead of replacing it.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size (parallel mode only).
    #[arg(long)]
    chunk_size: Option<usize>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let res = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    };
    if let Err(e) = &res
        && let Some(err) = e.downcast_ref::<cinemagraph::CinemagraphError>()
    {
        tracing::error!(stage = err.stage(), "{err}");
    }
    res
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &InputArgs) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_json_path(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(v) = args.n_frames {
        cfg.n_frames = v;
    }
    if let Some(v) = args.x_motion {
        cfg.x_motion = v;
    }
    if let Some(v) = args.y_motion {
        cfg.y_motion = v;
    }
    if let Some(v) = args.z_motion {
        cfg.z_motion = v;
    }
    if let Some(v) = &args.path {
        cfg.path = v.clone();
    }
    if let Some(v) = args.flow_scale {
        cfg.flow_scale = v;
    }
    if let Some(v) = args.ds_factor {
        cfg.ds_factor = v;
    }
    if let Some(v) = args.crop {
        cfg.crop = v;
    }
    Ok(cfg)
}

fn collaborators(args: &InputArgs) -> anyhow::Result<Collaborators> {
    let depth: Box<dyn cinemagraph::DepthEstimator> = match &args.disparity {
        Some(path) => Box::new(DisparityPngDepth::new(path)),
        None => Box::new(ConstantDepth::new(args.depth)?),
    };
    let flow: Box<dyn cinemagraph::SceneFlowEstimator> = match &args.flow {
        Some(path) => Box::new(FloFlowReader::new(path)),
        None => Box::new(ZeroFlow),
    };
    Ok(Collaborators {
        depth,
        decomposer: Box::new(SingleLayerDecomposer),
        flow,
    })
}

fn read_photo(dir: &Path) -> anyhow::Result<image::RgbImage> {
    let path = find_photo(dir)?;
    let photo = load_photo(&path).with_context(|| format!("load photo '{}'", path.display()))?;
    tracing::info!(path = %path.display(), w = photo.width(), h = photo.height(), "photo loaded");
    Ok(photo)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.input)?;
    if let Some(v) = args.fps {
        cfg.fps = v;
    }
    if let Some(v) = args.quality {
        cfg.quality = v;
    }
    cfg.save_frames |= args.save_frames;
    cfg.threading.parallel |= args.parallel;
    if args.threads.is_some() {
        cfg.threading.threads = args.threads;
    }
    if let Some(v) = args.chunk_size {
        cfg.threading.chunk_size = v;
    }
    cfg.validate()?;
    let path_type = cfg.camera_path()?.path_type();

    let photo = read_photo(&args.input.input_dir)?;
    let collaborators = collaborators(&args.input)?;

    let out_dir = args.input.input_dir.join("output");
    let video = out_dir.join(cfg.video_file_name(path_type));
    let mut opts = FfmpegSinkOpts::new(&video);
    opts.overwrite = !args.no_overwrite;
    let ffmpeg = FfmpegSink::new(opts);

    let report = if cfg.save_frames {
        let frames = PngSequenceSink::new(out_dir.join("frames"), path_type.label());
        let mut sink = TeeSink::new(ffmpeg, frames);
        run_photo(&cfg, &photo, &collaborators, &mut sink)?
    } else {
        let mut sink = ffmpeg;
        run_photo(&cfg, &photo, &collaborators, &mut sink)?
    };

    eprintln!(
        "wrote {} ({} frames, {} points, {} dropped)",
        video.display(),
        report.frames,
        report.scene_points,
        report.dropped_pixels
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.input)?;
    let photo = read_photo(&args.input.input_dir)?;
    let collaborators = collaborators(&args.input)?;

    let run = PreparedRun::prepare(&cfg, &photo, &collaborators)?;
    let img = run.render_still(args.frame)?;

    ensure_parent_dir(&args.out)?;
    img.save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
