use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stagefx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the stage at one instant as a PNG.
    Frame(FrameArgs),
    /// Render a range of the stage as numbered PNGs.
    Frames(FramesArgs),
}

#[derive(Args, Debug)]
struct StageArgs {
    /// Stage config JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset root directory (or base URL with the `http` feature). Defaults to the config's
    /// directory.
    #[arg(long)]
    assets: Option<String>,

    /// Viewport width in CSS pixels.
    #[arg(long)]
    width: Option<f64>,

    /// Viewport height in CSS pixels.
    #[arg(long)]
    height: Option<f64>,

    /// Device pixel ratio.
    #[arg(long)]
    dpr: Option<f64>,

    /// Caption font location inside the asset root. Overrides the config's `font`.
    #[arg(long)]
    font: Option<String>,

    /// File holding the theme preference ("light" or "dark"); swaps are written back.
    #[arg(long)]
    theme_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    stage: StageArgs,

    /// Stage time in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    #[command(flatten)]
    stage: StageArgs,

    /// First instant, seconds.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Last instant (exclusive), seconds.
    #[arg(long)]
    to: f64,

    /// Output frame rate; also drives the stage clock.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Directory for `frame_00000.png`, `frame_00001.png`, ...
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stagefx=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
    }
}

fn load_config(args: &StageArgs) -> anyhow::Result<stagefx::StageConfig> {
    let mut config = match &args.config {
        Some(path) => stagefx::StageConfig::from_path(path)?,
        None => stagefx::StageConfig::default(),
    };
    if let Some(w) = args.width {
        config.viewport.width = w;
    }
    if let Some(h) = args.height {
        config.viewport.height = h;
    }
    if let Some(dpr) = args.dpr {
        config.viewport.device_pixel_ratio = dpr;
    }
    if let Some(font) = &args.font {
        config.font = Some(font.clone());
    }
    Ok(config)
}

fn asset_source(args: &StageArgs) -> Box<dyn stagefx::AssetSource> {
    if let Some(root) = &args.assets {
        #[cfg(feature = "http")]
        if root.starts_with("http://") || root.starts_with("https://") {
            return Box::new(stagefx::HttpAssetSource::new(root.clone()));
        }
        return Box::new(stagefx::FsAssetSource::new(root));
    }
    let root = args
        .config
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    Box::new(stagefx::FsAssetSource::new(root))
}

fn build_stage(
    args: &StageArgs,
    config: stagefx::StageConfig,
) -> anyhow::Result<stagefx::Stage> {
    let source = asset_source(args);
    let stage = match &args.theme_file {
        Some(path) => stagefx::Stage::with_store(
            config,
            source,
            Box::new(stagefx::FileThemeStore::new(path)),
        )?,
        None => stagefx::Stage::new(config, source)?,
    };
    Ok(stage)
}

fn write_png(path: &Path, frame: &stagefx::FrameRGBA) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.at >= 0.0, "--at must be >= 0");
    let config = load_config(&args.stage)?;
    let mut stage = build_stage(&args.stage, config)?;

    stage.run_until(args.at);
    let frame = stage.render_frame()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    write_png(&args.out, &frame)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0, "--fps must be > 0");
    anyhow::ensure!(
        args.from >= 0.0 && args.to > args.from,
        "--from/--to must satisfy 0 <= from < to"
    );
    let mut config = load_config(&args.stage)?;
    config.fps = args.fps;
    let mut stage = build_stage(&args.stage, config)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let fps = stagefx::Fps::new(args.fps, 1)?;
    let first = fps.secs_to_frames_floor(args.from);
    let last = fps.secs_to_frames_floor(args.to);
    let mut written = 0u64;
    for frame_idx in first..last {
        stage.run_until(fps.frames_to_secs(frame_idx));
        let frame = stage.render_frame()?;
        let path = args.out_dir.join(format!("frame_{:05}.png", frame_idx - first));
        write_png(&path, &frame)?;
        written += 1;
    }

    tracing::info!(written, flags = ?stage.flags(), "frames rendered");
    eprintln!("wrote {written} frames to {}", args.out_dir.display());
    Ok(())
}
