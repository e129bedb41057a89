use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use edgeframe_lib::frame::dummy::test_frame;
use edgeframe_lib::{ChromaOrder, PipelineConfig, SessionLifecycle};

#[derive(Parser)]
#[command(name = "edgeframe")]
#[command(about = "Run camera frames through the edge detection pipeline")]
#[command(version)]
struct Cli {
    /// JSON pipeline config (defaults to $EDGEFRAME_CONFIG, then built-in values)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one raw 4:2:0 frame file into a JPEG edge map
    Process {
        /// Raw frame file (width * height * 3 / 2 bytes)
        #[arg(short, long)]
        input: PathBuf,

        /// Output JPEG path
        #[arg(short, long, default_value = "edges.jpg")]
        output: PathBuf,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// Input chroma is U,V (NV12) instead of V,U (NV21)
        #[arg(long)]
        uv: bool,
    },

    /// Push synthetic frames through the pipeline and report throughput
    Bench {
        #[arg(long, default_value = "640")]
        width: u32,

        #[arg(long, default_value = "480")]
        height: u32,

        /// Number of frames to process
        #[arg(short, long, default_value = "90")]
        frames: u64,
    },
}

fn main() -> Result<()> {
    // Set RUST_LOG to control verbosity, e.g. RUST_LOG=edgeframe_lib=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::from_env(),
    };

    match cli.command {
        Commands::Process {
            input,
            output,
            width,
            height,
            uv,
        } => {
            let config = if uv {
                PipelineConfig {
                    chroma_order: ChromaOrder::Uv,
                    ..config
                }
            } else {
                config
            };
            process_file(config, &input, &output, width, height)
        }
        Commands::Bench {
            width,
            height,
            frames,
        } => bench(config, width, height, frames),
    }
}

fn start(config: PipelineConfig) -> Result<SessionLifecycle> {
    let lifecycle = SessionLifecycle::new(config);
    if !lifecycle.initialize() {
        bail!("edge processor failed to initialize");
    }
    Ok(lifecycle)
}

fn process_file(
    config: PipelineConfig,
    input: &Path,
    output: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let raw = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let lifecycle = start(config)?;
    let jpeg = lifecycle.process_frame(&raw, width, height)?;
    std::fs::write(output, &jpeg).with_context(|| format!("writing {}", output.display()))?;
    println!("wrote {} bytes to {}", jpeg.len(), output.display());
    println!("{}", lifecycle.get_stats());
    lifecycle.cleanup();
    Ok(())
}

fn bench(config: PipelineConfig, width: u32, height: u32, frames: u64) -> Result<()> {
    let lifecycle = start(config)?;
    for index in 0..frames {
        let frame = test_frame(width, height, index);
        lifecycle
            .process_frame(&frame, width, height)
            .with_context(|| format!("frame {index}"))?;
    }
    println!("{}", lifecycle.get_stats());
    if let Some(snapshot) = lifecycle.stats_snapshot() {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    lifecycle.cleanup();
    Ok(())
}
