use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use pubstream::config::{load_config, resolve_config_path, Profile};
use pubstream::models::{ChartType, Dimension};
use pubstream::orchestrator::{run, RunRequest};

/// Pubstream - publications stream graph builder
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Dataset JSON (metadata + publications)
    #[arg(short, long)]
    dataset: PathBuf,

    /// Output directory for generated files (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Path to config file (overrides PUBSTREAM_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Dimension::Series)]
    dimension: Dimension,

    #[arg(long, value_enum, default_value_t = ChartType::Stream)]
    chart: ChartType,

    /// First year of the window (inclusive)
    #[arg(long)]
    from: Option<i32>,

    /// Last year of the window (inclusive)
    #[arg(long)]
    to: Option<i32>,

    /// Restrict drawing to these categories (repeatable)
    #[arg(long)]
    select: Vec<String>,

    /// Use the legacy thresholds and top-12 ranking
    #[arg(long)]
    legacy: bool,

    /// Animate year by year and write viz.playback.json
    #[arg(long)]
    play: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting pubstream");

    let args = Args::parse();

    let cfg_path = resolve_config_path(args.config.as_deref());
    let base = if args.legacy { Profile::Legacy } else { Profile::Current };
    let cfg = load_config(cfg_path.as_deref(), base)?;
    debug!(
        "Config - profile={:?}, top_n={}, tick_ms={}",
        cfg.profile, cfg.top_n, cfg.playback_tick_ms
    );

    let req = RunRequest {
        dataset: args.dataset,
        output_dir: args.output_dir,
        dimension: args.dimension,
        chart: args.chart,
        from: args.from,
        to: args.to,
        select: args.select,
        play: args.play,
    };
    run(&req, &cfg).await?;
    Ok(())
}
