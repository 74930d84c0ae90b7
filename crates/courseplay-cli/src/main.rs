//! Courseplay CLI - Headless course video player
//!
//! Features:
//! - Catalog listing
//! - Manifest verification
//! - Quality ladder inspection
//! - Headless playback sessions with live state output

use clap::{Parser, Subcommand, ValueEnum};
use courseplay_core::{AutoplayPolicy, PlaybackRate, PlayerConfig};
use std::path::PathBuf;

mod commands;
mod output;

/// Courseplay CLI - Course video player toolkit
#[derive(Parser)]
#[command(name = "courseplay")]
#[command(version)]
#[command(about = "Headless HLS course video player", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// API origin (overrides COURSEPLAY_API_BASE_URL)
    #[arg(long)]
    api_base: Option<String>,

    /// JSON player configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List videos in the catalog
    List,

    /// Verify a video's HLS manifest
    Verify {
        /// Video id (the catalog `_id`)
        video_id: String,
    },

    /// Show the quality levels of a video
    Levels {
        /// Video id (the catalog `_id`)
        video_id: String,
    },

    /// Run a headless playback session and print state changes
    Play {
        /// Video id (the catalog `_id`)
        video_id: String,

        /// Seconds of playback to run
        #[arg(short, long, default_value = "10")]
        seconds: u64,

        /// Autoplay policy of the headless media element
        #[arg(short, long, value_enum, default_value = "allowed")]
        autoplay: Autoplay,

        /// Force a quality level index (-1 for auto)
        #[arg(short, long, allow_hyphen_values = true)]
        quality: Option<i64>,

        /// Playback rate (0.5, 0.75, 1, 1.25, 1.5, 2)
        #[arg(short, long)]
        rate: Option<f64>,

        /// Skip the streaming engine and use native HLS playback
        #[arg(long)]
        native: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Autoplay {
    Allowed,
    Muted,
    Blocked,
}

impl From<Autoplay> for AutoplayPolicy {
    fn from(value: Autoplay) -> Self {
        match value {
            Autoplay::Allowed => AutoplayPolicy::Allowed,
            Autoplay::Muted => AutoplayPolicy::MutedOnly,
            Autoplay::Blocked => AutoplayPolicy::Blocked,
        }
    }
}

fn load_config(path: Option<&PathBuf>, api_base: Option<String>) -> anyhow::Result<PlayerConfig> {
    let mut config = match path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => PlayerConfig::from_env(),
    };
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    courseplay_core::init();
    let config = load_config(cli.config.as_ref(), cli.api_base.clone())?;

    match cli.command {
        Commands::List => {
            commands::list(&config, &cli.format).await?;
        }
        Commands::Verify { video_id } => {
            commands::verify(&config, &video_id, &cli.format).await?;
        }
        Commands::Levels { video_id } => {
            commands::levels(&config, &video_id, &cli.format).await?;
        }
        Commands::Play { video_id, seconds, autoplay, quality, rate, native } => {
            let rate = rate.map(PlaybackRate::try_from).transpose()?;
            let options = commands::PlayOptions {
                seconds,
                autoplay: autoplay.into(),
                quality,
                rate,
                native,
            };
            commands::play(config, &video_id, options, &cli.format).await?;
        }
    }

    Ok(())
}
