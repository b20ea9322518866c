//! scanctl - Replay barcode scan sessions from the command line
//!
//! Drives the scan core through its host method channel with mock providers:
//! recorded camera frames are fed through a mock camera, image fixtures are
//! answered by a scripted decoder.

mod commands;
mod script;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scan_core::ScanConfiguration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::script::FrameScript;

#[derive(Parser)]
#[command(name = "scanctl")]
#[command(author, version, about = "Barcode scan session replay tool")]
#[command(propagate_version = true)]
struct Cli {
    /// Scan configuration file (TOML)
    #[arg(short, long, env = "SCANCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded camera frames through a camera scan
    Replay {
        /// Frame script (JSON)
        script: PathBuf,

        /// Milliseconds to wait for a result after the last frame
        #[arg(long, default_value = "500")]
        grace_ms: u64,
    },

    /// Scan an image file using a detection fixture
    Image {
        /// Image file
        path: PathBuf,

        /// Detections the decoder reports for the image (JSON)
        #[arg(short, long)]
        fixture: PathBuf,
    },

    /// List supported formats
    Formats,
}

fn load_config(path: Option<&Path>) -> Result<Option<ScanConfiguration>> {
    path.map(|p| {
        ScanConfiguration::load_from(p)
            .with_context(|| format!("Failed to load config file: {}", p.display()))
    })
    .transpose()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("scanctl=debug,scan_core=debug,scan_channel=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("scanctl=info,scan_core=info,scan_channel=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let file_config = load_config(cli.config.as_deref())?;

    let output = match &cli.command {
        Commands::Replay { script, grace_ms } => {
            let script = FrameScript::load(script)?;
            // A config file overrides the one recorded with the script
            let config = file_config
                .or_else(|| script.config.clone())
                .unwrap_or_default();
            commands::replay(&script, &config, Duration::from_millis(*grace_ms)).await?
        }
        Commands::Image { path, fixture } => {
            let fixture = script::load_fixture(fixture)?;
            commands::image(path, fixture, &file_config.unwrap_or_default()).await?
        }
        Commands::Formats => commands::formats().await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
