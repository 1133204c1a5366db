use crate::config::{CaptureDefaults, RawArgs};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Command-line surface.
///
/// Every capture flag is individually optional; `--capture` and `--saveto`
/// are jointly required for a capture to happen. When either is absent the
/// tool performs no capture and exits cleanly, because absence means the
/// launch carried no capture intent.
#[derive(Parser, Debug)]
#[command(name = "command-shots")]
#[command(about = "Single-shot website screenshot tool")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Save an image of this website")]
    pub capture: Option<String>,

    #[arg(long, help = "Wait this long in ms for the page to load (default: 2000)")]
    pub delay: Option<String>,

    #[arg(long, help = "Image format: jpg or png (default: jpg)")]
    pub format: Option<String>,

    #[arg(long, help = "Quality 0-100 for the jpg format (default: 80)")]
    pub quality: Option<String>,

    #[arg(long, help = "Window width in pixels (default: 1920)")]
    pub width: Option<String>,

    #[arg(long, help = "Output file path")]
    pub saveto: Option<String>,

    #[arg(long, help = "JSON file with default capture settings")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,
}

impl Cli {
    /// The six capture flags as raw optional values, ready for validation.
    pub fn raw_args(&self) -> RawArgs {
        RawArgs {
            capture: self.capture.clone(),
            delay: self.delay.clone(),
            format: self.format.clone(),
            quality: self.quality.clone(),
            width: self.width.clone(),
            saveto: self.saveto.clone(),
        }
    }
}

/// Load optional capture defaults from a JSON file, falling back to the
/// built-in defaults when no file is given.
pub async fn load_defaults(path: Option<&Path>) -> anyhow::Result<CaptureDefaults> {
    match path {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read defaults file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid defaults file {}", path.display()))
        }
        None => Ok(CaptureDefaults::default()),
    }
}

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    Ok(())
}
