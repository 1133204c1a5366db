//! Configuration management with serde serialization/deserialization
//!
//! This module provides the capture configuration, its defaults, and the
//! argument validator that turns raw command-line values into a validated
//! `CaptureConfig` or decides that no capture was requested.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Default render-settle delay in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 2000;

/// Default capture width in pixels.
pub const DEFAULT_WIDTH: u32 = 1920;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 80;

/// Supported output image formats
///
/// - JPG: lossy compression, quality-controlled, smaller files
/// - PNG: lossless compression, quality setting is ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG format - lossy compression, smaller files
    Jpg,
    /// PNG format - lossless compression, best quality
    Png,
}

impl ImageFormat {
    /// Parse a format name, falling back to the given default on anything
    /// unrecognized.
    pub fn parse_or(value: &str, default: ImageFormat) -> ImageFormat {
        match value.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpg,
            "png" => ImageFormat::Png,
            other => {
                warn!("Unknown image format '{}', using {:?}", other, default);
                default
            }
        }
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::Jpg
    }
}

/// Optional defaults loaded from a JSON configuration file
///
/// Only the optional capture settings can be supplied this way; the target
/// URL and output path always come from the command line. CLI flags override
/// file values.
///
/// # Examples
///
/// ```json
/// { "delay_ms": 500, "format": "png", "quality": 90, "width": 1280 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureDefaults {
    /// Render-settle delay in milliseconds (default: 2000)
    #[serde(default = "default_delay")]
    pub delay_ms: u64,

    /// Output image format (default: jpg)
    #[serde(default)]
    pub format: ImageFormat,

    /// JPEG quality, 0-100 (default: 80)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Capture width in pixels (default: 1920)
    #[serde(default = "default_width")]
    pub width: u32,
}

fn default_delay() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            format: ImageFormat::Jpg,
            quality: DEFAULT_QUALITY,
            width: DEFAULT_WIDTH,
        }
    }
}

/// Validated, immutable capture configuration
///
/// Created exactly once per process by [`validate`] and threaded explicitly
/// through the observer, capture, and write steps. Never stored as ambient
/// state.
///
/// # Examples
///
/// ```rust
/// use command_shots::{CaptureConfig, ImageFormat};
///
/// let config = CaptureConfig {
///     target_url: "https://example.com".to_string(),
///     delay_ms: 0,
///     format: ImageFormat::Png,
///     quality: 80,
///     width: 800,
///     output_path: "/tmp/out.png".into(),
/// };
/// assert_eq!(config.width, 800);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Page to capture. Required, no default.
    pub target_url: String,

    /// Time to wait after the target page is detected before capturing.
    pub delay_ms: u64,

    /// Output image format.
    pub format: ImageFormat,

    /// Encoding quality, 0-100. Meaningful for jpg only.
    pub quality: u8,

    /// Raster and viewport width in pixels.
    pub width: u32,

    /// Destination file path. Required, no default.
    pub output_path: PathBuf,
}

/// Raw, unvalidated command-line values for the six capture flags
///
/// Absence is a first-class value here: each field is simply `None` when the
/// flag was not supplied, never an error.
#[derive(Debug, Clone, Default)]
pub struct RawArgs {
    pub capture: Option<String>,
    pub delay: Option<String>,
    pub format: Option<String>,
    pub quality: Option<String>,
    pub width: Option<String>,
    pub saveto: Option<String>,
}

/// Validate raw arguments into a capture configuration
///
/// Returns `None` when `capture` or `saveto` is absent: the launch carried no
/// capture intent and the pipeline must not start. This is deliberately not an
/// error. Optional fields fall back to `defaults`; malformed numeric values
/// are logged and replaced by the default rather than rejected.
pub fn validate(raw: &RawArgs, defaults: &CaptureDefaults) -> Option<CaptureConfig> {
    let target_url = match raw.capture.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return None,
    };

    let output_path = match raw.saveto.as_deref() {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => return None,
    };

    if url::Url::parse(&target_url).is_err() {
        warn!("Target URL '{}' does not parse as a URL", target_url);
    }

    let delay_ms = parse_numeric(raw.delay.as_deref(), "delay", defaults.delay_ms);
    let width = match parse_numeric(raw.width.as_deref(), "width", defaults.width) {
        0 => {
            warn!("Width must be positive, using {}", defaults.width);
            defaults.width
        }
        w => w,
    };
    let quality =
        parse_numeric(raw.quality.as_deref(), "quality", u64::from(defaults.quality)).min(100)
            as u8;
    let format = match raw.format.as_deref() {
        Some(value) => ImageFormat::parse_or(value, defaults.format),
        None => defaults.format,
    };

    Some(CaptureConfig {
        target_url,
        delay_ms,
        format,
        quality,
        width,
        output_path,
    })
}

fn parse_numeric<T>(value: Option<&str>, name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match value {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Malformed {} value '{}', using {}", name, raw, default);
                default
            }
        },
    }
}
