//! # Command Shots
//!
//! A single-shot, command-line-driven website screenshot tool. Given a URL,
//! a render delay, an image format/quality, a target width, and an output
//! path, it drives a headless Chrome browser to load the page, waits for it
//! to settle, rasterizes the full rendered document, encodes it, writes it to
//! disk, and exits.
//!
//! The pipeline is strictly one-directional and single-pass: exactly one
//! configuration, one matching navigation event, one raster surface, one
//! encoded image, one file write, one process exit. At-most-once capture is
//! guaranteed by the observer state machine, not by locking.
//!
//! ## CLI usage
//!
//! ```bash
//! command-shots --capture https://example.com --delay 0 --format png \
//!     --width 800 --saveto /tmp/out.png
//! ```
//!
//! Invoked without `--capture` or `--saveto`, the tool performs no capture
//! and exits cleanly: absence of the required flags signals an ordinary
//! launch, not a usage error.

/// Configuration, defaults, and the argument validator
pub mod config;

/// Error types for the capture pipeline
pub mod error;

/// Navigation observer state machine
pub mod observer;

/// Deferred execution of the capture action
pub mod scheduler;

/// Full-page raster capture
pub mod capture;

/// Image encoding and chunked persistence
pub mod writer;

/// Exactly-once process termination latch
pub mod terminator;

/// Pipeline orchestration over the browser event stream
pub mod pipeline;

/// Command-line interface implementation
pub mod cli;


pub use capture::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use observer::*;
pub use pipeline::*;
pub use scheduler::*;
pub use terminator::*;
pub use writer::*;
