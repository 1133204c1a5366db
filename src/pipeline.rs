//! Capture pipeline orchestration
//!
//! Wires the browser's navigation event stream to the observer state machine
//! and executes the effects it emits: redirect the blank landing page to the
//! target, schedule the single deferred capture, and wait for the terminator
//! to deliver the outcome. Data flow is one-directional and single-pass;
//! there is no retry loop and the only shared state is the immutable
//! configuration value passed in at construction.

use crate::capture;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::observer::{
    Effect, NavigationEvent, NavigationObserver, HOME_LOCATION, REDIRECT_VIEWPORT_HEIGHT,
};
use crate::scheduler::DelayedTask;
use crate::terminator::Terminator;
use crate::writer;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::EventFrameNavigated;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The one-shot capture pipeline.
///
/// # Examples
///
/// ```rust,no_run
/// use command_shots::{CaptureConfig, CapturePipeline, ImageFormat};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = CaptureConfig {
///         target_url: "https://example.com".to_string(),
///         delay_ms: 0,
///         format: ImageFormat::Png,
///         quality: 80,
///         width: 800,
///         output_path: "/tmp/out.png".into(),
///     };
///     CapturePipeline::new(config).run().await?;
///     Ok(())
/// }
/// ```
pub struct CapturePipeline {
    config: CaptureConfig,
}

impl CapturePipeline {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Drive the capture to completion.
    ///
    /// Returns once the deferred capture action has run and the output file
    /// is closed, or on a fatal browser/capture/write failure. If the target
    /// URL never appears this future never resolves; there is no timeout
    /// path.
    pub async fn run(self) -> Result<(), CaptureError> {
        info!(
            "Capturing {} at {} px wide into {}",
            self.config.target_url,
            self.config.width,
            self.config.output_path.display()
        );

        let (mut browser, mut handler) = Browser::launch(browser_config(&self.config)?)
            .await
            .map_err(|e| CaptureError::BrowserLaunchFailed(e.to_string()))?;

        // Background task pumping the CDP message loop for the browser's
        // whole lifetime.
        let handler_task = tokio::spawn(async move {
            while let Some(result) = handler.next().await {
                if result.is_err() {
                    break;
                }
            }
        });

        let result = self.drive(&browser).await;

        let _ = browser.close().await;
        handler_task.abort();

        result
    }

    async fn drive(&self, browser: &Browser) -> Result<(), CaptureError> {
        let page = browser
            .new_page(HOME_LOCATION)
            .await
            .map_err(|e| CaptureError::BrowserError(e.to_string()))?;

        let mut events = page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(|e| CaptureError::BrowserError(e.to_string()))?;

        let mut observer = NavigationObserver::new(self.config.clone());
        let (terminator, mut done) = Terminator::new();
        let mut capture_task: Option<DelayedTask> = None;

        // The blank landing page may have finished navigating before the
        // listener attached, so seed the machine with the current location.
        if let Ok(Some(location)) = page.url().await {
            let effect = observer.observe(&NavigationEvent::new(location));
            self.execute(effect, &page, &terminator, &mut capture_task)
                .await?;
        }

        loop {
            tokio::select! {
                outcome = &mut done => {
                    observer.capture_fired();
                    if let Some(task) = capture_task.take() {
                        task.join().await;
                    }
                    return match outcome {
                        Ok(result) => result,
                        Err(_) => Err(CaptureError::CaptureFailed(
                            "Capture task ended without reporting an outcome".to_string(),
                        )),
                    };
                }
                event = events.next() => {
                    match event {
                        Some(event) => {
                            let effect = observer
                                .observe(&NavigationEvent::new(event.frame.url.clone()));
                            self.execute(effect, &page, &terminator, &mut capture_task)
                                .await?;
                        }
                        None => {
                            return Err(CaptureError::BrowserError(
                                "Navigation event stream closed before capture".to_string(),
                            ));
                        }
                    }
                }
            }
        }
    }

    async fn execute(
        &self,
        effect: Effect,
        page: &Page,
        terminator: &Arc<Terminator>,
        capture_task: &mut Option<DelayedTask>,
    ) -> Result<(), CaptureError> {
        match effect {
            Effect::Ignore => Ok(()),
            Effect::Redirect { url, width, height } => {
                info!("Blank landing page observed, redirecting to {}", url);
                capture::apply_viewport(page, width, height).await?;
                page.goto(url)
                    .await
                    .map_err(|e| CaptureError::NavigationFailed(e.to_string()))?;
                Ok(())
            }
            Effect::ScheduleCapture { delay } => {
                info!("Target page observed, capturing in {:?}", delay);
                let page = page.clone();
                let config = self.config.clone();
                let terminator = terminator.clone();

                *capture_task = Some(DelayedTask::schedule(delay, move || async move {
                    let outcome = capture_and_persist(&page, &config).await;
                    if let Err(e) = &outcome {
                        error!("Capture failed: {}", e);
                    }
                    terminator.fire(outcome);
                }));
                Ok(())
            }
        }
    }
}

/// The deferred capture action: rasterize, encode, write, report.
async fn capture_and_persist(page: &Page, config: &CaptureConfig) -> Result<(), CaptureError> {
    let surface = capture::capture(page, config.width).await?;
    debug!("Captured {}x{} surface", surface.width(), surface.height());

    writer::encode_and_write(&surface, config.format, config.quality, &config.output_path)?;
    Ok(())
}

fn browser_config(config: &CaptureConfig) -> Result<BrowserConfig, CaptureError> {
    BrowserConfig::builder()
        .window_size(config.width, REDIRECT_VIEWPORT_HEIGHT)
        .args(vec![
            "--headless",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--no-first-run",
            "--disable-extensions",
            "--disable-default-apps",
            "--disable-sync",
            "--hide-scrollbars",
        ])
        .build()
        .map_err(CaptureError::BrowserLaunchFailed)
}
