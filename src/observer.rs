//! Navigation observer state machine
//!
//! Classifies every page-lifecycle event against the capture configuration
//! and decides whether to redirect the browser, schedule the capture, or
//! ignore the event. The machine is pure: it never touches the browser
//! itself, it only emits effects for the pipeline to execute, which makes it
//! testable with synthetic events.
//!
//! The underlying event stream fires for every frame navigation in every
//! frame, so the matching predicate must be cheap, exact on the normalized
//! URL, and idempotent against repeated firing. At-most-once capture rests on
//! the `Armed`/`Terminal` guard, not on any locking.

use crate::config::CaptureConfig;
use std::time::Duration;

/// The browser's blank landing location, used as the trigger to redirect
/// into the target URL.
pub const HOME_LOCATION: &str = "about:blank";

/// Fixed viewport height applied during the initial redirect. The real
/// document height is measured at capture time.
pub const REDIRECT_VIEWPORT_HEIGHT: u32 = 500;

/// One page-lifecycle tick: the document location observed by the browser.
///
/// Ephemeral; consumed and discarded by the observer.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub location: String,
}

impl NavigationEvent {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// Observer states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    /// Waiting for a relevant event.
    Idle,
    /// The blank landing page was seen and a redirect was issued; the
    /// navigation it triggers will raise new events.
    Redirecting,
    /// The target matched and exactly one deferred capture is scheduled.
    /// Absorbing with respect to incoming events.
    Armed,
    /// The capture has fired. Absorbing.
    Terminal,
}

/// Effect the pipeline must execute for an observed event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Event is irrelevant (or the machine is already armed); do nothing.
    Ignore,
    /// Resize the viewport and navigate to the target URL.
    Redirect {
        url: String,
        width: u32,
        height: u32,
    },
    /// Schedule the single deferred capture after the render-settle delay.
    ScheduleCapture { delay: Duration },
}

/// The navigation state machine.
///
/// # Examples
///
/// ```rust
/// use command_shots::{CaptureConfig, ImageFormat, NavigationEvent, NavigationObserver, Effect};
///
/// let config = CaptureConfig {
///     target_url: "https://example.com".to_string(),
///     delay_ms: 0,
///     format: ImageFormat::Png,
///     quality: 80,
///     width: 800,
///     output_path: "/tmp/out.png".into(),
/// };
/// let mut observer = NavigationObserver::new(config);
/// let effect = observer.observe(&NavigationEvent::new("https://example.com/"));
/// assert!(matches!(effect, Effect::ScheduleCapture { .. }));
/// // A second matching event is absorbed.
/// let effect = observer.observe(&NavigationEvent::new("https://example.com/"));
/// assert_eq!(effect, Effect::Ignore);
/// ```
#[derive(Debug)]
pub struct NavigationObserver {
    state: ObserverState,
    config: CaptureConfig,
}

impl NavigationObserver {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            state: ObserverState::Idle,
            config,
        }
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    /// Evaluate one event and return the effect the pipeline must execute.
    ///
    /// Once the machine is `Armed` or `Terminal` every event is ignored; this
    /// is what guarantees at-most-one capture even when the same URL fires
    /// multiple lifecycle events for iframes or sub-resources.
    pub fn observe(&mut self, event: &NavigationEvent) -> Effect {
        match self.state {
            ObserverState::Armed | ObserverState::Terminal => Effect::Ignore,
            ObserverState::Idle | ObserverState::Redirecting => {
                if event.location == HOME_LOCATION {
                    self.state = ObserverState::Redirecting;
                    return Effect::Redirect {
                        url: self.config.target_url.clone(),
                        width: self.config.width,
                        height: REDIRECT_VIEWPORT_HEIGHT,
                    };
                }
                if location_matches(&event.location, &self.config.target_url) {
                    self.state = ObserverState::Armed;
                    return Effect::ScheduleCapture {
                        delay: Duration::from_millis(self.config.delay_ms),
                    };
                }
                self.state = ObserverState::Idle;
                Effect::Ignore
            }
        }
    }

    /// Record that the scheduled capture has run. `Armed` becomes `Terminal`.
    pub fn capture_fired(&mut self) {
        if self.state == ObserverState::Armed {
            self.state = ObserverState::Terminal;
        }
    }
}

/// Normalized URL equality between an observed location and the target.
///
/// The observed location matches if it equals the target, the target with a
/// trailing slash, or either of those with the leading `www.` host prefix
/// stripped from the observed location.
pub fn location_matches(observed: &str, target: &str) -> bool {
    let with_slash = format!("{target}/");
    if observed == target || observed == with_slash {
        return true;
    }
    let stripped = strip_www(observed);
    stripped == target || stripped == with_slash
}

fn strip_www(location: &str) -> String {
    location.replacen("www.", "", 1)
}
