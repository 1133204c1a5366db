//! Process termination latch
//!
//! The single designated exit point of the pipeline. The deferred capture
//! action fires the latch exactly once after the writer's close has returned;
//! the pipeline loop receives the outcome, shuts the browser down, and the
//! binary exits. Entering the fired state a second time is a no-op.

use crate::error::CaptureError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::warn;

/// Outcome delivered to the pipeline loop when the capture action completes.
pub type PipelineOutcome = Result<(), CaptureError>;

/// Exactly-once completion signal.
pub struct Terminator {
    fired: AtomicBool,
    tx: Mutex<Option<oneshot::Sender<PipelineOutcome>>>,
}

impl Terminator {
    /// Create the latch and the receiver the pipeline loop waits on.
    pub fn new() -> (Arc<Self>, oneshot::Receiver<PipelineOutcome>) {
        let (tx, rx) = oneshot::channel();
        let terminator = Arc::new(Self {
            fired: AtomicBool::new(false),
            tx: Mutex::new(Some(tx)),
        });
        (terminator, rx)
    }

    /// Deliver the outcome. Returns `true` if this call fired the latch,
    /// `false` if it had already fired.
    pub fn fire(&self, outcome: PipelineOutcome) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            warn!("Terminate requested more than once; ignoring");
            return false;
        }

        let sender = self.tx.lock().unwrap().take();
        match sender {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}
