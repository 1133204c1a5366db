//! Deferred execution of the capture action
//!
//! The capture must never run inline from the event callback, even with a
//! zero delay: routing everything through one scheduling path keeps the code
//! path consistent and gives layout one more tick to finish. The task is
//! cancellable so tests can exercise both outcomes, although the pipeline
//! itself never cancels a scheduled capture.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// A single scheduled action, running after a fixed delay.
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Schedule `action` to run once after `delay` has elapsed.
    pub fn schedule<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        debug!("Scheduling deferred action in {:?}", delay);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            action().await;
        });
        Self { handle }
    }

    /// Abort the task. A no-op once the action has started running.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Wait for the task to run to completion (or cancellation).
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_zero_delay_still_defers() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let task = DelayedTask::schedule(Duration::ZERO, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Not executed synchronously at schedule time.
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        task.join().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_action_runs_after_delay() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let task = DelayedTask::schedule(Duration::from_millis(20), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.join().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_execution() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let task = DelayedTask::schedule(Duration::from_secs(60), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();
        task.join().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
