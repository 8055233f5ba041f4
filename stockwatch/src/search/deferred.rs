//! Cancellable one-shot deferred task.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs a future once after a delay unless cancelled first.
///
/// Cancelling is idempotent, and a no-op once the delay has elapsed.
#[derive(Debug)]
pub struct DeferredTask {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl DeferredTask {
    /// Spawn `task` to run after `delay`. Must be called within a tokio runtime.
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let fired = Arc::new(AtomicBool::new(false));

        let child = token.clone();
        let fired_flag = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = child.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    fired_flag.store(true, Ordering::SeqCst);
                    task.await;
                }
            }
        });

        Self {
            token,
            fired,
            handle,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() && !self.has_fired()
    }

    /// Whether the delay elapsed and the task started.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Whether the timer is still counting down.
    pub fn is_pending(&self) -> bool {
        !self.has_fired() && !self.token.is_cancelled() && !self.handle.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
