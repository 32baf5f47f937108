//! Best-effort writes issued off the reply path.

use std::{fmt::Display, future::Future, sync::Mutex};

use {tokio::task::JoinSet, tracing::warn};

#[cfg(feature = "metrics")]
use askgeorge_metrics::{counter, labels, session as session_metrics};

/// Spawns store writes whose outcome must not affect the reply.
///
/// Failures are logged and counted. Finished tasks are reaped on each spawn;
/// [`BackgroundWrites::drain`] waits for the rest, for one-shot callers that
/// exit right after replying.
#[derive(Default)]
pub struct BackgroundWrites {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F, E>(&self, operation: &'static str, write: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            if let Err(e) = write.await {
                warn!(operation, error = %e, "background write failed");
                #[cfg(feature = "metrics")]
                counter!(
                    session_metrics::BACKGROUND_WRITE_FAILURES_TOTAL,
                    labels::OPERATION => operation
                )
                .increment(1);
            }
        });
    }

    /// Wait for every write spawned so far.
    pub async fn drain(&self) {
        let mut pending = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *tasks)
        };
        while pending.join_next().await.is_some() {}
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
