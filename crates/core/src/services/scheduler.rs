use log::debug;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A periodic task running on the tokio runtime.
///
/// The first run happens one `period` after spawning. Cancelling (or
/// dropping the handle) stops the task; a run already in progress is
/// aborted at its next `.await`. Must be spawned from within a runtime.
#[must_use = "dropping a PollingHandle cancels the task"]
pub struct PollingHandle {
    name: String,
    period: Duration,
    task: JoinHandle<()>,
    cancelled: bool,
}

impl PollingHandle {
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!("Poller '{task_name}' tick");
                job().await;
            }
        });
        debug!("Poller '{name}' started every {period:?}");
        Self {
            name,
            period,
            task,
            cancelled: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the task. Idempotent.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.task.abort();
            self.cancelled = true;
            debug!("Poller '{}' cancelled", self.name);
        }
    }

    /// `true` until cancelled (or the task ends on its own).
    pub fn is_active(&self) -> bool {
        !self.cancelled && !self.task.is_finished()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for PollingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingHandle")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Monotonic request tokens that reject out-of-order responses.
///
/// Each request takes a token with [`RequestSequence::begin`]. When its
/// response arrives, [`RequestSequence::complete`] accepts it only if no
/// newer request has completed in the meantime.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: AtomicU64,
    completed: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token (first token is 1).
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record completion of `token`. Returns `false` if the response is stale.
    pub fn complete(&self, token: u64) -> bool {
        self.completed.fetch_max(token, Ordering::SeqCst) < token
    }

    /// Most recent token issued.
    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}
