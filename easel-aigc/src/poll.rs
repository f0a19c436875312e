//! Explicit polling of AIGC task status.
//!
//! [`AigcClient::get_task_status`] issues a single request. Callers that want
//! to wait for a result choose a [`PollPolicy`] (attempt bound and cadence)
//! and a cancellation signal. There is no default policy.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::aigc::AigcClient;
use crate::error::{ClientError, ClientResult};
use crate::task::TaskStatusResponse;

/// How often and how long to poll a task.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Maximum number of status requests (at least 1).
    pub max_attempts: u32,
    /// Delay after the first non-terminal snapshot.
    pub interval: Duration,
    /// Growth factor applied to the delay after each poll (at least 1.0).
    pub multiplier: f64,
    /// Upper bound on the delay.
    pub max_interval: Duration,
}

impl PollPolicy {
    /// Poll at a fixed interval, at most `max_attempts` times.
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
            multiplier: 1.0,
            max_interval: interval,
        }
    }

    /// Grow the delay exponentially up to `max_interval`.
    #[must_use]
    pub fn with_backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        self.max_interval = max_interval.max(self.interval);
        self
    }

    /// Delay after the given poll (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.interval.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map_or(self.max_interval, |delay| delay.min(self.max_interval))
    }
}

/// Poll `prompt_id` until its status is terminal.
///
/// `on_update` sees every snapshot, including the terminal one. `cancel`
/// resolving stops polling; a status request still in flight is dropped.
/// Any request error ends polling immediately.
///
/// # Errors
///
/// Returns [`ClientError::Cancelled`] when `cancel` resolves,
/// [`ClientError::PollExhausted`] after `max_attempts` non-terminal snapshots,
/// and any error from [`AigcClient::get_task_status`].
pub async fn poll_task<C, F>(
    client: &AigcClient,
    prompt_id: &str,
    policy: &PollPolicy,
    cancel: C,
    mut on_update: F,
) -> ClientResult<TaskStatusResponse>
where
    C: Future<Output = ()>,
    F: FnMut(&TaskStatusResponse),
{
    tokio::pin!(cancel);

    for attempt in 0..policy.max_attempts {
        let status = tokio::select! {
            biased;
            () = &mut cancel => {
                info!(prompt_id, attempt, "Task polling cancelled");
                return Err(ClientError::Cancelled);
            }
            result = client.get_task_status(prompt_id) => result?,
        };

        on_update(&status);
        if status.is_terminal() {
            debug!(prompt_id, attempts = attempt + 1, status = ?status.status, "Task reached terminal status");
            return Ok(status);
        }

        if attempt + 1 < policy.max_attempts {
            let delay = policy.delay_for_attempt(attempt);
            debug!(
                prompt_id,
                progress = status.progress,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Task not finished, polling again"
            );
            tokio::select! {
                biased;
                () = &mut cancel => {
                    info!(prompt_id, attempt, "Task polling cancelled");
                    return Err(ClientError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    Err(ClientError::PollExhausted {
        prompt_id: prompt_id.to_string(),
        attempts: policy.max_attempts,
    })
}

/// Handle to a poll running on its own task.
///
/// Dropping the handle cancels the poll.
pub struct PollHandle {
    handle: JoinHandle<ClientResult<TaskStatusResponse>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl PollHandle {
    /// Ask the poll to stop before its next request.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Whether the poll task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the poll to finish.
    ///
    /// # Errors
    ///
    /// Returns the poll's error, or [`ClientError::TaskJoin`] if the task
    /// panicked or was aborted.
    pub async fn join(mut self) -> ClientResult<TaskStatusResponse> {
        // Keep the sender alive until the task finishes so joining never cancels.
        let _shutdown_tx = self.shutdown_tx.take();
        (&mut self.handle).await?
    }

    /// Abort the poll task without waiting.
    pub fn abort(self) {
        self.handle.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a task that polls `prompt_id` under `policy`.
///
/// Multiple polls for different prompts may run concurrently; they share
/// nothing but the client's connection pool.
pub fn spawn_task_poll<F>(
    client: AigcClient,
    prompt_id: String,
    policy: PollPolicy,
    on_update: F,
) -> PollHandle
where
    F: FnMut(&TaskStatusResponse) + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let cancel = async move {
            // A dropped sender counts as cancellation too.
            let _ = shutdown_rx.await;
        };
        poll_task(&client, &prompt_id, &policy, cancel, on_update).await
    });

    PollHandle {
        handle,
        shutdown_tx: Some(shutdown_tx),
    }
}
