//! Cancellable polling for long-running generation jobs.
//!
//! A [`PollTask`] calls a probe, sleeps, and calls it again until the probe
//! reports a final value, the attempt limit is hit, or the token fires.
//! Both the probe and the sleep race against the token, so cancellation
//! does not wait out a full interval or an in-flight status request.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};

/// Image jobs: re-check every 3s while running
pub const IMAGE_ACTIVE_INTERVAL: Duration = Duration::from_secs(3);
/// Image jobs: re-check every 5s on an unrecognised status
pub const IMAGE_IDLE_INTERVAL: Duration = Duration::from_secs(5);
/// Video jobs take minutes, so they poll more slowly
pub const VIDEO_ACTIVE_INTERVAL: Duration = Duration::from_secs(7);
pub const VIDEO_IDLE_INTERVAL: Duration = Duration::from_secs(8);

/// Intervals and limits for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay after a probe that saw the job actively progressing
    pub active_interval: Duration,
    /// Delay after a probe that saw an unrecognised status
    pub idle_interval: Duration,
    /// Give up after this many probes; `None` polls until done or cancelled
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn new(active_interval: Duration, idle_interval: Duration) -> Self {
        Self {
            active_interval,
            idle_interval,
            max_attempts: None,
        }
    }

    pub fn image() -> Self {
        Self::new(IMAGE_ACTIVE_INTERVAL, IMAGE_IDLE_INTERVAL)
    }

    pub fn video() -> Self {
        Self::new(VIDEO_ACTIVE_INTERVAL, VIDEO_IDLE_INTERVAL)
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    fn interval(&self, active: bool) -> Duration {
        if active {
            self.active_interval
        } else {
            self.idle_interval
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep<T> {
    /// The job reached a final state
    Ready(T),
    /// Not finished; `active` selects the short interval
    Pending { active: bool },
}

/// One poll loop over a single job.
#[derive(Debug, Clone)]
pub struct PollTask {
    policy: PollPolicy,
    cancel: CancellationToken,
    task_id: String,
}

impl PollTask {
    pub fn new(policy: PollPolicy, cancel: CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            task_id: String::new(),
        }
    }

    /// Name the job in errors and log lines (builder pattern)
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run the loop until the probe returns [`PollStep::Ready`].
    ///
    /// A probe error ends the loop immediately.
    pub async fn run<T, F, Fut>(&self, mut probe: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<PollStep<T>>>,
    {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let step = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::debug!(task_id = %self.task_id, attempts, "poll cancelled");
                    return Err(ClientError::Cancelled);
                }
                step = probe() => step?,
            };

            let active = match step {
                PollStep::Ready(value) => {
                    tracing::debug!(task_id = %self.task_id, attempts, "poll finished");
                    return Ok(value);
                }
                PollStep::Pending { active } => active,
            };

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    tracing::warn!(task_id = %self.task_id, attempts, "poll attempt limit reached");
                    return Err(ClientError::PollExhausted {
                        task_id: self.task_id.clone(),
                        attempts,
                    });
                }
            }

            let delay = self.policy.interval(active);
            tracing::trace!(task_id = %self.task_id, attempts, ?delay, "job still pending");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::debug!(task_id = %self.task_id, attempts, "poll cancelled");
                    return Err(ClientError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
