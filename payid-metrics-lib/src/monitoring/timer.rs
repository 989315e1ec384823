//! Cancelable recurring jobs
//!
//! Every tick spawns the job as its own task, so a slow cycle never holds up
//! the next tick and cycles may overlap. Cancelling stops future ticks only;
//! a cycle already in flight runs to completion.

use crate::error::{MetricsError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// When the first tick fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickStart {
    Immediately,
    AfterPeriod,
}

/// Handle to a running recurring job. Dropping it cancels the job.
#[derive(Debug)]
pub(crate) struct RecurringTask {
    name: &'static str,
    token: CancellationToken,
}

impl RecurringTask {
    /// Spawn `job` every `period` on the current tokio runtime
    pub(crate) fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        start: TickStart,
        job: F,
    ) -> Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if period.is_zero() {
            return Err(MetricsError::config(format!(
                "{} interval must be greater than zero",
                name
            )));
        }

        let runtime = Handle::try_current()
            .map_err(|e| MetricsError::runtime(format!("Cannot schedule {}: {}", name, e)))?;

        let token = CancellationToken::new();
        let cancelled = token.clone();

        runtime.spawn(async move {
            let first_tick = match start {
                TickStart::Immediately => Instant::now(),
                TickStart::AfterPeriod => Instant::now() + period,
            };
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::spawn(job());
                    }
                }
            }

            debug!("{} stopped", name);
        });

        debug!("{} scheduled every {:?}", name, period);
        Ok(Self { name, token })
    }

    pub(crate) fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("Cancelling {}", self.name);
            self.token.cancel();
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
