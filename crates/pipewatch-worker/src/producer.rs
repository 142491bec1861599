//! Pipeline producer: emits one descriptor per enabled job every period.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task;
use tokio::time::{self, Instant};
use tracing;

use pipewatch_core::config::pipeline::PipelineConfig;
use pipewatch_core::result::AppResult;

use crate::error::SchedulerError;
use crate::job::{JobDescriptor, JobParams};
use crate::queue::JobQueue;

/// Periodic producer for a single pipeline.
///
/// Cycles are aligned to `start + n * period` rather than spaced by a fixed
/// sleep, so time spent enqueueing does not accumulate as drift.
#[derive(Debug)]
pub struct Producer {
    /// Pipeline name
    pipeline: String,
    /// Time between cycle starts
    period: Duration,
    /// Enabled jobs in config order, params shared by every descriptor
    jobs: Vec<(String, Arc<JobParams>)>,
    /// Shared queue
    queue: Arc<JobQueue>,
}

impl Producer {
    /// Build a producer from a pipeline configuration.
    ///
    /// Disabled jobs are dropped here and never reach the queue.
    pub fn new(name: &str, config: &PipelineConfig, queue: Arc<JobQueue>) -> AppResult<Self> {
        let period = config.period_duration()?;
        let jobs = config
            .enabled_jobs()
            .map(|job| (job.name.clone(), Arc::new(job.params.clone())))
            .collect();

        Ok(Self {
            pipeline: name.to_string(),
            period,
            jobs,
            queue,
        })
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of descriptors emitted per cycle.
    pub fn jobs_per_cycle(&self) -> usize {
        self.jobs.len()
    }

    /// Enqueue one descriptor per enabled job, all stamped `scheduled_time`.
    pub fn enqueue_cycle(&self, scheduled_time: DateTime<Utc>) -> AppResult<usize> {
        for (name, params) in &self.jobs {
            let job = JobDescriptor::new(
                name.as_str(),
                self.pipeline.as_str(),
                scheduled_time,
                Arc::clone(params),
            );
            self.queue.insert(job)?;
        }
        Ok(self.jobs.len())
    }

    /// Run cycles until an enqueue fails.
    pub async fn run(self) -> Result<Infallible, SchedulerError> {
        tracing::info!(
            "Producer for pipeline '{}' started: period={:?}, jobs={}",
            self.pipeline,
            self.period,
            self.jobs.len()
        );

        let clock = WallClock::anchor();
        let mut cycle_start = Instant::now();

        loop {
            let scheduled_time = clock.at(cycle_start);

            let enqueued = self
                .enqueue_cycle(scheduled_time)
                .map_err(SchedulerError::Queue)?;

            let (sleep, next_start) = next_cycle(cycle_start, self.period, Instant::now());

            if sleep.is_zero() {
                tracing::warn!(
                    "Pipeline '{}' overran its period of {:?}; starting next cycle immediately",
                    self.pipeline,
                    self.period
                );
            }

            tracing::info!(
                pipeline = %self.pipeline,
                enqueued,
                sleep_seconds = sleep.as_secs_f64(),
                "Done enqueuing jobs in '{}'. Added {} job(s) to the queue. Sleeping for {:.3}s",
                self.pipeline,
                enqueued,
                sleep.as_secs_f64()
            );

            if sleep.is_zero() {
                task::yield_now().await;
            } else {
                time::sleep_until(next_start).await;
            }
            cycle_start = next_start;
        }
    }
}

/// Time left until `deadline`, clamped to zero once it has passed.
pub fn remaining_sleep(deadline: Instant, now: Instant) -> Duration {
    deadline.saturating_duration_since(now)
}

/// Decide how long to sleep after a cycle and when the next one starts.
///
/// A cycle that finished inside its period is followed by one starting exactly
/// at `cycle_start + period`, so wake-up latency never accumulates. An overrun
/// cycle is followed immediately by the next one, starting at `now`; missed
/// cycles are not replayed.
pub fn next_cycle(cycle_start: Instant, period: Duration, now: Instant) -> (Duration, Instant) {
    let deadline = cycle_start + period;
    let sleep = remaining_sleep(deadline, now);
    if sleep.is_zero() {
        (Duration::ZERO, now)
    } else {
        (sleep, deadline)
    }
}

/// Maps monotonic instants to wall-clock time from a single anchor.
///
/// Scheduled times derived this way never go backwards, even if the system
/// clock is stepped while the producer runs.
#[derive(Debug, Clone, Copy)]
struct WallClock {
    wall: DateTime<Utc>,
    instant: Instant,
}

impl WallClock {
    fn anchor() -> Self {
        Self {
            wall: Utc::now(),
            instant: Instant::now(),
        }
    }

    fn at(&self, instant: Instant) -> DateTime<Utc> {
        let elapsed = instant.saturating_duration_since(self.instant);
        TimeDelta::from_std(elapsed)
            .ok()
            .and_then(|delta| self.wall.checked_add_signed(delta))
            .unwrap_or_else(Utc::now)
    }
}
