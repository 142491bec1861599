//! Consumer: takes descriptors off the queue and runs them one at a time.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use tracing;

use pipewatch_core::traits::search::SearchBackend;

use crate::error::SchedulerError;
use crate::job::JobDescriptor;
use crate::queue::JobQueue;
use crate::registry::JobRegistry;

/// One member of the consumer pool.
///
/// Job failures are not caught: the first error ends the consumer.
#[derive(Debug, Clone)]
pub struct Consumer {
    /// Position in the pool, used in logs
    id: usize,
    /// Shared queue
    queue: Arc<JobQueue>,
    /// Job name lookup
    registry: Arc<JobRegistry>,
    /// Search backend handed to every job
    backend: Arc<dyn SearchBackend>,
}

impl Consumer {
    /// Create a consumer
    pub fn new(
        id: usize,
        queue: Arc<JobQueue>,
        registry: Arc<JobRegistry>,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        Self {
            id,
            queue,
            registry,
            backend,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Take and execute jobs until one fails.
    pub async fn run(self) -> Result<Infallible, SchedulerError> {
        tracing::debug!("Consumer {} waiting for jobs", self.id);

        loop {
            let job = self.queue.take().await.map_err(SchedulerError::Queue)?;
            self.execute(&job).await?;
        }
    }

    /// Resolve and run a single descriptor.
    pub async fn execute(&self, job: &JobDescriptor) -> Result<(), SchedulerError> {
        let handler = self.registry.get(job.name())?;

        tracing::info!(
            consumer = self.id,
            job_id = %job.id(),
            pipeline = job.pipeline(),
            scheduled_time_ms = job.scheduled_time_ms(),
            "Starting the '{}' job",
            job.name()
        );

        let started = Instant::now();
        handler
            .run(job, self.backend.as_ref())
            .await
            .map_err(|source| SchedulerError::JobExecution {
                job: job.name().to_string(),
                source,
            })?;

        tracing::info!(
            consumer = self.id,
            job_id = %job.id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished running the '{}' job",
            job.name()
        );

        Ok(())
    }
}
