//! Orchestrator: runs every producer and consumer under one task group.

use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use tokio::task::{self, JoinSet};
use tracing;

use pipewatch_core::config::AppConfig;
use pipewatch_core::traits::search::SearchBackend;

use crate::consumer::Consumer;
use crate::error::SchedulerError;
use crate::producer::Producer;
use crate::queue::JobQueue;
use crate::registry::JobRegistry;

/// Wires configuration to producers and the consumer pool.
///
/// All tasks loop forever, so [`Orchestrator::run`] only returns when one of
/// them stops. That is always a failure; the remaining tasks are aborted.
#[derive(Debug)]
pub struct Orchestrator {
    /// Queue shared by every task
    queue: Arc<JobQueue>,
    /// One producer per enabled pipeline
    producers: Vec<Producer>,
    /// Consumer pool
    consumers: Vec<Consumer>,
}

impl Orchestrator {
    /// Build producers and consumers from a validated configuration.
    pub fn from_config(
        config: &AppConfig,
        registry: Arc<JobRegistry>,
        backend: Arc<dyn SearchBackend>,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::Configuration)?;

        let queue = Arc::new(JobQueue::new(config.queue_warn_depth));

        let producers = config
            .enabled_pipelines()
            .map(|(name, pipeline)| Producer::new(name, pipeline, Arc::clone(&queue)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(SchedulerError::Configuration)?;

        if producers.is_empty() {
            tracing::warn!("No enabled pipelines configured; consumers will wait indefinitely");
        }

        for (pipeline, job) in registry.missing_jobs(config) {
            tracing::warn!(
                "Pipeline '{}' schedules job '{}' which has no registered handler",
                pipeline,
                job
            );
        }

        let consumers = (0..config.num_consumers)
            .map(|id| {
                Consumer::new(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&registry),
                    Arc::clone(&backend),
                )
            })
            .collect();

        Ok(Self {
            queue,
            producers,
            consumers,
        })
    }

    /// The queue shared by this orchestrator's tasks.
    pub fn queue(&self) -> Arc<JobQueue> {
        Arc::clone(&self.queue)
    }

    /// Start every task and wait for the first one to stop.
    pub async fn run(self) -> Result<Infallible, SchedulerError> {
        let mut tasks: JoinSet<Result<Infallible, SchedulerError>> = JoinSet::new();
        let mut names: HashMap<task::Id, String> = HashMap::new();

        tracing::info!(
            "Starting {} producer(s) and {} consumer(s)",
            self.producers.len(),
            self.consumers.len()
        );

        for producer in self.producers {
            let name = format!("producer-{}", producer.pipeline());
            let handle = tasks.spawn(producer.run());
            names.insert(handle.id(), name);
        }

        for consumer in self.consumers {
            let name = format!("consumer-{}", consumer.id());
            let handle = tasks.spawn(consumer.run());
            names.insert(handle.id(), name);
        }

        let task_name = |id: task::Id| {
            names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("task-{id}"))
        };

        let error = match tasks.join_next_with_id().await {
            Some(Ok((id, Err(e)))) => {
                tracing::error!(error = ?e, "Task '{}' failed: {}", task_name(id), e);
                e
            }
            Some(Err(join_error)) => {
                let task = task_name(join_error.id());
                if join_error.is_panic() {
                    let message = panic_message(join_error.into_panic());
                    tracing::error!("Task '{}' panicked: {}", task, message);
                    SchedulerError::TaskPanicked { task, message }
                } else {
                    tracing::error!("Task '{}' was cancelled", task);
                    SchedulerError::TaskCancelled { task }
                }
            }
            None => SchedulerError::NoTasks,
        };

        tracing::info!("Stopping {} remaining scheduler task(s)", tasks.len());
        tasks.shutdown().await;

        Err(error)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
