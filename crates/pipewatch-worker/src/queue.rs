//! Shared job queue between producers and consumers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tracing;

use pipewatch_core::error::AppError;
use pipewatch_core::result::AppResult;

use crate::job::JobDescriptor;

/// Unbounded multi-producer, multi-consumer FIFO of job descriptors.
///
/// Inserts never block. Consumers serialize on the receiver lock, so each
/// descriptor is handed to exactly one `take` caller. The queue owns both
/// ends of the channel and therefore never observes it closed.
#[derive(Debug)]
pub struct JobQueue {
    /// Insert side, shared by all producers
    sender: mpsc::UnboundedSender<JobDescriptor>,
    /// Take side, shared by all consumers
    receiver: Mutex<mpsc::UnboundedReceiver<JobDescriptor>>,
    /// Items inserted but not yet taken
    depth: AtomicUsize,
    /// Lifetime insert count
    enqueued: AtomicU64,
    /// Lifetime take count
    dequeued: AtomicU64,
    /// Depth at which a backlog warning is logged
    warn_depth: usize,
}

impl JobQueue {
    /// Create an empty queue that warns once the backlog exceeds `warn_depth`.
    pub fn new(warn_depth: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
            depth: AtomicUsize::new(0),
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            warn_depth,
        }
    }

    /// Append a descriptor. Never waits.
    pub fn insert(&self, job: JobDescriptor) -> AppResult<()> {
        let previous = self.depth.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.sender.send(job) {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(AppError::internal(format!(
                "Failed to enqueue job '{}': queue closed",
                e.0.name()
            )));
        }

        self.enqueued.fetch_add(1, Ordering::Relaxed);

        if previous == self.warn_depth {
            tracing::warn!(
                "Job queue backlog exceeded {} pending job(s); consumers are falling behind",
                self.warn_depth
            );
        }

        Ok(())
    }

    /// Wait for the next descriptor and remove it from the queue.
    pub async fn take(&self) -> AppResult<JobDescriptor> {
        let job = {
            let mut receiver = self.receiver.lock().await;
            receiver
                .recv()
                .await
                .ok_or_else(|| AppError::internal("Job queue closed"))?
        };

        self.depth.fetch_sub(1, Ordering::SeqCst);
        self.dequeued.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            "Dequeued job: id={}, name='{}', pipeline='{}'",
            job.id(),
            job.name(),
            job.pipeline()
        );

        Ok(job)
    }

    /// Number of descriptors waiting to be taken.
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the queue counters.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.len(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Descriptors waiting for a consumer
    pub pending: usize,
    /// Descriptors inserted since startup
    pub enqueued: u64,
    /// Descriptors taken since startup
    pub dequeued: u64,
}
