//! Scheduler failure taxonomy.
//!
//! Every variant is fatal: the task that produces it stops, and the
//! orchestrator hands it back to the process as its exit reason.

use pipewatch_core::error::AppError;

/// Error that terminates a producer, a consumer, or the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A descriptor named a job with no registry entry.
    #[error("No job registered under name '{0}'")]
    UnknownJob(String),

    /// A job handler returned an error.
    #[error("Job '{job}' failed")]
    JobExecution {
        /// Name of the failed job.
        job: String,
        /// Error raised by the handler.
        #[source]
        source: AppError,
    },

    /// The shared queue rejected an insert or take.
    #[error("Queue error: {0}")]
    Queue(AppError),

    /// The scheduler could not be built from configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(AppError),

    /// A scheduler task panicked.
    #[error("Task '{task}' panicked: {message}")]
    TaskPanicked {
        /// Name of the task, e.g. `consumer-1`.
        task: String,
        /// Panic payload rendered as text.
        message: String,
    },

    /// A scheduler task was aborted from outside.
    #[error("Task '{task}' was cancelled")]
    TaskCancelled {
        /// Name of the task.
        task: String,
    },

    /// The orchestrator had nothing to run.
    #[error("No scheduler tasks to run")]
    NoTasks,
}
