//! Periodic job scheduling for Pipewatch.
//!
//! This crate provides:
//! - Producers that emit one job descriptor per enabled job on every pipeline period
//! - A shared unbounded FIFO queue between producers and consumers
//! - A fixed pool of consumers dispatching descriptors through the job registry
//! - An orchestrator that supervises all of them and surfaces the first failure
//! - Built-in job implementations run against the search backend

pub mod consumer;
pub mod error;
pub mod job;
pub mod jobs;
pub mod orchestrator;
pub mod producer;
pub mod queue;
pub mod registry;

pub use consumer::Consumer;
pub use error::SchedulerError;
pub use job::{JobDescriptor, JobParams};
pub use orchestrator::Orchestrator;
pub use producer::Producer;
pub use queue::JobQueue;
pub use registry::{JobHandler, JobRegistry};
