//! Shared test helpers for scheduler integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use pipewatch_core::error::AppError;
use pipewatch_core::result::AppResult;
use pipewatch_core::traits::search::SearchBackend;
use pipewatch_worker::{JobDescriptor, JobHandler, JobRegistry};

/// Search backend that answers every request without I/O
#[derive(Debug, Default)]
pub struct StubBackend;

#[async_trait]
impl SearchBackend for StubBackend {
    fn backend_type(&self) -> &str {
        "stub"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn count(&self, _indices: &[String], _query: Value) -> AppResult<u64> {
        Ok(0)
    }

    async fn search(&self, _indices: &[String], _body: Value) -> AppResult<Value> {
        Ok(Value::Null)
    }
}

/// One recorded job invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub id: Uuid,
    pub scheduled_time_ms: i64,
    pub params: Value,
}

/// Handler that records every descriptor it runs
#[derive(Debug)]
pub struct RecordingJob {
    name: String,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingJob {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A recording job that sleeps for `delay` before returning
    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            delay: Some(delay),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl JobHandler for RecordingJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, job: &JobDescriptor, _backend: &dyn SearchBackend) -> AppResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.calls.lock().unwrap().push(Call {
            id: job.id(),
            scheduled_time_ms: job.scheduled_time_ms(),
            params: Value::Object(job.params().clone()),
        });
        Ok(())
    }
}

/// Handler that always fails
#[derive(Debug)]
pub struct FailingJob(pub &'static str);

#[async_trait]
impl JobHandler for FailingJob {
    fn name(&self) -> &str {
        self.0
    }

    async fn run(&self, _job: &JobDescriptor, _backend: &dyn SearchBackend) -> AppResult<()> {
        Err(AppError::external_service("connection refused"))
    }
}

/// Build a registry from a list of handlers
pub fn registry(handlers: Vec<Arc<dyn JobHandler>>) -> Arc<JobRegistry> {
    let mut registry = JobRegistry::new();
    for handler in handlers {
        registry.register(handler);
    }
    Arc::new(registry)
}
