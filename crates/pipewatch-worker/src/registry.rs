//! Job registry: maps job names to their handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing;

use pipewatch_core::config::AppConfig;
use pipewatch_core::result::AppResult;
use pipewatch_core::traits::search::SearchBackend;

use crate::error::SchedulerError;
use crate::job::JobDescriptor;

/// Trait for job implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Name under which the handler is registered
    fn name(&self) -> &str;

    /// Run the job for one descriptor against the shared search backend
    async fn run(&self, job: &JobDescriptor, backend: &dyn SearchBackend) -> AppResult<()>;
}

/// Name-keyed lookup of job handlers, populated once at startup
#[derive(Debug, Default)]
pub struct JobRegistry {
    /// Registered job handlers by name
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler, replacing any handler with the same name
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let name = handler.name().to_string();
        tracing::info!("Registered job handler '{}'", name);
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::warn!("Job handler '{}' replaced an earlier registration", name);
        }
    }

    /// Resolve a job name, failing with [`SchedulerError::UnknownJob`] on a miss
    pub fn get(&self, name: &str) -> Result<Arc<dyn JobHandler>, SchedulerError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownJob(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Enabled jobs of enabled pipelines that have no handler, as
    /// `(pipeline, job)` pairs.
    pub fn missing_jobs(&self, config: &AppConfig) -> Vec<(String, String)> {
        config
            .enabled_pipelines()
            .flat_map(|(pipeline, p)| {
                p.enabled_jobs()
                    .filter(|job| !self.contains(&job.name))
                    .map(move |job| (pipeline.clone(), job.name.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(&'static str);

    #[async_trait]
    impl JobHandler for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _job: &JobDescriptor, _backend: &dyn SearchBackend) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let mut registry = JobRegistry::new();
        registry.register(Arc::new(Named("noop")));

        assert!(registry.get("noop").is_ok());
        match registry.get("missing") {
            Err(SchedulerError::UnknownJob(name)) => assert_eq!(name, "missing"),
            other => panic!("expected UnknownJob, got {other:?}"),
        }
    }

    #[test]
    fn test_registered_names_sorted() {
        let mut registry = JobRegistry::new();
        registry.register(Arc::new(Named("zeta")));
        registry.register(Arc::new(Named("alpha")));
        registry.register(Arc::new(Named("alpha")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.registered_names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_missing_jobs_only_checks_enabled() {
        let config = AppConfig::from_json_str(
            r#"{
                "num_consumers": 1,
                "pipelines": {
                    "p1": {"period": 1, "jobs": [
                        {"name": "noop", "enabled": true},
                        {"name": "ghost", "enabled": true},
                        {"name": "dormant", "enabled": false}
                    ]},
                    "off": {"period": 1, "enabled": false, "jobs": [
                        {"name": "phantom", "enabled": true}
                    ]}
                }
            }"#,
        )
        .unwrap();

        let mut registry = JobRegistry::new();
        registry.register(Arc::new(Named("noop")));

        assert_eq!(
            registry.missing_jobs(&config),
            vec![("p1".to_string(), "ghost".to_string())]
        );
    }
}
