//! Pipeline and job spec configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// A named group of jobs sharing one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seconds between the starts of two consecutive cycles.
    pub period: f64,
    /// Whether a producer is started for this pipeline.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Jobs emitted on every cycle, in order.
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

/// One job entry of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Registry name of the job to run.
    pub name: String,
    /// Disabled jobs are never enqueued.
    #[serde(default)]
    pub enabled: bool,
    /// Every other key of the entry, passed to the job untouched.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl PipelineConfig {
    /// The period as a [`Duration`].
    pub fn period_duration(&self) -> Result<Duration, AppError> {
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(AppError::configuration(format!(
                "period must be a positive number of seconds, got {}",
                self.period
            )));
        }

        Duration::try_from_secs_f64(self.period).map_err(|e| {
            AppError::configuration(format!("period {} is out of range: {e}", self.period))
        })
    }

    /// Iterate over the jobs that have `enabled` set, in config order.
    pub fn enabled_jobs(&self) -> impl Iterator<Item = &JobSpec> {
        self.jobs.iter().filter(|job| job.enabled)
    }

    /// Validate the pipeline named `name`.
    pub fn validate(&self, name: &str) -> Result<(), AppError> {
        self.period_duration()
            .map_err(|e| AppError::configuration(format!("pipeline '{name}': {}", e.message)))?;

        if let Some(index) = self.jobs.iter().position(|job| job.name.trim().is_empty()) {
            return Err(AppError::configuration(format!(
                "pipeline '{name}': job #{index} has an empty name"
            )));
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(period: f64, jobs: Vec<JobSpec>) -> PipelineConfig {
        PipelineConfig {
            period,
            enabled: true,
            jobs,
        }
    }

    fn job(name: &str, enabled: bool) -> JobSpec {
        JobSpec {
            name: name.to_string(),
            enabled,
            params: Map::new(),
        }
    }

    #[test]
    fn test_period_duration_fractional() {
        let p = pipeline(0.25, vec![]);
        assert_eq!(p.period_duration().unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_non_positive_period_rejected() {
        assert!(pipeline(0.0, vec![]).validate("p").is_err());
        assert!(pipeline(-1.0, vec![]).validate("p").is_err());
        assert!(pipeline(f64::NAN, vec![]).validate("p").is_err());
        assert!(pipeline(f64::INFINITY, vec![]).validate("p").is_err());
    }

    #[test]
    fn test_empty_job_name_rejected() {
        let p = pipeline(1.0, vec![job("a", true), job(" ", true)]);
        let err = p.validate("p").expect_err("blank name must fail");
        assert!(err.message.contains("job #1"));
    }

    #[test]
    fn test_enabled_jobs_keeps_order() {
        let p = pipeline(
            1.0,
            vec![job("a", true), job("b", false), job("c", true)],
        );
        let names: Vec<&str> = p.enabled_jobs().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_job_enabled_defaults_to_false() {
        let spec: JobSpec =
            serde_json::from_str(r#"{"name": "a", "es_indices": ["x"]}"#).unwrap();
        assert!(!spec.enabled);
        assert_eq!(spec.params.len(), 1);
    }
}
