//! Service configuration schemas.
//!
//! The configuration is a single JSON document deserialized via the
//! `config` crate, with `PIPEWATCH__*` environment variables layered on top.
//! Each sub-module represents a logical configuration section.

pub mod logging;
pub mod pipeline;
pub mod search;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::pipeline::PipelineConfig;
use self::search::SearchConfig;

use crate::error::AppError;

/// Root service configuration.
///
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Size of the consumer pool.
    pub num_consumers: usize,
    /// Pipelines keyed by name.
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineConfig>,
    /// Queue depth at which a backlog warning is logged.
    #[serde(default = "default_queue_warn_depth")]
    pub queue_warn_depth: usize,
    /// Search backend connection settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// The file is always parsed as JSON, whatever its extension.
    ///
    /// Values from environment variables prefixed with `PIPEWATCH` (using `__`
    /// as the nesting separator) override the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(true),
            )
            .add_source(
                config::Environment::with_prefix("PIPEWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to read config '{}': {e}",
                    path.display()
                ))
            })?;

        Self::deserialize_validated(config)
    }

    /// Parse configuration from an in-memory JSON document.
    ///
    /// Environment overrides are not applied.
    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(json, config::FileFormat::Json))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to parse config: {e}")))?;

        Self::deserialize_validated(config)
    }

    fn deserialize_validated(config: config::Config) -> Result<Self, AppError> {
        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Check the invariants the scheduler relies on.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.num_consumers == 0 {
            return Err(AppError::configuration(
                "num_consumers must be greater than zero",
            ));
        }

        for (name, pipeline) in &self.pipelines {
            pipeline.validate(name)?;
        }

        Ok(())
    }

    /// Iterate over the pipelines that have `enabled` set.
    pub fn enabled_pipelines(&self) -> impl Iterator<Item = (&String, &PipelineConfig)> {
        self.pipelines.iter().filter(|(_, p)| p.enabled)
    }
}

fn default_queue_warn_depth() -> usize {
    1000
}
