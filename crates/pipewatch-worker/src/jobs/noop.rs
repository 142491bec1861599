//! Job that does nothing but log its descriptor.

use async_trait::async_trait;
use tracing;

use pipewatch_core::result::AppResult;
use pipewatch_core::traits::search::SearchBackend;

use crate::job::JobDescriptor;
use crate::registry::JobHandler;

/// Logs the descriptor and succeeds. Useful for checking pipeline timing.
#[derive(Debug, Default)]
pub struct NoopJobHandler;

#[async_trait]
impl JobHandler for NoopJobHandler {
    fn name(&self) -> &str {
        "noop"
    }

    async fn run(&self, job: &JobDescriptor, _backend: &dyn SearchBackend) -> AppResult<()> {
        tracing::debug!(
            "noop job: pipeline='{}', scheduled_time_ms={}, params={:?}",
            job.pipeline(),
            job.scheduled_time_ms(),
            job.params()
        );
        Ok(())
    }
}
