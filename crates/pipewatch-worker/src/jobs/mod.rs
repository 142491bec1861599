//! Built-in job handler implementations.

pub mod doc_count;
pub mod noop;

use std::sync::Arc;

pub use doc_count::DocCountJobHandler;
pub use noop::NoopJobHandler;

use crate::registry::JobRegistry;

/// Register every built-in job handler.
pub fn register_builtin_jobs(registry: &mut JobRegistry) {
    registry.register(Arc::new(NoopJobHandler));
    registry.register(Arc::new(DocCountJobHandler));
}
