//! Search backend trait used by job handlers.

use async_trait::async_trait;
use serde_json::Value;

use crate::result::AppResult;

/// Trait for the external search backend jobs operate against.
///
/// The handle is created once at startup and shared read-only by every
/// consumer. The HTTP implementation lives in `pipewatch-search`.
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g., "elasticsearch").
    fn backend_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Count the documents in `indices` matching `query`.
    ///
    /// `query` is the body of a `query` clause, e.g. `{"match_all": {}}`.
    async fn count(&self, indices: &[String], query: Value) -> AppResult<u64>;

    /// Run a search request with the given body and return the raw response.
    async fn search(&self, indices: &[String], body: Value) -> AppResult<Value>;
}
