//! Elasticsearch-compatible HTTP search backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tracing::debug;

use pipewatch_core::config::search::SearchConfig;
use pipewatch_core::error::{AppError, ErrorKind};
use pipewatch_core::result::AppResult;
use pipewatch_core::traits::search::SearchBackend;

/// Search backend talking to an Elasticsearch cluster over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    /// Shared connection-pooling client.
    client: Client,
    /// Base URL without a trailing slash.
    base_url: String,
    /// Optional basic-auth credentials.
    credentials: Option<(String, Option<String>)>,
}

impl HttpSearchBackend {
    /// Create a new backend from configuration.
    pub fn new(config: &SearchConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build search HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    /// Build the URL of an index-scoped endpoint such as `_count`.
    fn index_url(&self, indices: &[String], endpoint: &str) -> String {
        let target = if indices.is_empty() {
            "_all".to_string()
        } else {
            indices.join(",")
        };
        format!("{}/{}/{}", self.base_url, target, endpoint)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, password.as_deref()),
            None => request,
        }
    }

    /// Send a request and decode the JSON body, mapping every failure to
    /// an external service error.
    async fn send_json(&self, request: RequestBuilder, what: &str) -> AppResult<Value> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Search {what} request failed"),
                    e,
                )
            })?
            .error_for_status()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Search {what} returned an error status"),
                    e,
                )
            })?;

        response.json::<Value>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Search {what} returned an invalid body"),
                e,
            )
        })
    }
}

/// Extract the `count` field of a `_count` response.
fn parse_count(body: &Value) -> AppResult<u64> {
    body.get("count").and_then(Value::as_u64).ok_or_else(|| {
        AppError::external_service(format!("Count response has no 'count' field: {body}"))
    })
}

/// A cluster is usable unless its health status is `red`.
fn parse_health(body: &Value) -> AppResult<bool> {
    match body.get("status").and_then(Value::as_str) {
        Some("green") | Some("yellow") => Ok(true),
        Some(_) => Ok(false),
        None => Err(AppError::external_service(format!(
            "Health response has no 'status' field: {body}"
        ))),
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    fn backend_type(&self) -> &str {
        "elasticsearch"
    }

    async fn health_check(&self) -> AppResult<bool> {
        let url = format!("{}/_cluster/health", self.base_url);
        let body = self.send_json(self.client.get(&url), "health").await?;
        parse_health(&body)
    }

    async fn count(&self, indices: &[String], query: Value) -> AppResult<u64> {
        let url = self.index_url(indices, "_count");
        debug!("Counting documents: url={}", url);

        let request = self.client.post(&url).json(&json!({ "query": query }));
        let body = self.send_json(request, "count").await?;
        parse_count(&body)
    }

    async fn search(&self, indices: &[String], body: Value) -> AppResult<Value> {
        let url = self.index_url(indices, "_search");
        debug!("Searching: url={}", url);

        self.send_json(self.client.post(&url).json(&body), "search")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(url: &str) -> HttpSearchBackend {
        let config = SearchConfig {
            url: url.to_string(),
            ..SearchConfig::default()
        };
        HttpSearchBackend::new(&config).expect("client builds")
    }

    #[test]
    fn test_index_url_joins_indices() {
        let b = backend("http://localhost:9200/");
        let indices = vec!["crashlogs-1".to_string(), "crashlogs-2".to_string()];
        assert_eq!(
            b.index_url(&indices, "_count"),
            "http://localhost:9200/crashlogs-1,crashlogs-2/_count"
        );
    }

    #[test]
    fn test_index_url_defaults_to_all() {
        let b = backend("http://localhost:9200");
        assert_eq!(
            b.index_url(&[], "_search"),
            "http://localhost:9200/_all/_search"
        );
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&json!({"count": 42, "_shards": {}})).unwrap(), 42);
        let err = parse_count(&json!({"error": "boom"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
    }

    #[test]
    fn test_parse_health() {
        assert!(parse_health(&json!({"status": "green"})).unwrap());
        assert!(parse_health(&json!({"status": "yellow"})).unwrap());
        assert!(!parse_health(&json!({"status": "red"})).unwrap());
        assert!(parse_health(&json!({})).is_err());
    }

    #[test]
    fn test_credentials_from_config() {
        let config = SearchConfig {
            username: Some("elastic".to_string()),
            password: Some("secret".to_string()),
            ..SearchConfig::default()
        };
        let b = HttpSearchBackend::new(&config).unwrap();
        assert_eq!(
            b.credentials,
            Some(("elastic".to_string(), Some("secret".to_string())))
        );
        assert_eq!(b.backend_type(), "elasticsearch");
    }
}
