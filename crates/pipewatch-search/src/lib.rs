//! # pipewatch-search
//!
//! Search backend implementations for Pipewatch. Currently an HTTP client
//! speaking the Elasticsearch REST API.

pub mod http;

pub use http::HttpSearchBackend;
