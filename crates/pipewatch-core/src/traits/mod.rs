//! Core traits defined in `pipewatch-core` and implemented by other crates.

pub mod search;

pub use search::SearchBackend;
