//! # pipewatch-core
//!
//! Core crate for Pipewatch. Contains the configuration schema, the
//! search backend trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Pipewatch crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
