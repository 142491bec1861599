//! Convenience result type alias for Pipewatch.

use crate::error::AppError;

/// A specialized `Result` type for Pipewatch operations.
pub type AppResult<T> = Result<T, AppError>;
