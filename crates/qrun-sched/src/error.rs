//! Error handling for the task scheduler.

use thiserror::Error;

use crate::task::TaskId;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur during scheduler operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SchedError {
    /// Task id was never issued by this scheduler.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// The background worker thread could not be started.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
