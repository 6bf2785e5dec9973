//! Backend errors.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// The backend is offline or not configured.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// The backend accepted the program but could not run it.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The program contains an instruction the backend has no equivalent
    /// for.
    #[error("Unsupported instruction: {0}")]
    Unsupported(String),

    /// The program could not be encoded for submission.
    #[error("Could not encode program: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else reported by the backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type HalResult<T> = Result<T, HalError>;
