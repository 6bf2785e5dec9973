//! Error types for the runtime crate.

use qrun_hal::HalError;
use qrun_mem::MemError;
use qrun_sched::SchedError;
use qrun_state::StateError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while configuring a session or executing a program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Register or persistence failure.
    #[error("Memory error: {0}")]
    Memory(#[from] MemError),

    /// Simulator failure outside a register.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Scheduler failure.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedError),

    /// Backend refused the program.
    #[error("Backend error: {0}")]
    Backend(#[from] HalError),

    /// The stabilizer path was chosen for a program with a non-Clifford
    /// instruction.
    #[error("Instruction {index} ({instruction}) is not a Clifford gate")]
    NonClifford { index: usize, instruction: String },

    /// An instruction addresses a qubit the register does not have.
    #[error("Instruction {index} addresses qubit {qubit} of a {width}-qubit register")]
    QubitOutOfRange {
        index: usize,
        qubit: usize,
        width: usize,
    },

    /// A measurement targets a classical bit the register does not have.
    #[error("Classical bit {clbit} out of range for a {len}-bit register")]
    ClbitOutOfRange { clbit: usize, len: usize },

    /// Logging could not be initialized.
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// IO error (checkpoint directory creation).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
