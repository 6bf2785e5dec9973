//! Error types for register management.

use qrun_state::StateError;
use thiserror::Error;

use crate::register::{CRegId, QRegId};

/// Errors raised by registers and the memory manager.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MemError {
    /// The quantum register id is not live (never allocated or released).
    #[error("Quantum register not found: {0}")]
    QRegisterNotFound(QRegId),

    /// The classical register id is not live.
    #[error("Classical register not found: {0}")]
    CRegisterNotFound(CRegId),

    /// Requested register is wider than the manager allows.
    #[error("Register of {requested} qubits exceeds the limit of {max}")]
    TooManyQubits { requested: usize, max: usize },

    /// Incoming amplitude vector does not match the register size.
    #[error("State length mismatch: register holds {expected} amplitudes, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// A saved-state blob is shorter or longer than its header claims.
    #[error("Corrupt state data: {0}")]
    CorruptState(String),

    /// No resonance-zone entry under this key.
    #[error("Resonance zone not found: {0}")]
    ResonanceKeyMissing(String),

    /// Classical bit index past the end of the register.
    #[error("Classical bit {index} out of range for a {len}-bit register")]
    BitOutOfRange { index: usize, len: usize },

    /// Error from the underlying state engine.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// IO error while saving or loading state.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for memory operations.
pub type MemResult<T> = Result<T, MemError>;
