//! Error types for the state crate.

use thiserror::Error;

/// Errors produced by the statevector engine and the stabilizer tableau.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    /// A gate or measurement names a qubit the state does not have.
    #[error("Qubit {qubit} out of range for a {num_qubits}-qubit state")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: usize,
        /// Number of qubits in the state.
        num_qubits: usize,
    },

    /// The same qubit appears twice in a multi-qubit operation.
    #[error("Qubit {0} used more than once in a single operation")]
    DuplicateQubit(usize),

    /// An incoming amplitude vector does not match the state dimension.
    #[error("Amplitude length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// Dimension of the state (2^n).
        expected: usize,
        /// Length of the rejected vector.
        found: usize,
    },
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
