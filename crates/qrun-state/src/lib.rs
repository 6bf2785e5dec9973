//! `qrun-state` — quantum state representations for the qrun runtime.
//!
//! Two simulators live here:
//!
//! - [`StateEngine`]: a full amplitude simulator that stores the state either
//!   as a dense `Vec<Complex64>` or as a sparse index→amplitude map, and can
//!   switch between the two without changing the logical state.
//! - [`Tableau`]: an Aaronson–Gottesman stabilizer tableau for Clifford-only
//!   circuits, polynomial in the number of qubits.
//!
//! # Quick start
//!
//! ```rust
//! use qrun_state::StateEngine;
//!
//! let mut engine = StateEngine::seeded(2, 42);
//! engine.apply_h(0).unwrap();
//! engine.apply_cnot(0, 1).unwrap();
//!
//! let outcome = engine.measure_many(&[0, 1]).unwrap();
//! assert!(outcome == 0 || outcome == 3);
//! ```
//!
//! # Memory
//!
//! | Qubits | Dense memory |
//! |--------|--------------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//! | 25 | ~512 MB |
//! | 30 | ~16 GB |

pub mod engine;
pub mod error;
mod kernel;
pub mod stabilizer;

pub use engine::{EPSILON, Representation, StateEngine};
pub use error::{StateError, StateResult};
pub use stabilizer::Tableau;
