//! Register lifetime management for the qrun runtime.
//!
//! The [`MemoryManager`] is the only way to obtain registers. It hands out
//! [`QRegId`]/[`CRegId`] values, reuses the smallest released id first, and
//! keeps a per-id counter of how many registers have lived in each slot.
//!
//! Quantum registers build their [`StateEngine`](qrun_state::StateEngine)
//! on first use, so allocating a wide register that is never touched costs
//! nothing.
//!
//! # Example
//!
//! ```
//! use qrun_mem::MemoryManager;
//!
//! let mm = MemoryManager::seeded(7);
//! let q = mm.create_qregister(2).unwrap();
//! mm.with_qreg(q, |reg| {
//!     reg.h(0)?;
//!     reg.cnot(0, 1)
//! })
//! .unwrap()
//! .unwrap();
//!
//! mm.save_resonance_zone(q, "bell").unwrap();
//! mm.release_qregister(q).unwrap();
//!
//! // The released id is handed out again.
//! let again = mm.create_qregister(2).unwrap();
//! assert_eq!(again, q);
//! mm.load_resonance_zone(again, "bell").unwrap();
//! ```
//!
//! # Saved-state format
//!
//! Files written by [`QRegister::save_to_file`] hold an 8-byte
//! little-endian amplitude count followed by that many pairs of
//! little-endian `f64` (real, imaginary). See [`persist`].

pub mod error;
pub mod manager;
pub mod persist;
pub mod register;

pub use error::{MemError, MemResult};
pub use manager::{CRegHandle, MemoryConfig, MemoryManager, QRegHandle};
pub use register::{CRegId, CRegister, QRegId, QRegister};
