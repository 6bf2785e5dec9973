//! qrun Hardware Abstraction Layer.
//!
//! Defines the [`Instruction`] set that local simulators and external
//! backends share, and the [`Backend`] trait QPU-targeted tasks are routed
//! to. Concrete provider integrations live outside this workspace.

pub mod backend;
pub mod error;
pub mod instruction;

pub use backend::Backend;
pub use error::{HalError, HalResult};
pub use instruction::Instruction;
