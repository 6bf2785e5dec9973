//! qrun runtime: sessions that tie registers, scheduling and execution
//! together.
//!
//! A [`Session`] is built from a [`RuntimeConfig`] and owns a
//! [`MemoryManager`](qrun_mem::MemoryManager), a
//! [`Scheduler`](qrun_sched::Scheduler) and an optional
//! [`Backend`](qrun_hal::Backend). Programs submitted to it become tasks
//! whose execution strategy is picked from their target and hint when they
//! run:
//!
//! | Target | Hint | Strategy |
//! |--------|------|----------|
//! | QPU, backend available | any | remote backend |
//! | anything else | `Clifford` | stabilizer tableau |
//! | anything else | `None` / `Dense` | dense state vector |
//!
//! ```
//! use qrun_hal::Instruction;
//! use qrun_runtime::{Program, RuntimeConfig, Session};
//!
//! let mut config = RuntimeConfig::default();
//! config.memory.seed = Some(1);
//! let session = Session::new(config).unwrap();
//!
//! session.submit_program(Program::new(
//!     "flip",
//!     1,
//!     vec![Instruction::X(0), Instruction::Measure { qubit: 0, clbit: 0 }],
//! ));
//! session.run();
//! assert_eq!(session.reports()[0].classical_value(), Some(1));
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod patterns;
pub mod session;
pub mod strategy;
pub mod telemetry;

pub use config::{CheckpointConfig, ConfigError, LoggingConfig, RuntimeConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use executor::{ExecutionReport, Executor, MeasurementRecord};
pub use session::{Program, Session, SessionId};
pub use strategy::ExecutionStrategy;
pub use telemetry::{TracingFormat, init_tracing};
