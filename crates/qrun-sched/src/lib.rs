//! Priority task scheduler for qrun.
//!
//! Tasks are queued with [`Scheduler::add_task`] and executed highest
//! priority first, first-come first-served among equal priorities. At most
//! one task body runs at any instant, whether the queue is drained by
//! [`Scheduler::run`] on the calling thread or by the background worker
//! started with [`Scheduler::run_async`].
//!
//! A body that returns an error or panics marks its task
//! [`TaskStatus::Failed`]; the drain moves on to the next task.
//!
//! [`Target`] and [`ExecHint`] travel with the task for whoever builds the
//! body. The scheduler itself orders by priority only.

pub mod error;
mod queue;
pub mod scheduler;
pub mod task;

pub use error::{SchedError, SchedResult};
pub use scheduler::{DEFAULT_HISTORY_LIMIT, DrainSummary, Scheduler};
pub use task::{ExecHint, Priority, Target, Task, TaskBody, TaskId, TaskRecord, TaskStatus};
