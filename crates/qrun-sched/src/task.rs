//! Task types for the scheduler.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deferred unit of work. Runs exactly once.
pub type TaskBody = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Identifier issued by [`Scheduler::add_task`](crate::Scheduler::add_task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Task priority. Higher values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(pub i64);

impl Priority {
    /// Default priority (0).
    pub const DEFAULT: Priority = Priority(0);

    /// Low priority (-10).
    pub const LOW: Priority = Priority(-10);

    /// High priority (10).
    pub const HIGH: Priority = Priority(10);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Where a task would like to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Cpu,
    Qpu,
    Mixed,
    Auto,
}

/// Simulation hint attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecHint {
    #[default]
    None,
    /// Prefer full state-vector simulation.
    Dense,
    /// The task only uses Clifford gates.
    Clifford,
}

/// A named unit of work with routing metadata.
///
/// The scheduler only reads the priority; target and hint are for the
/// body's builder to interpret.
pub struct Task {
    pub name: String,
    pub target: Target,
    pub hint: ExecHint,
    pub priority: Priority,
    body: TaskBody,
}

impl Task {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            target: Target::default(),
            hint: ExecHint::default(),
            priority: Priority::default(),
            body: Box::new(body),
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_hint(mut self, hint: ExecHint) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    pub(crate) fn into_body(self) -> TaskBody {
        self.body
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("hint", &self.hint)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    /// The body returned an error or panicked.
    Failed { reason: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Running => "Running",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed { .. } => "Failed",
        }
    }
}

/// What the scheduler remembers about a task after it finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub target: Target,
    pub hint: ExecHint,
    pub priority: Priority,
    pub status: TaskStatus,
    pub submitted_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Wall-clock time spent in the body.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
