//! Choosing where a task's program runs.

use std::fmt;
use std::sync::Arc;

use qrun_hal::Backend;
use qrun_sched::{ExecHint, Target};

/// How one program is executed, decided once per task.
#[derive(Clone)]
pub enum ExecutionStrategy {
    /// Full state-vector simulation on the task's register.
    LocalDense,
    /// Stabilizer-tableau simulation. Clifford programs only.
    LocalStabilizer,
    /// Hand the program to an external backend.
    RemoteBackend(Arc<dyn Backend>),
}

impl ExecutionStrategy {
    /// Pick a strategy from task metadata.
    ///
    /// QPU-targeted tasks go to `backend` when one is configured and
    /// available; otherwise they fall back to local simulation, chosen by
    /// `hint` like any other task.
    pub fn select(target: Target, hint: ExecHint, backend: Option<&Arc<dyn Backend>>) -> Self {
        if target == Target::Qpu {
            match backend {
                Some(b) if b.is_available() => {
                    tracing::debug!("QPU target routed to backend {}", b.name());
                    return ExecutionStrategy::RemoteBackend(Arc::clone(b));
                }
                Some(b) => {
                    tracing::warn!("Backend {} unavailable; running QPU task locally", b.name());
                }
                None => {
                    tracing::warn!("No QPU backend configured; running QPU task locally");
                }
            }
        }

        match hint {
            ExecHint::Clifford => ExecutionStrategy::LocalStabilizer,
            ExecHint::Dense | ExecHint::None => ExecutionStrategy::LocalDense,
        }
    }

    /// Short label used in logs and reports.
    pub fn label(&self) -> String {
        match self {
            ExecutionStrategy::LocalDense => "dense".to_string(),
            ExecutionStrategy::LocalStabilizer => "stabilizer".to_string(),
            ExecutionStrategy::RemoteBackend(b) => format!("remote:{}", b.name()),
        }
    }

    pub fn is_local(&self) -> bool {
        !matches!(self, ExecutionStrategy::RemoteBackend(_))
    }
}

impl fmt::Debug for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExecutionStrategy({})", self.label())
    }
}
