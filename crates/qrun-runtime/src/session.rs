//! A runtime session: one memory manager, one scheduler, one optional
//! backend.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use qrun_hal::{Backend, Instruction};
use qrun_mem::{MemoryManager, QRegId};
use qrun_sched::{
    DrainSummary, ExecHint, Priority, Scheduler, Target, Task, TaskId, TaskRecord, TaskStatus,
};
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::error::RuntimeResult;
use crate::executor::{ExecutionReport, Executor};
use crate::strategy::ExecutionStrategy;

/// Unique identifier of a session, used to name its checkpoint files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named instruction list with the registers it needs and its routing
/// metadata.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub num_qubits: usize,
    pub num_clbits: usize,
    pub instructions: Vec<Instruction>,
    pub target: Target,
    pub hint: ExecHint,
    pub priority: Priority,
}

impl Program {
    /// A CPU program with one classical bit per qubit.
    pub fn new(name: impl Into<String>, num_qubits: usize, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits: num_qubits,
            instructions,
            target: Target::default(),
            hint: ExecHint::default(),
            priority: Priority::default(),
        }
    }

    pub fn with_clbits(mut self, num_clbits: usize) -> Self {
        self.num_clbits = num_clbits;
        self
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
}

/// Owns the manager, scheduler and backend for one run of the runtime.
///
/// Program tasks allocate fresh registers, execute, record an
/// [`ExecutionReport`] and release their registers again.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    config: RuntimeConfig,
    memory: Arc<MemoryManager>,
    scheduler: Scheduler,
    backend: Option<Arc<dyn Backend>>,
    reports: Arc<Mutex<Vec<ExecutionReport>>>,
}

impl Session {
    pub fn new(config: RuntimeConfig) -> RuntimeResult<Self> {
        config.validate()?;
        let memory = Arc::new(MemoryManager::new(config.memory.clone()));
        let id = SessionId::new();
        tracing::info!(
            "Session {} started (max_qubits={}, seeded={})",
            id,
            config.memory.max_qubits,
            config.memory.seed.is_some()
        );
        Ok(Self {
            id,
            config,
            memory,
            scheduler: Scheduler::new(),
            backend: None,
            reports: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Route QPU-targeted programs to `backend`.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        tracing::info!("Session {} using backend {}", self.id, backend.name());
        self.backend = Some(backend);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    pub fn backend(&self) -> Option<&Arc<dyn Backend>> {
        self.backend.as_ref()
    }

    pub fn executor(&self) -> Executor {
        Executor::new(Arc::clone(&self.memory))
    }

    /// Queue an arbitrary task.
    pub fn submit(&self, task: Task) -> TaskId {
        self.scheduler.add_task(task)
    }

    /// Queue `program` as a task. The strategy is chosen when the task
    /// runs, from its target and hint.
    pub fn submit_program(&self, program: Program) -> TaskId {
        let Program {
            name,
            num_qubits,
            num_clbits,
            instructions,
            target,
            hint,
            priority,
        } = program;

        let memory = Arc::clone(&self.memory);
        let executor = self.executor();
        let backend = self.backend.clone();
        let reports = Arc::clone(&self.reports);
        let task_name = name.clone();

        let body = move || -> anyhow::Result<()> {
            let strategy = ExecutionStrategy::select(target, hint, backend.as_ref());
            tracing::info!("Program {} running on {}", task_name, strategy.label());

            let qreg = memory.create_qregister(num_qubits)?;
            let creg = memory.create_cregister(num_clbits);
            let outcome = executor.execute(&strategy, &instructions, qreg, creg);
            memory.release_qregister(qreg)?;
            memory.release_cregister(creg)?;

            let mut report = outcome?;
            report.task = Some(task_name);
            reports.lock().push(report);
            Ok(())
        };

        self.scheduler.add_task(
            Task::new(name, body)
                .with_target(target)
                .with_hint(hint)
                .with_priority(priority),
        )
    }

    /// Drain queued tasks on the calling thread.
    pub fn run(&self) -> DrainSummary {
        self.scheduler.run()
    }

    pub fn run_async(&self) -> RuntimeResult<()> {
        Ok(self.scheduler.run_async()?)
    }

    pub fn wait(&self) {
        self.scheduler.wait();
    }

    pub fn status(&self, id: TaskId) -> RuntimeResult<TaskStatus> {
        Ok(self.scheduler.status(id)?)
    }

    pub fn history(&self) -> Vec<TaskRecord> {
        self.scheduler.history()
    }

    /// Reports of completed program tasks, in completion order.
    pub fn reports(&self) -> Vec<ExecutionReport> {
        self.reports.lock().clone()
    }

    /// Where [`checkpoint`](Self::checkpoint) writes register `id`.
    pub fn checkpoint_path(&self, id: QRegId) -> PathBuf {
        self.config
            .checkpoint
            .directory
            .join(format!("{}-{}.qstate", self.id, id))
    }

    /// Checkpoint register `id` if the configured policy says it is due.
    pub fn checkpoint(&self, id: QRegId) -> RuntimeResult<bool> {
        let policy = &self.config.checkpoint;
        std::fs::create_dir_all(&policy.directory)?;
        let path = self.checkpoint_path(id);
        Ok(self
            .memory
            .checkpoint_if_needed(id, policy.op_threshold, policy.time_threshold(), &path)?)
    }
}
