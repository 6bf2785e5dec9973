//! Task scheduler: synchronous drain or one background worker.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::error::{SchedError, SchedResult};
use crate::queue::{PriorityQueue, QueuedTask};
use crate::task::{Task, TaskId, TaskRecord, TaskStatus};

/// Outcome counts of one [`Scheduler::run`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub completed: usize,
    pub failed: usize,
}

impl DrainSummary {
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

/// Finished-task records kept by default before the oldest are evicted.
pub const DEFAULT_HISTORY_LIMIT: usize = 10_000;

#[derive(Debug)]
struct State {
    queue: PriorityQueue,
    statuses: FxHashMap<TaskId, TaskStatus>,
    history: VecDeque<TaskRecord>,
    history_limit: usize,
    next_id: u64,
    /// Tasks popped but not yet recorded, by either consumer.
    in_flight: usize,
    worker_started: bool,
    stop: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            queue: PriorityQueue::default(),
            statuses: FxHashMap::default(),
            history: VecDeque::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            next_id: 0,
            in_flight: 0,
            worker_started: false,
            stop: false,
        }
    }
}

impl State {
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }

    /// Append a finished record, evicting the oldest records (and their
    /// statuses) beyond the limit.
    fn record(&mut self, record: TaskRecord) {
        self.statuses.insert(record.id, record.status.clone());
        self.history.push_back(record);
        self.evict_to(self.history_limit);
    }

    fn evict_to(&mut self, limit: usize) {
        while self.history.len() > limit {
            if let Some(old) = self.history.pop_front() {
                self.statuses.remove(&old.id);
            }
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    /// Signalled when work arrives or the worker must stop.
    work: Condvar,
    /// Signalled when the scheduler becomes idle.
    idle: Condvar,
    /// Held from popping a task until its outcome is recorded, so only one
    /// consumer drains at a time.
    exec_lock: Mutex<()>,
}

impl Shared {
    /// Pop the next task and mark it running.
    fn take(state: &mut State) -> Option<QueuedTask> {
        let queued = state.queue.pop()?;
        state.statuses.insert(queued.id, TaskStatus::Running);
        state.in_flight += 1;
        Some(queued)
    }

    /// Pop the highest-priority task and run it. `None` when the queue is
    /// empty.
    fn run_next(&self) -> Option<TaskStatus> {
        let _guard = self.exec_lock.lock();
        let queued = Self::take(&mut self.state.lock())?;
        Some(self.execute(queued))
    }

    /// Run one task body and record its outcome. Caller holds `exec_lock`.
    fn execute(&self, queued: QueuedTask) -> TaskStatus {
        let QueuedTask {
            id,
            task,
            submitted_at,
        } = queued;
        let name = task.name.clone();
        let (target, hint, priority) = (task.target, task.hint, task.priority);
        let body = task.into_body();

        let started_at = Utc::now();
        tracing::info!("Task {} ({}) started", id, name);
        let status = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(())) => TaskStatus::Completed,
            Ok(Err(e)) => TaskStatus::Failed {
                reason: format!("{e:#}"),
            },
            Err(payload) => TaskStatus::Failed {
                reason: format!("panicked: {}", panic_message(payload.as_ref())),
            },
        };
        let finished_at = Utc::now();

        match &status {
            TaskStatus::Failed { reason } => {
                tracing::error!("Task {} ({}) failed: {}", id, name, reason);
            }
            _ => tracing::info!("Task {} ({}) completed", id, name),
        }

        let mut state = self.state.lock();
        state.record(TaskRecord {
            id,
            name,
            target,
            hint,
            priority,
            status: status.clone(),
            submitted_at,
            started_at,
            finished_at,
        });
        state.in_flight -= 1;
        if state.is_idle() {
            self.idle.notify_all();
        }
        status
    }

    fn worker_loop(&self) {
        tracing::debug!("Scheduler worker started");
        loop {
            {
                let mut state = self.state.lock();
                while !state.stop && state.queue.is_empty() {
                    self.work.wait(&mut state);
                }
                if state.stop {
                    tracing::debug!("Scheduler worker stopping");
                    return;
                }
            }
            // A concurrent run() may have emptied the queue meanwhile.
            self.run_next();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Priority scheduler with at most one task body running at a time.
///
/// Producers on any thread call [`add_task`](Self::add_task). Tasks are
/// consumed either by [`run`](Self::run) on the caller's thread or by a
/// background worker started with [`run_async`](Self::run_async). Both can
/// be used on the same scheduler: a task is popped only once the previous
/// one has finished, so at most one task is ever `Running` and each pop
/// takes the highest priority queued at that moment.
///
/// Finished records are kept up to a limit ([`DEFAULT_HISTORY_LIMIT`] unless
/// set with [`with_history_limit`](Self::with_history_limit)); evicted tasks
/// no longer report a status.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use qrun_sched::{Scheduler, Task};
///
/// let order = Arc::new(Mutex::new(Vec::new()));
/// let scheduler = Scheduler::new();
/// for (name, priority) in [("a", 5), ("b", 10)] {
///     let order = order.clone();
///     scheduler.add_task(Task::new(name, move || {
///         order.lock().unwrap().push(name);
///         Ok(())
///     }).with_priority(priority));
/// }
/// scheduler.run_async().unwrap();
/// scheduler.wait();
/// assert_eq!(*order.lock().unwrap(), vec!["b", "a"]);
/// ```
#[derive(Debug, Default)]
pub struct Scheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` finished-task records.
    pub fn with_history_limit(self, limit: usize) -> Self {
        let mut state = self.shared.state.lock();
        state.history_limit = limit;
        state.evict_to(limit);
        drop(state);
        self
    }

    /// Queue a task. Wakes the background worker if one is running.
    pub fn add_task(&self, task: Task) -> TaskId {
        let mut state = self.shared.state.lock();
        let id = TaskId(state.next_id);
        state.next_id += 1;
        tracing::debug!(
            "Task {} ({}) queued with priority {}",
            id,
            task.name,
            task.priority.value()
        );
        state.statuses.insert(id, TaskStatus::Pending);
        state.queue.push(QueuedTask {
            id,
            task,
            submitted_at: Utc::now(),
        });
        drop(state);
        self.shared.work.notify_one();
        id
    }

    /// Drain the queue on the calling thread and return when it is empty.
    ///
    /// Failed tasks are recorded and do not stop the drain.
    pub fn run(&self) -> DrainSummary {
        let mut summary = DrainSummary::default();
        while let Some(status) = self.shared.run_next() {
            match status {
                TaskStatus::Completed => summary.completed += 1,
                _ => summary.failed += 1,
            }
        }
        tracing::info!(
            "Drain finished: {} completed, {} failed",
            summary.completed,
            summary.failed
        );
        summary
    }

    /// Start the background worker if needed and return immediately.
    pub fn run_async(&self) -> SchedResult<()> {
        let mut worker = self.worker.lock();
        if worker.is_none() {
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name("qrun-sched-worker".to_string())
                .spawn(move || shared.worker_loop())
                .map_err(SchedError::WorkerSpawn)?;
            *worker = Some(handle);
            self.shared.state.lock().worker_started = true;
        }
        self.shared.work.notify_one();
        Ok(())
    }

    /// Block until the queue is empty and no task is running.
    ///
    /// Returns immediately if the background worker was never started.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock();
        if !state.worker_started {
            return;
        }
        while !state.is_idle() {
            self.shared.idle.wait(&mut state);
        }
    }

    pub fn status(&self, id: TaskId) -> SchedResult<TaskStatus> {
        self.shared
            .state
            .lock()
            .statuses
            .get(&id)
            .cloned()
            .ok_or(SchedError::TaskNotFound(id))
    }

    /// Records of finished tasks in completion order.
    pub fn history(&self) -> Vec<TaskRecord> {
        self.shared.state.lock().history.iter().cloned().collect()
    }

    /// Forget every finished task. Pending and running tasks keep their
    /// status.
    pub fn clear_history(&self) -> usize {
        let mut state = self.shared.state.lock();
        let cleared = state.history.len();
        state.evict_to(0);
        cleared
    }

    pub fn pending(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.shared.state.lock().is_idle()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shared.state.lock().stop = true;
        self.shared.work.notify_all();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::error!("Scheduler worker panicked");
            }
        }
    }
}
