//! Priority queue for pending tasks.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use crate::task::{Priority, Task, TaskId};

/// A task waiting to run, with the bookkeeping the scheduler records.
#[derive(Debug)]
pub(crate) struct QueuedTask {
    pub(crate) id: TaskId,
    pub(crate) task: Task,
    pub(crate) submitted_at: DateTime<Utc>,
}

/// Entry in the priority queue.
#[derive(Debug)]
struct QueueEntry {
    queued: QueuedTask,

    /// Insertion order (for FIFO ordering of same-priority tasks).
    insertion_order: u64,
}

impl QueueEntry {
    fn priority(&self) -> Priority {
        self.queued.task.priority
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.insertion_order == other.insertion_order
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first
        match self.priority().cmp(&other.priority()) {
            Ordering::Equal => {
                // BinaryHeap is a max-heap: earlier insertion must compare greater
                other.insertion_order.cmp(&self.insertion_order)
            }
            other_cmp => other_cmp,
        }
    }
}

/// Pending tasks, highest priority first, FIFO among equals.
#[derive(Debug, Default)]
pub(crate) struct PriorityQueue {
    heap: BinaryHeap<QueueEntry>,
    insertion_counter: u64,
}

impl PriorityQueue {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, queued: QueuedTask) {
        let entry = QueueEntry {
            queued,
            insertion_order: self.insertion_counter,
        };
        self.insertion_counter += 1;
        self.heap.push(entry);
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedTask> {
        self.heap.pop().map(|entry| entry.queued)
    }

    #[cfg(test)]
    pub(crate) fn peek_priority(&self) -> Option<Priority> {
        self.heap.peek().map(QueueEntry::priority)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
