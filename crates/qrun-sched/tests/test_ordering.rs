//! Ordering and concurrency tests for the scheduler.

use std::sync::{Arc, mpsc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use qrun_sched::{Scheduler, Task, TaskStatus};

fn recording(order: &Arc<Mutex<Vec<&'static str>>>, name: &'static str, priority: i64) -> Task {
    let order = order.clone();
    Task::new(name, move || {
        order.lock().push(name);
        Ok(())
    })
    .with_priority(priority)
}

#[test]
fn test_higher_priority_runs_first_sync() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let scheduler = Scheduler::new();
    scheduler.add_task(recording(&order, "A", 5));
    scheduler.add_task(recording(&order, "B", 10));

    let summary = scheduler.run();
    assert_eq!(summary.completed, 2);
    assert_eq!(*order.lock(), vec!["B", "A"]);
}

#[test]
fn test_higher_priority_runs_first_async() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let scheduler = Scheduler::new();
    scheduler.add_task(recording(&order, "A", 5));
    scheduler.add_task(recording(&order, "B", 10));

    scheduler.run_async().unwrap();
    scheduler.wait();
    assert_eq!(*order.lock(), vec!["B", "A"]);
    assert!(scheduler.is_idle());
}

#[test]
fn test_fifo_among_equal_priorities() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let scheduler = Scheduler::new();
    for name in ["one", "two", "three"] {
        scheduler.add_task(recording(&order, name, 1));
    }
    scheduler.add_task(recording(&order, "urgent", 9));
    scheduler.add_task(recording(&order, "later", -1));

    scheduler.run();
    assert_eq!(
        *order.lock(),
        vec!["urgent", "one", "two", "three", "later"]
    );
}

#[test]
fn test_status_transitions() {
    let scheduler = Arc::new(Scheduler::new());
    let seen_running = Arc::new(AtomicBool::new(false));

    let first = scheduler.add_task(Task::new("first", || Ok(())).with_priority(1));
    assert_eq!(scheduler.status(first).unwrap(), TaskStatus::Pending);

    // The watcher reads its own status from inside its body.
    let watcher_id = Arc::new(Mutex::new(None));
    let watcher = {
        let scheduler = Arc::downgrade(&scheduler);
        let watcher_id = watcher_id.clone();
        let seen_running = seen_running.clone();
        Task::new("watcher", move || {
            let id = watcher_id.lock().expect("id recorded before run");
            if let Some(s) = scheduler.upgrade() {
                seen_running.store(s.status(id)? == TaskStatus::Running, Ordering::SeqCst);
            }
            Ok(())
        })
    };
    *watcher_id.lock() = Some(scheduler.add_task(watcher));
    scheduler.run();

    assert!(seen_running.load(Ordering::SeqCst));
    assert_eq!(scheduler.status(first).unwrap(), TaskStatus::Completed);

    let history = scheduler.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].name, "first");
    assert_eq!(history[1].name, "watcher");
    assert!(history[0].finished_at >= history[0].started_at);
}

#[test]
fn test_one_running_task_across_worker_and_sync_drain() {
    let scheduler = Arc::new(Scheduler::new());
    let order = Arc::new(Mutex::new(Vec::new()));
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let blocker = {
        let order = order.clone();
        scheduler.add_task(
            Task::new("blocker", move || {
                order.lock().push("blocker");
                started_tx.send(())?;
                release_rx.recv()?;
                Ok(())
            })
            .with_priority(100),
        )
    };
    scheduler.run_async().unwrap();
    started_rx.recv().unwrap();

    // The worker is busy; a second consumer arrives with work queued.
    let low = scheduler.add_task(recording(&order, "low", 10));
    let sync = {
        let scheduler = scheduler.clone();
        thread::spawn(move || scheduler.run())
    };
    thread::sleep(Duration::from_millis(50));
    let high = scheduler.add_task(recording(&order, "high", 50));

    assert_eq!(scheduler.status(blocker).unwrap(), TaskStatus::Running);
    assert_eq!(scheduler.status(low).unwrap(), TaskStatus::Pending);
    assert_eq!(scheduler.status(high).unwrap(), TaskStatus::Pending);

    release_tx.send(()).unwrap();
    sync.join().unwrap();
    scheduler.wait();

    // Tasks queued while the blocker ran still come out by priority.
    assert_eq!(*order.lock(), vec!["blocker", "high", "low"]);
    assert_eq!(scheduler.history().len(), 3);
}

#[test]
fn test_bodies_never_overlap() {
    let scheduler = Arc::new(Scheduler::new());
    let active = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let make = |i: i64| {
        let active = active.clone();
        let max_seen = max_seen.clone();
        Task::new(format!("t{i}"), move || {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .with_priority(i % 3)
    };

    for i in 0..10 {
        scheduler.add_task(make(i));
    }
    scheduler.run_async().unwrap();

    let sync = {
        let scheduler = scheduler.clone();
        thread::spawn(move || scheduler.run())
    };
    for i in 10..20 {
        scheduler.add_task(make(i));
    }
    sync.join().unwrap();
    scheduler.wait();

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.history().len(), 20);
}

#[test]
fn test_producers_on_many_threads() {
    let scheduler = Arc::new(Scheduler::new());
    let count = Arc::new(AtomicUsize::new(0));
    scheduler.run_async().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = scheduler.clone();
            let count = count.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let count = count.clone();
                    scheduler.add_task(Task::new("inc", move || {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    scheduler.wait();
    assert_eq!(count.load(Ordering::SeqCst), 100);
}

#[test]
fn test_drop_stops_idle_worker() {
    let scheduler = Scheduler::new();
    scheduler.run_async().unwrap();
    scheduler.wait();
    drop(scheduler);
}
