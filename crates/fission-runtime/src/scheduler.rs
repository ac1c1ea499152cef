//! Task scheduler.
//!
//! One priority queue feeds every worker. Ordering is
//! `(priority, creation_seq)`: a higher priority always dequeues
//! first, and within one priority level tasks run FIFO by creation
//! sequence.
//!
//! # Sync groups
//!
//! At most one task per [`SyncKey`] executes at any instant. When a
//! worker pops a task whose group is busy, the task is parked on that
//! group's waiter list instead of being dropped or re-queued behind
//! the heap; completing the group's running task promotes exactly one
//! waiter back into the queue. This cannot deadlock because a callback
//! never blocks on another task's completion through the scheduler.
//!
//! # Suspension
//!
//! Workers block on a condition variable only at the dequeue boundary:
//! when the queue is empty, or when everything ready is parked behind
//! a busy group.
//!
//! # Invariants
//!
//! Violations of internal bookkeeping (a group released while not
//! busy, waiters for an idle group at drain) are fatal: the scheduler
//! records a journal entry, stops admitting work, wakes every worker,
//! and panics.

use crate::diag::Diagnostics;
use crate::io::IoEvent;
use crate::reaction::Reaction;
use crate::store::Shared;
use fission_types::{Priority, SyncKey};
use parking_lot::{Condvar, Mutex};
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A single-use schedulable unit.
pub(crate) struct Task {
    pub reaction: Arc<Reaction>,
    /// The value that produced this task (emitted value or tick).
    pub cause: Option<Shared>,
    /// Exclusive raw claim, when this reaction won it for this emit.
    pub raw: Mutex<Option<Shared>>,
    /// IO readiness payload, installed thread-locally by the worker.
    pub transient: Option<IoEvent>,
    /// Tick coalescing flag; cleared when the task reaches a worker.
    pub pending: Option<Arc<AtomicBool>>,
    pub priority: Priority,
    pub sync: Option<SyncKey>,
    pub seq: u64,
}

impl Task {
    /// Scheduling key: priority first, then FIFO by creation sequence.
    fn order(&self) -> (Priority, std::cmp::Reverse<u64>) {
        (self.priority, std::cmp::Reverse(self.seq))
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.order() == other.order()
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order().cmp(&other.order())
    }
}

#[derive(Default)]
struct SchedState {
    queue: BinaryHeap<Task>,
    /// Waiters per busy sync group, in the order they were popped.
    parked: HashMap<SyncKey, VecDeque<Task>>,
    busy: HashSet<SyncKey>,
    running: usize,
    stopping: bool,
}

pub(crate) struct Scheduler {
    state: Mutex<SchedState>,
    ready: Condvar,
    idle: Condvar,
    next_seq: AtomicU64,
    diagnostics: Arc<Diagnostics>,
}

impl Scheduler {
    pub(crate) fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            state: Mutex::new(SchedState::default()),
            ready: Condvar::new(),
            idle: Condvar::new(),
            next_seq: AtomicU64::new(1),
            diagnostics,
        }
    }

    /// Allocates the creation sequence for a new task.
    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Enqueues a task; hands it back when the scheduler is stopping.
    pub(crate) fn submit(&self, task: Task) -> Result<(), Task> {
        let mut state = self.state.lock();
        if state.stopping {
            return Err(task);
        }
        state.queue.push(task);
        drop(state);
        self.ready.notify_one();
        Ok(())
    }

    /// Blocks until a runnable task is available; `None` means stop.
    ///
    /// Marks the task's sync group busy and counts it as running, both
    /// under the same lock as the pop, so `wait_idle` never observes a
    /// gap between dequeue and execution.
    pub(crate) fn take(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if state.stopping {
                return None;
            }
            if let Some(task) = Self::pop_runnable(&mut state) {
                if let Some(key) = task.sync.clone() {
                    state.busy.insert(key);
                }
                state.running += 1;
                return Some(task);
            }
            self.ready.wait(&mut state);
        }
    }

    fn pop_runnable(state: &mut SchedState) -> Option<Task> {
        while let Some(task) = state.queue.pop() {
            match &task.sync {
                Some(key) if state.busy.contains(key) => {
                    state.parked.entry(key.clone()).or_default().push_back(task);
                }
                _ => return Some(task),
            }
        }
        None
    }

    /// Retires a finished task: frees its sync group, promotes one
    /// waiter, and signals idleness when the plant has drained.
    pub(crate) fn complete(&self, task: Task) {
        let mut state = self.state.lock();
        state.running -= 1;

        if let Some(key) = &task.sync {
            if !state.busy.remove(key) {
                drop(state);
                self.fatal(&format!("sync group {key} released while not busy"));
            }
            let promoted = state.parked.get_mut(key).and_then(VecDeque::pop_front);
            if state.parked.get(key).is_some_and(VecDeque::is_empty) {
                state.parked.remove(key);
            }
            if let Some(next) = promoted {
                state.queue.push(next);
                self.ready.notify_one();
            }
        }

        if state.queue.is_empty() && state.running == 0 {
            if !state.parked.is_empty() {
                drop(state);
                self.fatal("tasks parked behind a sync group no one holds");
            }
            self.idle.notify_all();
        }
    }

    /// Blocks until no task is queued, parked, or running.
    pub(crate) fn wait_idle(&self) {
        let mut state = self.state.lock();
        while !(state.queue.is_empty() && state.running == 0) && !state.stopping {
            self.idle.wait(&mut state);
        }
    }

    /// Stops admission, wakes every worker, and drains leftovers.
    ///
    /// Returned tasks were never executed; the caller releases their
    /// reservations.
    pub(crate) fn stop(&self) -> Vec<Task> {
        let mut state = self.state.lock();
        state.stopping = true;
        let mut leftovers: Vec<Task> = state.queue.drain().collect();
        for (_, waiters) in state.parked.drain() {
            leftovers.extend(waiters);
        }
        drop(state);
        self.ready.notify_all();
        self.idle.notify_all();
        leftovers
    }

    /// Fatal bookkeeping corruption: flush diagnostics, tear down.
    fn fatal(&self, detail: &str) -> ! {
        self.diagnostics.record_fatal(detail);
        tracing::error!(detail, "scheduler invariant violated; tearing down");
        {
            let mut state = self.state.lock();
            state.stopping = true;
        }
        self.ready.notify_all();
        self.idle.notify_all();
        panic!("scheduler invariant violated: {detail}");
    }
}
