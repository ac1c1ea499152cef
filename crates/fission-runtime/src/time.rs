//! Monotonic timer service.
//!
//! One thread owns every periodic registration and synthesizes tick
//! dispatches through the plant. Ticks are best effort: while a
//! registration already has a tick queued or running, further due
//! times coalesce into it (counted, not replayed), and a late tick
//! reschedules from *now* rather than bursting to catch up.

use crate::diag::DiagCounters;
use crate::dsl::Tick;
use crate::powerplant::Core;
use fission_types::ReactionId;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

struct Registration {
    id: ReactionId,
    period: Duration,
    next: Instant,
    /// Ticks actually dispatched; coalesced ticks do not advance it.
    index: u64,
    /// Set while a tick task is queued; cleared when it reaches a
    /// worker (or is dropped). At most one pending tick per entry.
    pending: Arc<AtomicBool>,
}

#[derive(Default)]
struct ChronoState {
    entries: Vec<Registration>,
    running: bool,
}

pub(crate) struct Chronometer {
    state: Mutex<ChronoState>,
    wake: Condvar,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Chronometer {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ChronoState::default()),
            wake: Condvar::new(),
            thread: Mutex::new(None),
        }
    }

    /// Registers a periodic dispatch for `id`. First tick one period
    /// from now.
    pub(crate) fn schedule(&self, id: ReactionId, period: Duration) {
        let mut state = self.state.lock();
        state.entries.push(Registration {
            id,
            period,
            next: Instant::now() + period,
            index: 0,
            pending: Arc::new(AtomicBool::new(false)),
        });
        drop(state);
        self.wake.notify_all();
    }

    /// Drops any registration for `id`. No-op for unknown ids.
    pub(crate) fn cancel(&self, id: ReactionId) {
        let mut state = self.state.lock();
        state.entries.retain(|e| e.id != id);
        drop(state);
        self.wake.notify_all();
    }

    /// Spawns the timer thread. The thread stops itself when the core
    /// is gone or [`stop`](Self::stop) is called.
    pub(crate) fn start(&self, core: Weak<Core>) {
        {
            let mut state = self.state.lock();
            if state.running {
                return;
            }
            state.running = true;
        }
        let handle = std::thread::Builder::new()
            .name("fission-chrono".into())
            .spawn({
                let core = core.clone();
                move || {
                    if let Some(strong) = core.upgrade() {
                        strong.chrono().run(core);
                    }
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn chronometer thread: {e}"));
        *self.thread.lock() = Some(handle);
    }

    /// Stops and joins the timer thread.
    pub(crate) fn stop(&self) {
        {
            let mut state = self.state.lock();
            state.running = false;
        }
        self.wake.notify_all();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }

    fn run(&self, core: Weak<Core>) {
        loop {
            let (due, coalesced, nearest) = {
                let mut state = self.state.lock();
                if !state.running {
                    return;
                }
                let now = Instant::now();
                let mut due = Vec::new();
                let mut coalesced = 0u64;
                for entry in &mut state.entries {
                    if entry.next > now {
                        continue;
                    }
                    if entry.pending.swap(true, Ordering::AcqRel) {
                        // Previous tick still queued: merge into it.
                        coalesced += 1;
                    } else {
                        entry.index += 1;
                        due.push((entry.id, Tick { index: entry.index }, entry.pending.clone()));
                    }
                    entry.next = now + entry.period;
                }
                (due, coalesced, state.entries.iter().map(|e| e.next).min())
            };

            let Some(core) = core.upgrade() else { return };
            for _ in 0..coalesced {
                DiagCounters::inc(&core.diagnostics().counters.coalesced_ticks);
            }
            for (id, tick, pending) in due {
                core.dispatch_timed(id, tick, pending);
            }
            drop(core);

            let mut state = self.state.lock();
            if !state.running {
                return;
            }
            match nearest {
                Some(deadline) => {
                    let _ = self.wake.wait_until(&mut state, deadline);
                }
                None => self.wake.wait(&mut state),
            }
        }
    }
}
