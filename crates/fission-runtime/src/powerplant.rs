//! The PowerPlant: the runtime object that owns everything.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         PowerPlant                           │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ DataStore   latest / history / transient per type      │  │
//! │  │ EventBus    type -> subscribers, bind order            │  │
//! │  │ Registry    owns reaction records, hands out ids       │  │
//! │  │ Scheduler   priority queue, sync groups                │  │
//! │  │ Chronometer periodic tick source                       │  │
//! │  │ Diagnostics counters + journal                         │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │        ▲ emit                 │ tasks                        │
//! │        │                      ▼                              │
//! │   Reactors               Worker threads                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start()──► Starting ──► Running ──shutdown()──► Draining
//!                                                            │
//!       Stopped ◄── join workers ◄── Stopping (run Shutdown) ◄┘
//! ```
//!
//! Emits before `start()` are deferred so that `Startup` reactions
//! always run first. `start()` blocks until shutdown completes;
//! `shutdown()` only requests it and returns immediately, so it is
//! safe to call from inside a callback.
//!
//! # Emission handlers
//!
//! - [`emit`](PowerPlant::emit) — Local: store the value, schedule
//!   every bound subscriber.
//! - [`emit_direct`](PowerPlant::emit_direct) — run subscribers
//!   synchronously on the calling thread, bypassing the scheduler.
//! - [`emit_init`](PowerPlant::emit_init) — defer until `start()`.
//! - [`emit_net`](PowerPlant::emit_net) — hand to the network
//!   transport.

use crate::bus::EventBus;
use crate::config::PlantConfig;
use crate::diag::{DiagCounters, DiagSnapshot, Diagnostics, JournalEntry};
use crate::dsl::builder::Source;
use crate::dsl::{BindSpec, Shutdown, Startup, Tick};
use crate::error::BindError;
use crate::handle::ReactionHandle;
use crate::io::{IoBackend, IoEvent};
use crate::net::{NetError, NetworkFrame, NetworkTransport};
use crate::reaction::{Body, DispatchCx, DispatchOutcome, Options, Reaction};
use crate::registry::Registry;
use crate::scheduler::{Scheduler, Task};
use crate::store::DataStore;
use crate::time::Chronometer;
use fission_types::{PlantId, ReactionId};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifePhase {
    /// Constructed; emits are deferred.
    Idle,
    /// `start()` is initializing; emits still deferred.
    Starting,
    /// Workers are draining the queue; emits dispatch.
    Running,
    /// Shutdown requested; only already-queued work finishes.
    Draining,
    /// Shutdown reactions are running.
    Stopping,
    /// Everything joined. Binds and emits are rejected.
    Stopped,
}

/// Internal runtime state shared by workers, handles and emitters.
///
/// Everything reference-counted hangs off this one struct; tasks and
/// handles keep it alive (or hold it weakly) so ownership stays
/// acyclic.
pub(crate) struct Core {
    plant_id: PlantId,
    config: PlantConfig,
    store: DataStore,
    bus: EventBus,
    registry: Registry,
    scheduler: Scheduler,
    chrono: Chronometer,
    diagnostics: Arc<Diagnostics>,
    io_backend: Option<Box<dyn IoBackend>>,
    transport: Option<Box<dyn NetworkTransport>>,
    lifecycle: Mutex<LifePhase>,
    lifecycle_cv: Condvar,
    shutdown_requested: AtomicBool,
    deferred: Mutex<Vec<Box<dyn FnOnce(&Arc<Core>) + Send>>>,
    reactors: Mutex<Vec<Arc<dyn Any + Send + Sync>>>,
}

impl Core {
    fn new(
        config: PlantConfig,
        io_backend: Option<Box<dyn IoBackend>>,
        transport: Option<Box<dyn NetworkTransport>>,
    ) -> Self {
        let diagnostics = Arc::new(Diagnostics::new(config.journal_capacity));
        Self {
            plant_id: PlantId::new(),
            store: DataStore::new(),
            bus: EventBus::new(),
            registry: Registry::new(),
            scheduler: Scheduler::new(diagnostics.clone()),
            chrono: Chronometer::new(),
            diagnostics,
            io_backend,
            transport,
            lifecycle: Mutex::new(LifePhase::Idle),
            lifecycle_cv: Condvar::new(),
            shutdown_requested: AtomicBool::new(false),
            deferred: Mutex::new(Vec::new()),
            reactors: Mutex::new(Vec::new()),
            config,
        }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn chrono(&self) -> &Chronometer {
        &self.chrono
    }

    pub(crate) fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn phase(&self) -> LifePhase {
        *self.lifecycle.lock()
    }

    // ---- binding ----------------------------------------------------

    pub(crate) fn bind(
        self: &Arc<Self>,
        spec: BindSpec,
        source: Source,
        label: Option<String>,
        scope: &str,
        options: Options,
        body: Body,
    ) -> Result<ReactionHandle, BindError> {
        if self.phase() == LifePhase::Stopped {
            return Err(BindError::PlantStopped);
        }

        let id = self.registry.next_id();
        let label = match label {
            Some(l) => format!("{scope}/{l}"),
            None => format!("{scope}/reaction-{}", id.raw()),
        };
        for (type_id, depth) in &spec.history {
            self.store.reserve_history(*type_id, *depth);
        }

        let record = Arc::new(Reaction::new(
            id,
            label,
            spec.triggers.clone(),
            spec.raw,
            options,
            body,
        ));
        self.registry.insert(record.clone());

        match source {
            Source::Bus => {
                for type_id in &spec.triggers {
                    self.bus.subscribe(*type_id, id);
                }
            }
            Source::Every(period) => self.chrono.schedule(id, period),
            Source::Io(fd, interest) => {
                let Some(backend) = &self.io_backend else {
                    record.mark_unbound();
                    self.registry.reap(id);
                    return Err(BindError::NoIoBackend);
                };
                if let Err(e) = backend.bind(fd, interest, id) {
                    record.mark_unbound();
                    self.registry.reap(id);
                    return Err(BindError::Io(e));
                }
            }
        }

        debug!(reaction = %id, label = record.label(), "bound reaction");
        Ok(ReactionHandle::new(id, Arc::downgrade(self)))
    }

    /// Unbinds `id` everywhere. Idempotent; destruction waits for the
    /// reaction's in-flight tasks to drain.
    pub(crate) fn unbind(&self, id: ReactionId) {
        let Some(record) = self.registry.get(id) else {
            return;
        };
        if !record.mark_unbound() {
            return;
        }
        self.bus.unsubscribe(id, record.trigger_types());
        self.chrono.cancel(id);
        if let Some(backend) = &self.io_backend {
            backend.unbind(id);
        }
        debug!(reaction = %id, label = record.label(), "unbound reaction");
        self.registry.reap(id);
    }

    pub(crate) fn request_shutdown(&self) {
        if !self.shutdown_requested.swap(true, Ordering::AcqRel) {
            info!("shutdown requested");
        }
        // Taken so the notify cannot slip between the start thread's
        // flag check and its wait.
        let _phase = self.lifecycle.lock();
        self.lifecycle_cv.notify_all();
    }

    // ---- emission ---------------------------------------------------

    pub(crate) fn emit<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        let guard = self.lifecycle.lock();
        match *guard {
            LifePhase::Idle | LifePhase::Starting => {
                // Startup must run before user emits; hold until start.
                self.deferred
                    .lock()
                    .push(Box::new(move |core| core.emit_now(value)));
            }
            LifePhase::Running => {
                drop(guard);
                self.emit_now(value);
            }
            _ => {
                drop(guard);
                self.reject::<T>();
            }
        }
    }

    pub(crate) fn emit_direct<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        let guard = self.lifecycle.lock();
        match *guard {
            LifePhase::Idle | LifePhase::Starting => {
                self.deferred
                    .lock()
                    .push(Box::new(move |core| core.emit_direct_now(value)));
            }
            LifePhase::Running => {
                drop(guard);
                self.emit_direct_now(value);
            }
            _ => {
                drop(guard);
                self.reject::<T>();
            }
        }
    }

    pub(crate) fn emit_init<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        // Initialize degenerates to Local once the plant runs.
        self.emit(value);
    }

    pub(crate) fn emit_net<T: Serialize + 'static>(&self, value: &T) -> Result<(), NetError> {
        let Some(transport) = &self.transport else {
            return Err(NetError::NoTransport);
        };
        DiagCounters::inc(&self.diagnostics.counters.emitted);
        let frame = NetworkFrame::encode(self.plant_id, value)?;
        transport.send(frame)
    }

    pub(crate) fn latest<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.store.latest::<T>()
    }

    fn reject<T>(&self) {
        DiagCounters::inc(&self.diagnostics.counters.rejected);
        debug!(
            event = std::any::type_name::<T>(),
            "emit rejected: plant not accepting work"
        );
    }

    fn emit_now<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        let shared = self.store.set(value);
        self.dispatch_shared(TypeId::of::<T>(), shared);
    }

    fn dispatch_shared(self: &Arc<Self>, type_id: TypeId, shared: Arc<dyn Any + Send + Sync>) {
        DiagCounters::inc(&self.diagnostics.counters.emitted);
        let mut raw_available = true;
        for id in self.bus.snapshot(type_id) {
            let Some(task) = self.make_task(id, type_id, &shared, &mut raw_available) else {
                continue;
            };
            if let Err(task) = self.scheduler.submit(task) {
                DiagCounters::inc(&self.diagnostics.counters.rejected);
                self.finish_dropped(task);
            }
        }
    }

    fn emit_direct_now<T: Send + Sync + 'static>(self: &Arc<Self>, value: T) {
        DiagCounters::inc(&self.diagnostics.counters.emitted);
        let shared: Arc<dyn Any + Send + Sync> = self.store.set(value);
        let type_id = TypeId::of::<T>();
        let mut raw_available = true;
        for id in self.bus.snapshot(type_id) {
            if let Some(task) = self.make_task(id, type_id, &shared, &mut raw_available) {
                self.run_reaction(&task);
            }
        }
    }

    /// Builds one task for a bus subscriber, applying the creation
    /// gates (`bound`, single-flight, raw claim in bind order).
    fn make_task(
        self: &Arc<Self>,
        id: ReactionId,
        type_id: TypeId,
        shared: &Arc<dyn Any + Send + Sync>,
        raw_available: &mut bool,
    ) -> Option<Task> {
        let record = self.registry.get(id)?;
        if !record.is_bound() {
            return None;
        }
        if !record.try_reserve() {
            DiagCounters::inc(&self.diagnostics.counters.dropped_single);
            debug!(reaction = %id, "emit dropped: single-flight reaction busy");
            return None;
        }
        let raw = if *raw_available && record.consumes_raw(type_id) {
            *raw_available = false;
            Some(shared.clone())
        } else {
            None
        };
        let priority = record.options().priority;
        let sync = record.options().sync.clone();
        Some(Task {
            reaction: record,
            cause: Some(shared.clone()),
            raw: Mutex::new(raw),
            transient: None,
            pending: None,
            priority,
            sync,
            seq: self.scheduler.next_seq(),
        })
    }

    // ---- backend entry points ---------------------------------------

    /// Called by the IO backend when a watched descriptor fires.
    pub(crate) fn dispatch_io(self: &Arc<Self>, token: ReactionId, event: IoEvent) {
        if self.phase() != LifePhase::Running {
            DiagCounters::inc(&self.diagnostics.counters.rejected);
            return;
        }
        let Some(record) = self.registry.get(token) else {
            return;
        };
        if !record.is_bound() {
            return;
        }
        if !record.try_reserve() {
            // IO reactions are single; readiness will fire again.
            DiagCounters::inc(&self.diagnostics.counters.dropped_single);
            return;
        }
        let priority = record.options().priority;
        let sync = record.options().sync.clone();
        let task = Task {
            reaction: record,
            cause: None,
            raw: Mutex::new(None),
            transient: Some(event),
            pending: None,
            priority,
            sync,
            seq: self.scheduler.next_seq(),
        };
        if let Err(task) = self.scheduler.submit(task) {
            DiagCounters::inc(&self.diagnostics.counters.rejected);
            self.finish_dropped(task);
        }
    }

    /// Called by the chronometer for each non-coalesced tick.
    pub(crate) fn dispatch_timed(
        self: &Arc<Self>,
        id: ReactionId,
        tick: Tick,
        pending: Arc<AtomicBool>,
    ) {
        if self.phase() != LifePhase::Running {
            DiagCounters::inc(&self.diagnostics.counters.rejected);
            pending.store(false, Ordering::Release);
            return;
        }
        let Some(record) = self.registry.get(id) else {
            pending.store(false, Ordering::Release);
            return;
        };
        if !record.is_bound() {
            pending.store(false, Ordering::Release);
            return;
        }
        if !record.try_reserve() {
            DiagCounters::inc(&self.diagnostics.counters.dropped_single);
            pending.store(false, Ordering::Release);
            return;
        }
        let priority = record.options().priority;
        let sync = record.options().sync.clone();
        let task = Task {
            reaction: record,
            cause: Some(Arc::new(tick)),
            raw: Mutex::new(None),
            transient: None,
            pending: Some(pending),
            priority,
            sync,
            seq: self.scheduler.next_seq(),
        };
        if let Err(task) = self.scheduler.submit(task) {
            DiagCounters::inc(&self.diagnostics.counters.rejected);
            self.finish_dropped(task);
        }
    }

    // ---- execution --------------------------------------------------

    /// Runs one task to completion on the calling thread.
    ///
    /// Order: enabled/bound gate, transient install, argument join +
    /// callback, post-condition, inflight release, reclamation.
    pub(crate) fn run_reaction(self: &Arc<Self>, task: &Task) {
        if let Some(pending) = &task.pending {
            pending.store(false, Ordering::Release);
        }
        let record = &task.reaction;

        // Dispatch gate. A once reaction additionally claims its
        // single execution here, so concurrent tasks for the same
        // record cannot both run the callback.
        let admitted = record.is_enabled()
            && record.is_bound()
            && (!record.options().once || record.try_claim_once());

        if admitted {
            let cx = DispatchCx {
                store: &self.store,
                cause: task.cause.as_ref(),
                raw: &task.raw,
            };
            let outcome = match task.transient {
                Some(event) => crate::store::with_transient(event, || record.dispatch(&cx)),
                None => record.dispatch(&cx),
            };
            let executed = !matches!(&outcome, DispatchOutcome::Skipped);
            match outcome {
                DispatchOutcome::Ran => {
                    DiagCounters::inc(&self.diagnostics.counters.dispatched);
                }
                DispatchOutcome::Skipped => {
                    DiagCounters::inc(&self.diagnostics.counters.skipped_joins);
                    trace!(reaction = %record.id(), "dispatch skipped: required value absent");
                }
                DispatchOutcome::Panicked(message) => {
                    self.diagnostics
                        .record_panic(record.id(), record.label(), &message);
                    error!(
                        reaction = %record.id(),
                        label = record.label(),
                        message = %message,
                        "reaction callback panicked"
                    );
                }
            }
            if record.options().once {
                if executed {
                    // Post-condition: the callback ran (or panicked);
                    // the reaction is spent.
                    self.unbind(record.id());
                } else {
                    // A join skip never ran the callback; the claim
                    // goes back so a later emit can still fire it.
                    record.release_once_claim();
                }
            }
        } else {
            DiagCounters::inc(&self.diagnostics.counters.dropped_gated);
            trace!(reaction = %record.id(), "task dropped at dispatch gate");
        }

        if record.release() == 0 && !record.is_bound() {
            self.registry.reap(record.id());
        }
    }

    /// Releases a task that will never run.
    fn finish_dropped(&self, task: Task) {
        if let Some(pending) = &task.pending {
            pending.store(false, Ordering::Release);
        }
        if task.reaction.release() == 0 && !task.reaction.is_bound() {
            self.registry.reap(task.reaction.id());
        }
    }
}

fn spawn_workers(core: &Arc<Core>, count: usize) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|i| {
            let core = core.clone();
            std::thread::Builder::new()
                .name(format!("fission-worker-{i}"))
                .spawn(move || {
                    while let Some(task) = core.scheduler.take() {
                        core.run_reaction(&task);
                        core.scheduler.complete(task);
                    }
                })
                .unwrap_or_else(|e| panic!("failed to spawn worker thread: {e}"))
        })
        .collect()
}

/// The runtime. Owns the store, bus, registry, scheduler, workers and
/// timer; reactors are installed under it and everything it hands out
/// (handles, emitters) refers back to it weakly.
pub struct PowerPlant {
    core: Arc<Core>,
}

impl PowerPlant {
    /// Creates a plant with the given configuration and no backends.
    ///
    /// # Errors
    ///
    /// Returns [`crate::config::ConfigError`] when the configuration
    /// is invalid.
    pub fn new(config: PlantConfig) -> Result<Self, crate::config::ConfigError> {
        Self::builder().config(config).build()
    }

    /// Starts building a plant with backends.
    #[must_use]
    pub fn builder() -> PowerPlantBuilder {
        PowerPlantBuilder::default()
    }

    /// This plant's identity, as carried in network frames.
    #[must_use]
    pub fn plant_id(&self) -> PlantId {
        self.core.plant_id
    }

    #[must_use]
    pub fn config(&self) -> &PlantConfig {
        &self.core.config
    }

    /// Installs a reactor: runs its `setup` and keeps it alive for the
    /// plant's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when setup rejects a composition.
    /// Reactions bound before the failure stay bound.
    pub fn install<R: crate::reactor::Reactor>(&self, reactor: R) -> Result<Arc<R>, BindError> {
        let reactor = Arc::new(reactor);
        let ctx = crate::reactor::ReactorContext::new(&self.core, reactor.name().to_string());
        reactor.setup(&ctx)?;
        info!(reactor = reactor.name(), "installed reactor");
        self.core.reactors.lock().push(reactor.clone());
        Ok(reactor)
    }

    /// A bind-and-emit context scoped under `name`, for wiring
    /// reactions without a full [`Reactor`](crate::reactor::Reactor).
    #[must_use]
    pub fn scope(&self, name: &str) -> crate::reactor::ReactorContext<'_> {
        crate::reactor::ReactorContext::new(&self.core, name.to_string())
    }

    /// Emits a value locally (store + bus). Fire-and-forget; before
    /// `start()` the emit is deferred so Startup runs first.
    pub fn emit<T: Send + Sync + 'static>(&self, value: T) {
        self.core.emit(value);
    }

    /// Dispatches subscribers synchronously on the calling thread,
    /// bypassing the scheduler (and sync-group arbitration).
    pub fn emit_direct<T: Send + Sync + 'static>(&self, value: T) {
        self.core.emit_direct(value);
    }

    /// Defers the emit until `start()`; equivalent to
    /// [`emit`](Self::emit) once the plant runs.
    pub fn emit_init<T: Send + Sync + 'static>(&self, value: T) {
        self.core.emit_init(value);
    }

    /// Hands the value to the network transport.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] when no transport is installed or the
    /// value cannot be encoded or sent.
    pub fn emit_net<T: Serialize + 'static>(&self, value: &T) -> Result<(), NetError> {
        self.core.emit_net(value)
    }

    /// Entry point for IO backends: dispatches readiness for the
    /// reaction bound under `token`.
    pub fn dispatch_io(&self, token: ReactionId, event: IoEvent) {
        self.core.dispatch_io(token, event);
    }

    /// Runs the plant until shutdown completes.
    ///
    /// Spawns workers and the timer, enqueues `Startup` reactions,
    /// flushes deferred emits, then blocks. Once
    /// [`shutdown`](Self::shutdown) is requested: stops accepting
    /// work, drains, runs `Shutdown` reactions, joins everything.
    pub fn start(&self) {
        {
            let mut phase = self.core.lifecycle.lock();
            if *phase != LifePhase::Idle {
                warn!("start() called on a plant that is not idle; ignoring");
                return;
            }
            *phase = LifePhase::Starting;
        }

        let workers = spawn_workers(&self.core, self.core.config.threads);
        self.core.chrono.start(Arc::downgrade(&self.core));
        info!(
            plant = %self.core.plant_id,
            threads = self.core.config.threads,
            "power plant starting"
        );

        // Startup first, then the deferred pre-start emits, then open
        // the gates.
        let deferred = {
            let mut phase = self.core.lifecycle.lock();
            self.core.emit_now(Startup);
            *phase = LifePhase::Running;
            std::mem::take(&mut *self.core.deferred.lock())
        };
        for emit in deferred {
            emit(&self.core);
        }

        {
            let mut phase = self.core.lifecycle.lock();
            while !self.core.shutdown_requested.load(Ordering::Acquire) {
                self.core.lifecycle_cv.wait(&mut phase);
            }
            *phase = LifePhase::Draining;
        }

        debug!("draining scheduler");
        self.core.scheduler.wait_idle();

        {
            let mut phase = self.core.lifecycle.lock();
            *phase = LifePhase::Stopping;
            self.core.emit_now(Shutdown);
        }
        self.core.scheduler.wait_idle();

        self.core.chrono.stop();
        for task in self.core.scheduler.stop() {
            self.core.finish_dropped(task);
        }
        for worker in workers {
            let _ = worker.join();
        }

        *self.core.lifecycle.lock() = LifePhase::Stopped;
        self.core.lifecycle_cv.notify_all();
        info!("power plant stopped");
    }

    /// Requests graceful shutdown; returns immediately.
    pub fn shutdown(&self) {
        self.core.request_shutdown();
    }

    /// Blocks until no task is queued or running. Primarily for tests
    /// and controlled checkpoints; the queue may refill afterwards.
    pub fn drain(&self) {
        self.core.scheduler.wait_idle();
    }

    /// Point-in-time dispatch counters.
    #[must_use]
    pub fn diagnostics(&self) -> DiagSnapshot {
        self.core.diagnostics.counters.snapshot()
    }

    /// The most recent `n` journal entries, oldest first.
    #[must_use]
    pub fn journal(&self, n: usize) -> Vec<JournalEntry> {
        self.core.diagnostics.journal.recent(n)
    }

    /// The latest stored value of `T`, when any.
    #[must_use]
    pub fn latest<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.core.latest()
    }

    /// Number of live reaction records (bound or draining).
    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.core.registry.len()
    }
}

impl std::fmt::Debug for PowerPlant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerPlant")
            .field("plant_id", &self.core.plant_id)
            .field("reactions", &self.core.registry.len())
            .finish_non_exhaustive()
    }
}

/// Builder injecting configuration and backends.
#[derive(Default)]
pub struct PowerPlantBuilder {
    config: PlantConfig,
    io_backend: Option<Box<dyn IoBackend>>,
    transport: Option<Box<dyn NetworkTransport>>,
}

impl PowerPlantBuilder {
    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: PlantConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs the IO readiness backend.
    #[must_use]
    pub fn io_backend(mut self, backend: impl IoBackend + 'static) -> Self {
        self.io_backend = Some(Box::new(backend));
        self
    }

    /// Installs the network transport.
    #[must_use]
    pub fn network(mut self, transport: impl NetworkTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Validates the configuration and builds the plant.
    ///
    /// # Errors
    ///
    /// Returns [`crate::config::ConfigError`] when the configuration
    /// is invalid.
    pub fn build(self) -> Result<PowerPlant, crate::config::ConfigError> {
        self.config.validate()?;
        Ok(PowerPlant {
            core: Arc::new(Core::new(self.config, self.io_backend, self.transport)),
        })
    }
}
