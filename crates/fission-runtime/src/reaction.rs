//! Reaction records.
//!
//! A record is what a bind produces: the fused argument-join +
//! callback closure, the scheduling options, and the three pieces of
//! mutable state the dispatch engine gates on (`enabled`, `bound`,
//! `inflight`). Records are owned by the registry; the bus, tasks and
//! handles refer to them by id or `Arc`.
//!
//! Lifecycle invariants:
//!
//! - every enqueued task was admitted through [`Reaction::try_reserve`];
//! - `once` records unbind at the end of their first completed
//!   execution;
//! - a record is reclaimed only after `bound == false` and
//!   `inflight == 0`.

use crate::store::{DataStore, Shared};
use fission_types::{Priority, ReactionId, SyncKey};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Declarative options attached to a reaction at bind time.
#[derive(Debug, Clone, Default)]
pub(crate) struct Options {
    pub priority: Priority,
    pub sync: Option<SyncKey>,
    pub single: bool,
    pub once: bool,
}

/// What a dispatch attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    /// Arguments joined and the callback ran to completion.
    Ran,
    /// A required value was absent; the task was silently skipped.
    Skipped,
    /// The callback panicked; the payload rendered as a message.
    Panicked(String),
}

/// Everything an argument join may read at dispatch time.
///
/// `cause` carries the value that produced this task (the just-emitted
/// value, or the synthetic tick); `raw` holds the per-emit exclusive
/// claim when this reaction won it. Transient values (IO readiness)
/// are read from the worker's thread-local slot instead.
pub struct DispatchCx<'a> {
    pub(crate) store: &'a DataStore,
    pub(crate) cause: Option<&'a Shared>,
    pub(crate) raw: &'a Mutex<Option<Shared>>,
}

impl<'a> DispatchCx<'a> {
    /// The causing value, when it is a `T`.
    #[must_use]
    pub fn cause<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.cause.and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// The latest stored value of `T`.
    #[must_use]
    pub fn latest<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.store.latest::<T>()
    }

    /// Up to `n` most recent values of `T`, oldest first.
    #[must_use]
    pub fn last_n<T: Send + Sync + 'static>(&self, n: usize) -> Vec<Arc<T>> {
        self.store.last_n::<T>(n)
    }

    /// Takes the exclusive raw claim, when present and of type `T`.
    ///
    /// The claim is consumed: a second call observes absence.
    #[must_use]
    pub fn claim_raw<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let mut slot = self.raw.lock();
        if slot.as_ref().is_some_and(|s| s.is::<T>()) {
            slot.take().and_then(|s| s.downcast::<T>().ok())
        } else {
            None
        }
    }

    /// The calling thread's transient value of `T`, when installed.
    #[must_use]
    pub fn transient<T: Clone + 'static>(&self) -> Option<T> {
        crate::store::transient::<T>()
    }
}

/// The fused argument-join + user-callback closure, composed at bind.
pub(crate) type Body = Box<dyn Fn(&DispatchCx<'_>) -> DispatchOutcome + Send + Sync>;

pub(crate) struct Reaction {
    id: ReactionId,
    label: String,
    trigger_types: Vec<TypeId>,
    raw_types: Vec<TypeId>,
    options: Options,
    enabled: AtomicBool,
    bound: AtomicBool,
    inflight: AtomicUsize,
    /// One-shot execution claim for `once` records.
    once_claimed: AtomicBool,
    body: Body,
}

impl Reaction {
    pub(crate) fn new(
        id: ReactionId,
        label: String,
        trigger_types: Vec<TypeId>,
        raw_types: Vec<TypeId>,
        options: Options,
        body: Body,
    ) -> Self {
        Self {
            id,
            label,
            trigger_types,
            raw_types,
            options,
            enabled: AtomicBool::new(true),
            bound: AtomicBool::new(true),
            inflight: AtomicUsize::new(0),
            once_claimed: AtomicBool::new(false),
            body,
        }
    }

    pub(crate) fn id(&self) -> ReactionId {
        self.id
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn trigger_types(&self) -> &[TypeId] {
        &self.trigger_types
    }

    pub(crate) fn options(&self) -> &Options {
        &self.options
    }

    /// Whether this reaction takes the raw claim for emits of `type_id`.
    pub(crate) fn consumes_raw(&self, type_id: TypeId) -> bool {
        self.raw_types.contains(&type_id)
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    /// Flips `bound` to false; returns true for the caller that did it.
    pub(crate) fn mark_unbound(&self) -> bool {
        self.bound.swap(false, Ordering::AcqRel)
    }

    /// Claims the single execution of a `once` record.
    ///
    /// Returns true for exactly one caller while the claim is held;
    /// concurrent tasks lose the claim and are dropped at the gate.
    pub(crate) fn try_claim_once(&self) -> bool {
        !self.once_claimed.swap(true, Ordering::AcqRel)
    }

    /// Returns the claim after a dispatch where the callback never
    /// ran (join skip), so a later emit can still fire the reaction.
    pub(crate) fn release_once_claim(&self) {
        self.once_claimed.store(false, Ordering::Release);
    }

    pub(crate) fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// Admits one more task, honoring the `single` option.
    ///
    /// Returns false when the reaction is single-flight and already has
    /// a queued-or-running task; such emits are dropped at creation
    /// time so the queue never grows behind a slow callback.
    pub(crate) fn try_reserve(&self) -> bool {
        self.inflight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if self.options.single && current > 0 {
                    None
                } else {
                    Some(current + 1)
                }
            })
            .is_ok()
    }

    /// Releases one task slot; returns the count still in flight.
    pub(crate) fn release(&self) -> usize {
        let prev = self.inflight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "inflight underflow on {}", self.id);
        prev - 1
    }

    /// Runs the fused join + callback, isolating panics.
    pub(crate) fn dispatch(&self, cx: &DispatchCx<'_>) -> DispatchOutcome {
        match catch_unwind(AssertUnwindSafe(|| (self.body)(cx))) {
            Ok(outcome) => outcome,
            Err(payload) => DispatchOutcome::Panicked(panic_message(payload)),
        }
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("enabled", &self.is_enabled())
            .field("bound", &self.is_bound())
            .field("inflight", &self.inflight())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
