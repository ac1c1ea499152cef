//! DSL words and the lifecycle event types.

use crate::io::IoEvent;
use crate::reaction::DispatchCx;
use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

/// What a word set declares at bind time.
#[derive(Debug, Default)]
pub struct BindSpec {
    /// Types whose emit fires the reaction, in word order.
    pub triggers: Vec<TypeId>,
    /// History ring reservations `(type, depth)`.
    pub history: Vec<(TypeId, usize)>,
    /// Types for which this reaction takes the per-emit raw claim.
    pub raw: Vec<TypeId>,
}

/// One argument of a reaction callback.
///
/// Implementations are zero-sized markers; a word is only ever named
/// as a type parameter. Custom words are possible: describe your
/// triggers into the [`BindSpec`] and fetch your argument from the
/// [`DispatchCx`].
pub trait Word: 'static {
    /// What the callback receives for this word.
    type Arg: Send + 'static;

    /// Records triggers and store reservations at bind time.
    fn describe(spec: &mut BindSpec);

    /// Produces the argument at dispatch time; `None` skips the task.
    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Arg>;
}

/// Fires the reaction when a `T` is emitted; the callback receives the
/// causing value (or, for a dispatch caused by another trigger of the
/// same reaction, the latest `T`).
pub struct Trigger<T>(PhantomData<fn() -> T>);

impl<T: Send + Sync + 'static> Word for Trigger<T> {
    type Arg = Arc<T>;

    fn describe(spec: &mut BindSpec) {
        spec.triggers.push(TypeId::of::<T>());
    }

    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Arg> {
        cx.cause::<T>().or_else(|| cx.latest::<T>())
    }
}

/// Joins the latest `T` into the arguments without firing on it.
pub struct With<T>(PhantomData<fn() -> T>);

impl<T: Send + Sync + 'static> Word for With<T> {
    type Arg = Arc<T>;

    fn describe(_spec: &mut BindSpec) {}

    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Arg> {
        cx.latest::<T>()
    }
}

/// Turns the wrapped word's absence into `None` instead of a skip.
pub struct Optional<W>(PhantomData<fn() -> W>);

impl<W: Word> Word for Optional<W> {
    type Arg = Option<W::Arg>;

    fn describe(spec: &mut BindSpec) {
        W::describe(spec);
    }

    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Arg> {
        Some(W::fetch(cx))
    }
}

/// Fires on `T` and receives the last `N` values, oldest first.
///
/// The snapshot may be shorter than `N` while the history fills.
pub struct Last<T, const N: usize>(PhantomData<fn() -> T>);

impl<T: Send + Sync + 'static, const N: usize> Word for Last<T, N> {
    type Arg = Vec<Arc<T>>;

    fn describe(spec: &mut BindSpec) {
        spec.triggers.push(TypeId::of::<T>());
        spec.history.push((TypeId::of::<T>(), N));
    }

    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Arg> {
        Some(cx.last_n::<T>(N))
    }
}

/// Fires on `T` and takes the exclusive per-emit claim.
///
/// When several reactions declare `Raw<T>`, the first-bound one wins
/// each emit; the others observe absence and are skipped. The claim
/// is the exact allocation the emit produced.
pub struct Raw<T>(PhantomData<fn() -> T>);

impl<T: Send + Sync + 'static> Word for Raw<T> {
    type Arg = Arc<T>;

    fn describe(spec: &mut BindSpec) {
        spec.triggers.push(TypeId::of::<T>());
        spec.raw.push(TypeId::of::<T>());
    }

    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Arg> {
        cx.claim_raw::<T>()
    }
}

/// The readiness event of an IO-driven dispatch.
///
/// Reads the worker's transient slot; absent outside IO dispatch, so
/// a reaction bound through anything but `on_io` never fetches one.
pub struct IoReady(());

impl Word for IoReady {
    type Arg = IoEvent;

    fn describe(spec: &mut BindSpec) {
        // The readiness event types the reaction without going through
        // the bus; the backend dispatches by token.
        spec.triggers.push(TypeId::of::<IoEvent>());
    }

    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Arg> {
        cx.transient::<IoEvent>()
    }
}

/// Emitted exactly once while the plant starts, before user emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Startup;

/// Emitted during graceful shutdown, after other tasks drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shutdown;

/// The synthetic value of a periodic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based count of ticks actually dispatched for this reaction.
    /// Coalesced ticks do not advance it.
    pub index: u64,
}
