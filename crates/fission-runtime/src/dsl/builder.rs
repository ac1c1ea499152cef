//! Reaction builder.
//!
//! Composes a reaction record from a word set, the option methods,
//! and the user callback, then registers it with the plant. All
//! composition errors surface here, synchronously, as [`BindError`] —
//! nothing invalid ever reaches the scheduler.

use super::words::{BindSpec, Word};
use crate::error::BindError;
use crate::handle::ReactionHandle;
use crate::io::{Fd, IoSet};
use crate::powerplant::Core;
use crate::reaction::{Body, DispatchCx, DispatchOutcome, Options};
use fission_types::{Priority, SyncKey};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Where a reaction's tasks come from.
pub(crate) enum Source {
    /// Fired by emits of the trigger types.
    Bus,
    /// Fired by the chronometer at the given period.
    Every(Duration),
    /// Fired by the IO backend for this descriptor and interest.
    Io(Fd, IoSet),
}

/// A tuple of [`Word`]s, as accepted by `on::<(...)>()`.
///
/// Implemented for tuples of one through six words.
pub trait WordSet: 'static {
    /// The callback's argument tuple.
    type Args: Send + 'static;

    /// Describes every word's triggers and reservations, in order.
    fn describe(spec: &mut BindSpec);

    /// Fetches every argument; any absence skips the dispatch.
    fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Args>;
}

macro_rules! impl_word_set {
    ($($word:ident),+) => {
        impl<$($word: Word),+> WordSet for ($($word,)+) {
            type Args = ($($word::Arg,)+);

            fn describe(spec: &mut BindSpec) {
                $($word::describe(spec);)+
            }

            fn fetch(cx: &DispatchCx<'_>) -> Option<Self::Args> {
                Some(($($word::fetch(cx)?,)+))
            }
        }
    };
}

impl_word_set!(W1);
impl_word_set!(W1, W2);
impl_word_set!(W1, W2, W3);
impl_word_set!(W1, W2, W3, W4);
impl_word_set!(W1, W2, W3, W4, W5);
impl_word_set!(W1, W2, W3, W4, W5, W6);

/// A callback taking the word set's arguments as plain parameters.
///
/// Lets `then` accept `|ball: Arc<Ball>, cam: Arc<Camera>| ...`
/// instead of a tuple-taking closure.
pub trait ReactionFn<Args>: Send + Sync + 'static {
    fn call(&self, args: Args);
}

macro_rules! impl_reaction_fn {
    ($(($arg_ty:ident, $arg:ident)),+) => {
        impl<Func, $($arg_ty),+> ReactionFn<($($arg_ty,)+)> for Func
        where
            Func: Fn($($arg_ty),+) + Send + Sync + 'static,
        {
            fn call(&self, ($($arg,)+): ($($arg_ty,)+)) {
                (self)($($arg),+)
            }
        }
    };
}

impl_reaction_fn!((A1, a1));
impl_reaction_fn!((A1, a1), (A2, a2));
impl_reaction_fn!((A1, a1), (A2, a2), (A3, a3));
impl_reaction_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4));
impl_reaction_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5));
impl_reaction_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5), (A6, a6));

/// Fluent configuration of one reaction, finished by
/// [`then`](Self::then).
#[must_use = "a reaction builder does nothing until .then(...) is called"]
pub struct ReactionBuilder<W: WordSet> {
    core: Arc<Core>,
    scope: String,
    source: Source,
    label: Option<String>,
    options: Options,
    _words: PhantomData<fn() -> W>,
}

impl<W: WordSet> ReactionBuilder<W> {
    pub(crate) fn new(core: Arc<Core>, scope: String, source: Source) -> Self {
        Self {
            core,
            scope,
            source,
            label: None,
            options: Options::default(),
            _words: PhantomData,
        }
    }

    /// Human-readable name, used in logs and journal entries.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Scheduling priority; [`Priority::Default`] unless set.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.options.priority = priority;
        self
    }

    /// Serializes this reaction with everything else holding `key`.
    pub fn sync(mut self, key: SyncKey) -> Self {
        self.options.sync = Some(key);
        self
    }

    /// At most one task queued-or-running; excess emits are dropped.
    pub fn single(mut self) -> Self {
        self.options.single = true;
        self
    }

    /// Unbind after the first completed execution.
    pub fn once(mut self) -> Self {
        self.options.once = true;
        self
    }

    /// Validates the composition, registers the reaction, and returns
    /// its handle.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] on an invalid composition (no triggering
    /// word, zero period, empty sync key, missing IO backend) or when
    /// the plant has stopped. A failed bind registers nothing.
    pub fn then<F>(self, callback: F) -> Result<ReactionHandle, BindError>
    where
        F: ReactionFn<W::Args>,
    {
        let mut spec = BindSpec::default();
        W::describe(&mut spec);

        if let Some(key) = &self.options.sync {
            if key.name().is_empty() {
                return Err(BindError::EmptySyncKey);
            }
        }
        let mut options = self.options;
        match &self.source {
            Source::Bus => {
                if spec.triggers.is_empty() {
                    return Err(BindError::NoTriggers);
                }
            }
            Source::Every(period) => {
                if period.is_zero() {
                    return Err(BindError::InvalidPeriod);
                }
            }
            Source::Io(..) => {
                // IO reactions are implicitly single-flight.
                options.single = true;
            }
        }

        let body: Body = Box::new(move |cx| match W::fetch(cx) {
            Some(args) => {
                callback.call(args);
                DispatchOutcome::Ran
            }
            None => DispatchOutcome::Skipped,
        });

        self.core
            .bind(spec, self.source, self.label, &self.scope, options, body)
    }
}
