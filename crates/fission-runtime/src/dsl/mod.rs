//! The binding DSL.
//!
//! A reaction is declared by composing *words* — zero-sized marker
//! types that each contribute one argument to the callback and,
//! where relevant, one triggering type:
//!
//! ```text
//! ctx.on::<(Trigger<Ball>, With<Camera>)>()
//!     .label("track")
//!     .priority(Priority::High)
//!     .sync(SyncKey::new("motors"))
//!     .then(|ball: Arc<Ball>, camera: Arc<Camera>| { /* ... */ })
//! ```
//!
//! | Word | Argument | Triggers? |
//! |------|----------|-----------|
//! | [`Trigger<T>`] | `Arc<T>` (the causing value, else latest) | yes |
//! | [`With<T>`] | `Arc<T>` (latest) | no |
//! | [`Optional<W>`] | `Option<W::Arg>` | as wrapped |
//! | [`Last<T, N>`] | `Vec<Arc<T>>` (oldest first) | yes |
//! | [`Raw<T>`] | `Arc<T>` (exclusive per-emit claim) | yes |
//! | [`IoReady`] | [`IoEvent`](crate::io::IoEvent) (transient) | via backend |
//!
//! At bind time every word *describes* itself into a [`BindSpec`]
//! (triggers, history depths, raw claims); at dispatch time the words
//! *fetch* their arguments from a [`DispatchCx`]. A fetch that comes
//! back absent — an unset `With`, a lost raw claim — silently skips
//! the whole dispatch unless wrapped in [`Optional`].
//!
//! Options (`priority`, `sync`, `single`, `once`) are builder methods
//! rather than words: they change how tasks are scheduled, not what
//! the callback receives.

pub(crate) mod builder;
mod words;

pub use builder::{ReactionBuilder, ReactionFn, WordSet};
pub use words::{BindSpec, IoReady, Last, Optional, Raw, Shutdown, Startup, Tick, Trigger, With, Word};

pub use crate::reaction::DispatchCx;
