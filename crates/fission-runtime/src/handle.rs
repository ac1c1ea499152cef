//! Reaction handles.

use crate::powerplant::Core;
use fission_types::ReactionId;
use std::sync::Weak;

/// An opaque reference to a bound reaction.
///
/// Handles are cheap to clone and safe to share across threads. All
/// operations are idempotent: disabling a disabled reaction, or
/// unbinding twice, does nothing. A handle never keeps its reaction
/// (or the plant) alive — operations on a handle whose plant has shut
/// down are no-ops.
///
/// # Semantics
///
/// - [`disable`](Self::disable) keeps queued tasks queued, but they
///   are dropped at the dispatch gate instead of running.
/// - [`enable`](Self::enable) restores dispatch.
/// - [`unbind`](Self::unbind) removes the reaction from the bus and
///   from any timer/IO registration; the record is reclaimed once its
///   in-flight tasks drain. A task already dequeued may still run.
#[derive(Clone)]
pub struct ReactionHandle {
    id: ReactionId,
    core: Weak<Core>,
}

impl ReactionHandle {
    pub(crate) fn new(id: ReactionId, core: Weak<Core>) -> Self {
        Self { id, core }
    }

    /// The reaction's runtime-unique id.
    #[must_use]
    pub fn id(&self) -> ReactionId {
        self.id
    }

    /// Allows the reaction to be dispatched again.
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Stops the reaction from being dispatched.
    ///
    /// Tasks already queued observe the flag at dispatch entry and are
    /// dropped.
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Whether the reaction is currently enabled.
    ///
    /// Returns false when the reaction (or the plant) is gone.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.core
            .upgrade()
            .and_then(|core| core.registry().get(self.id))
            .is_some_and(|rec| rec.is_enabled())
    }

    /// Permanently removes the reaction from the runtime.
    pub fn unbind(&self) {
        if let Some(core) = self.core.upgrade() {
            core.unbind(self.id);
        }
    }

    fn set_enabled(&self, enabled: bool) {
        if let Some(core) = self.core.upgrade() {
            if let Some(rec) = core.registry().get(self.id) {
                rec.set_enabled(enabled);
            }
        }
    }
}

impl std::fmt::Debug for ReactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
