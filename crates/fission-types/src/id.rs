//! Identifier types for the fission runtime.
//!
//! Reactions are identified by a cheap ascending integer because the
//! dispatch engine compares and orders them constantly. The runtime
//! instance itself carries a UUID so that network transports can tell
//! plants apart (and drop reflected self-traffic).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier for a bound reaction.
///
/// Assigned by the reaction registry from a monotonically increasing
/// counter, so ids are unique within one runtime and ordered by bind
/// time. Ids are never reused, even after the reaction is unbound.
///
/// # Example
///
/// ```
/// use fission_types::ReactionId;
///
/// let a = ReactionId::new(1);
/// let b = ReactionId::new(2);
///
/// assert!(a < b);
/// assert_eq!(a.raw(), 1);
/// assert_eq!(a.to_string(), "reaction:1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReactionId(u64);

impl ReactionId {
    /// Wraps a raw id value.
    ///
    /// Normally only the registry calls this; user code receives ids
    /// from [`ReactionHandle::id`] and diagnostics entries.
    ///
    /// [`ReactionHandle::id`]: https://docs.rs/fission-runtime
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ReactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reaction:{}", self.0)
    }
}

/// Identity of one running PowerPlant instance.
///
/// Random per construction. Network frames carry the originating
/// `PlantId` so a broadcast transport can discard frames it sent
/// itself.
///
/// # Example
///
/// ```
/// use fission_types::PlantId;
///
/// let a = PlantId::new();
/// let b = PlantId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlantId(Uuid);

impl PlantId {
    /// Creates a new random plant identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "plant:{}", self.0)
    }
}

/// A named serialization domain for reactions.
///
/// Reactions bound with the same key never execute concurrently: the
/// scheduler admits at most one task per key at a time and parks the
/// rest on a per-key waiter list.
///
/// Keys compare by name. Cloning is cheap (shared string).
///
/// # Example
///
/// ```
/// use fission_types::SyncKey;
///
/// let a = SyncKey::new("motors");
/// let b = SyncKey::new("motors");
///
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "motors");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncKey(Arc<str>);

impl SyncKey {
    /// Creates a key from a group name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::from(name.into()))
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SyncKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sync:{}", self.0)
    }
}

impl From<&str> for SyncKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
