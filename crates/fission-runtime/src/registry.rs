//! Reaction registry.
//!
//! The registry is the single owner of reaction records. The bus,
//! tasks and handles refer to records by id (or a transient `Arc`
//! resolved through here), which keeps ownership acyclic: a record is
//! removed from the map once it is unbound *and* its last in-flight
//! task has drained, and the `Arc` count does the rest.

use crate::reaction::Reaction;
use fission_types::ReactionId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) struct Registry {
    next_id: AtomicU64,
    records: RwLock<HashMap<ReactionId, Arc<Reaction>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Allocates the next ascending reaction id.
    pub(crate) fn next_id(&self) -> ReactionId {
        ReactionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn insert(&self, record: Arc<Reaction>) {
        self.records.write().insert(record.id(), record);
    }

    pub(crate) fn get(&self, id: ReactionId) -> Option<Arc<Reaction>> {
        self.records.read().get(&id).cloned()
    }

    /// Drops the record if it is unbound with no in-flight tasks.
    ///
    /// Safe to call speculatively; a record that is still bound or
    /// still draining is left alone. Callers race benignly here — the
    /// second reap of an id is a no-op.
    pub(crate) fn reap(&self, id: ReactionId) {
        let mut records = self.records.write();
        let done = records
            .get(&id)
            .is_some_and(|rec| !rec.is_bound() && rec.inflight() == 0);
        if done {
            records.remove(&id);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::{DispatchOutcome, Options};
    use std::any::TypeId;

    fn record(registry: &Registry) -> Arc<Reaction> {
        let rec = Arc::new(Reaction::new(
            registry.next_id(),
            "test/record".into(),
            vec![TypeId::of::<u8>()],
            Vec::new(),
            Options::default(),
            Box::new(|_| DispatchOutcome::Ran),
        ));
        registry.insert(rec.clone());
        rec
    }

    #[test]
    fn ids_ascend() {
        let registry = Registry::new();
        let a = registry.next_id();
        let b = registry.next_id();
        assert!(a < b);
    }

    #[test]
    fn reap_requires_unbound_and_drained() {
        let registry = Registry::new();
        let rec = record(&registry);
        let id = rec.id();

        registry.reap(id);
        assert!(registry.get(id).is_some(), "bound record must survive");

        rec.try_reserve();
        rec.mark_unbound();
        registry.reap(id);
        assert!(registry.get(id).is_some(), "draining record must survive");

        rec.release();
        registry.reap(id);
        assert!(registry.get(id).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn reap_is_idempotent() {
        let registry = Registry::new();
        let rec = record(&registry);
        rec.mark_unbound();
        registry.reap(rec.id());
        registry.reap(rec.id());
        assert_eq!(registry.len(), 0);
    }
}
