//! Type-indexed event bus.
//!
//! Maps an event type to the reactions bound to it, in bind order.
//! Emit iteration order over subscribers **is** bind order — this is a
//! documented guarantee, not an accident of the container.
//!
//! Delivery works on snapshots: an emit copies the subscriber list
//! under the read lock and iterates the copy, so a concurrent
//! subscribe or unsubscribe never invalidates an in-progress emit.

use fission_types::ReactionId;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;

pub(crate) struct EventBus {
    subscribers: RwLock<HashMap<TypeId, Vec<ReactionId>>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Appends `id` to the subscriber list of `type_id`.
    pub(crate) fn subscribe(&self, type_id: TypeId, id: ReactionId) {
        self.subscribers.write().entry(type_id).or_default().push(id);
    }

    /// Removes `id` from the subscriber lists of the given types.
    pub(crate) fn unsubscribe(&self, id: ReactionId, types: &[TypeId]) {
        let mut subs = self.subscribers.write();
        for type_id in types {
            if let Some(list) = subs.get_mut(type_id) {
                list.retain(|r| *r != id);
                if list.is_empty() {
                    subs.remove(type_id);
                }
            }
        }
    }

    /// Returns a copy of the subscriber list for `type_id`, bind order.
    pub(crate) fn snapshot(&self, type_id: TypeId) -> Vec<ReactionId> {
        self.subscribers
            .read()
            .get(&type_id)
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self, type_id: TypeId) -> usize {
        self.subscribers
            .read()
            .get(&type_id)
            .map_or(0, Vec::len)
    }
}
