//! Type-indexed data store.
//!
//! For every event type the store keeps up to three things:
//!
//! - **latest** — the most recently emitted value, as a shared
//!   read-only view (`Arc<T>`), replaced atomically on each emit;
//! - **history** — a bounded ring of past values, kept only for types
//!   some reaction consumes with a history depth;
//! - **transient** — a per-thread one-shot slot, installed around a
//!   single callback execution (IO readiness events travel this way).
//!
//! Values live until overwritten by a later emit of the same type.
//! Reading an unset type yields absence, never an error.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// A type-erased shared value, as stored per type.
pub(crate) type Shared = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct TypeSlot {
    latest: Option<Shared>,
    history: VecDeque<Shared>,
    /// Ring depth; 0 until some reaction reserves history for the type.
    depth: usize,
}

/// Shared store of the latest value and bounded history per event type.
pub(crate) struct DataStore {
    slots: RwLock<HashMap<TypeId, TypeSlot>>,
}

impl DataStore {
    pub(crate) fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `value` as the latest of its type, returning the shared view.
    pub(crate) fn set<T: Send + Sync + 'static>(&self, value: T) -> Arc<T> {
        let shared = Arc::new(value);
        self.set_shared(TypeId::of::<T>(), shared.clone());
        shared
    }

    /// Type-erased variant of [`set`](Self::set); appends to history when
    /// the type has a reserved ring.
    pub(crate) fn set_shared(&self, type_id: TypeId, value: Shared) {
        let mut slots = self.slots.write();
        let slot = slots.entry(type_id).or_default();
        if slot.depth > 0 {
            if slot.history.len() >= slot.depth {
                slot.history.pop_front();
            }
            slot.history.push_back(value.clone());
        }
        slot.latest = Some(value);
    }

    /// Returns the latest value of `T`, absent when never emitted.
    pub(crate) fn latest<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let slots = self.slots.read();
        let shared = slots.get(&TypeId::of::<T>())?.latest.clone()?;
        shared.downcast::<T>().ok()
    }

    /// Returns up to `n` most recent values of `T`, **oldest first**.
    ///
    /// Shorter than `n` when fewer values were emitted (or the reserved
    /// ring is shallower).
    pub(crate) fn last_n<T: Send + Sync + 'static>(&self, n: usize) -> Vec<Arc<T>> {
        let slots = self.slots.read();
        let Some(slot) = slots.get(&TypeId::of::<T>()) else {
            return Vec::new();
        };
        let skip = slot.history.len().saturating_sub(n);
        slot.history
            .iter()
            .skip(skip)
            .filter_map(|s| s.clone().downcast::<T>().ok())
            .collect()
    }

    /// Grows the history ring for `type_id` to at least `depth`.
    ///
    /// Called at bind time for each reaction that declares a history
    /// consumer; the ring keeps the maximum requested depth.
    pub(crate) fn reserve_history(&self, type_id: TypeId, depth: usize) {
        let depth = depth.max(1);
        let mut slots = self.slots.write();
        let slot = slots.entry(type_id).or_default();
        slot.depth = slot.depth.max(depth);
    }
}

thread_local! {
    static TRANSIENTS: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Installs `value` in the calling thread's transient slot for the
/// duration of `f`, restoring the previous state on every exit path
/// (including unwinding out of `f`).
pub(crate) fn with_transient<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    struct Restore {
        type_id: TypeId,
        prev: Option<Box<dyn Any>>,
    }

    impl Drop for Restore {
        fn drop(&mut self) {
            let prev = self.prev.take();
            TRANSIENTS.with(|slot| {
                let mut map = slot.borrow_mut();
                match prev {
                    Some(p) => {
                        map.insert(self.type_id, p);
                    }
                    None => {
                        map.remove(&self.type_id);
                    }
                }
            });
        }
    }

    let type_id = TypeId::of::<T>();
    let prev = TRANSIENTS.with(|slot| slot.borrow_mut().insert(type_id, Box::new(value)));
    let _restore = Restore { type_id, prev };
    f()
}

/// Reads the calling thread's transient slot for `T`.
///
/// Absent outside a [`with_transient`] scope for this type.
pub(crate) fn transient<T: Clone + 'static>() -> Option<T> {
    TRANSIENTS.with(|slot| {
        slot.borrow()
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref::<T>())
            .cloned()
    })
}
