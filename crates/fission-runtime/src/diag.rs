//! Dispatch diagnostics.
//!
//! The runtime never surfaces dispatch failures to emitters, so this
//! module is where they become observable instead:
//!
//! - [`DiagCounters`] — cheap atomic counters for every gate a task
//!   can fall through (join skip, disabled drop, single drop, ...).
//! - [`Journal`] — a rolling buffer of attributed entries for the
//!   events worth keeping context for (callback panics, fatal
//!   invariant violations).
//!
//! Counters answer "how often"; the journal answers "which reaction,
//! when, and what did it say".

use chrono::{DateTime, Utc};
use fission_types::ReactionId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic dispatch counters.
#[derive(Debug, Default)]
pub struct DiagCounters {
    /// Values emitted into the plant (all handlers).
    pub(crate) emitted: AtomicU64,
    /// Callbacks that ran to completion.
    pub(crate) dispatched: AtomicU64,
    /// Tasks dropped because a required value was absent.
    pub(crate) skipped_joins: AtomicU64,
    /// Tasks dropped at the gate because the reaction was disabled
    /// or already unbound.
    pub(crate) dropped_gated: AtomicU64,
    /// Emits dropped at creation because a single-flight reaction was
    /// already busy.
    pub(crate) dropped_single: AtomicU64,
    /// Callbacks that panicked.
    pub(crate) panics: AtomicU64,
    /// Timer ticks merged into an already-pending tick.
    pub(crate) coalesced_ticks: AtomicU64,
    /// Emits rejected because the plant was not accepting work.
    pub(crate) rejected: AtomicU64,
}

impl DiagCounters {
    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a consistent-enough copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> DiagSnapshot {
        DiagSnapshot {
            emitted: self.emitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            skipped_joins: self.skipped_joins.load(Ordering::Relaxed),
            dropped_gated: self.dropped_gated.load(Ordering::Relaxed),
            dropped_single: self.dropped_single.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            coalesced_ticks: self.coalesced_ticks.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DiagCounters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagSnapshot {
    pub emitted: u64,
    pub dispatched: u64,
    pub skipped_joins: u64,
    pub dropped_gated: u64,
    pub dropped_single: u64,
    pub panics: u64,
    pub coalesced_ticks: u64,
    pub rejected: u64,
}

/// Classification of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JournalKind {
    /// A user callback panicked; the worker survived.
    CallbackPanic,
    /// A runtime invariant was violated; the plant is tearing down.
    Fatal,
}

/// One recorded dispatch anomaly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
    /// The reaction involved, when attributable.
    pub reaction: Option<ReactionId>,
    /// The reaction's label, when attributable.
    pub label: Option<String>,
    /// What happened.
    pub kind: JournalKind,
    /// Free-form detail (panic message, violated invariant).
    pub detail: String,
}

/// Rolling buffer of recent [`JournalEntry`] values.
///
/// Bounded; when full, the oldest entry is evicted on append.
pub struct Journal {
    entries: Mutex<VecDeque<JournalEntry>>,
    capacity: usize,
}

impl Journal {
    /// Creates a journal holding at most `capacity` entries
    /// (a capacity of 0 is treated as 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub(crate) fn record(
        &self,
        reaction: Option<ReactionId>,
        label: Option<String>,
        kind: JournalKind,
        detail: impl Into<String>,
    ) {
        let entry = JournalEntry {
            at: Utc::now(),
            reaction,
            label,
            kind,
            detail: detail.into(),
        };
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns the most recent `n` entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<JournalEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Counters and journal bundled, shared across the runtime.
pub struct Diagnostics {
    pub counters: DiagCounters,
    pub journal: Journal,
}

impl Diagnostics {
    #[must_use]
    pub(crate) fn new(journal_capacity: usize) -> Self {
        Self {
            counters: DiagCounters::default(),
            journal: Journal::with_capacity(journal_capacity),
        }
    }

    pub(crate) fn record_panic(&self, reaction: ReactionId, label: &str, message: &str) {
        DiagCounters::inc(&self.counters.panics);
        self.journal.record(
            Some(reaction),
            Some(label.to_string()),
            JournalKind::CallbackPanic,
            message,
        );
    }

    pub(crate) fn record_fatal(&self, detail: &str) {
        self.journal.record(None, None, JournalKind::Fatal, detail);
    }
}
