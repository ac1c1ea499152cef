//! Scheduling priority ladder.

use serde::{Deserialize, Serialize};

/// Priority of a reaction's tasks in the scheduler queue.
///
/// Within one priority level tasks run in creation order (FIFO). Across
/// levels, a higher-priority task always dequeues first. `Idle` tasks
/// therefore only run when nothing else is ready.
///
/// | Level | Use |
/// |-------|-----|
/// | [`Realtime`](Self::Realtime) | control loops that must not wait behind anything |
/// | [`High`](Self::High) | latency-sensitive work |
/// | [`Default`](Self::Default) | everything, unless stated otherwise |
/// | [`Low`](Self::Low) | bulk or deferrable work |
/// | [`Idle`](Self::Idle) | background housekeeping |
///
/// # Example
///
/// ```
/// use fission_types::Priority;
///
/// assert!(Priority::Realtime > Priority::High);
/// assert!(Priority::Default > Priority::Idle);
/// assert_eq!(Priority::default(), Priority::Default);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Runs only when no higher-priority task is ready.
    Idle,
    /// Below default.
    Low,
    /// The default level.
    #[default]
    Default,
    /// Above default.
    High,
    /// Top of the queue. No dedicated thread; simply never outranked.
    Realtime,
}

impl Priority {
    /// All levels, highest first.
    pub const ALL: [Priority; 5] = [
        Priority::Realtime,
        Priority::High,
        Priority::Default,
        Priority::Low,
        Priority::Idle,
    ];

    /// Short lowercase name, as used in logs and journal entries.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Realtime => "realtime",
            Priority::High => "high",
            Priority::Default => "default",
            Priority::Low => "low",
            Priority::Idle => "idle",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
