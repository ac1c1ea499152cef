//! Bind-time errors.
//!
//! The runtime surfaces failures in exactly two synchronous places:
//! reaction binding (`.then(...)`) and reactor installation. Everything
//! that happens during dispatch is either silent-by-design (join
//! skips), survivable (callback panics, reported to the journal), or
//! fatal (scheduler invariant violations). None of those produce a
//! `Result` — emit is fire-and-forget.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`BindError::NoTriggers`] | `BIND_NO_TRIGGERS` | No |
//! | [`BindError::InvalidPeriod`] | `BIND_INVALID_PERIOD` | No |
//! | [`BindError::EmptySyncKey`] | `BIND_EMPTY_SYNC_KEY` | No |
//! | [`BindError::NoIoBackend`] | `BIND_NO_IO_BACKEND` | No |
//! | [`BindError::Io`] | `BIND_IO_FAILED` | No |
//! | [`BindError::PlantStopped`] | `BIND_PLANT_STOPPED` | No |

use crate::io::IoError;
use fission_types::ErrorCode;
use thiserror::Error;

/// Invalid reaction composition, raised synchronously at bind time.
///
/// A failed bind creates no record: nothing is registered on the bus,
/// no handle is returned, and the plant is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The word set declares no triggering type.
    ///
    /// A reaction needs at least one `Trigger`/`Last`/`Raw` word (or a
    /// timer/IO source); a composition of only `With` words can never
    /// fire.
    #[error("reaction has no triggering type")]
    NoTriggers,

    /// A periodic reaction was bound with a zero period.
    #[error("periodic reaction period must be non-zero")]
    InvalidPeriod,

    /// A sync group key with an empty name.
    #[error("sync group key must not be empty")]
    EmptySyncKey,

    /// An IO reaction was bound but the plant has no IO backend.
    #[error("no IO backend installed")]
    NoIoBackend,

    /// The IO backend rejected the descriptor.
    #[error("io bind failed: {0}")]
    Io(#[from] IoError),

    /// The plant has already shut down; no further binds are accepted.
    #[error("power plant is stopped")]
    PlantStopped,
}

impl ErrorCode for BindError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoTriggers => "BIND_NO_TRIGGERS",
            Self::InvalidPeriod => "BIND_INVALID_PERIOD",
            Self::EmptySyncKey => "BIND_EMPTY_SYNC_KEY",
            Self::NoIoBackend => "BIND_NO_IO_BACKEND",
            Self::Io(_) => "BIND_IO_FAILED",
            Self::PlantStopped => "BIND_PLANT_STOPPED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
