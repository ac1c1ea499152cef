//! IO readiness contract.
//!
//! The runtime does not poll file descriptors itself. A backend (a
//! poll/epoll/kqueue loop, or a test double) implements [`IoBackend`]
//! and is handed `(fd, interest, token)` at bind time; on readiness it
//! calls back into the plant with `dispatch_io(token, event)`. The
//! readiness event reaches the callback through the thread-local
//! transient slot, and IO reactions are implicitly single-flight.

use fission_types::{ErrorCode, ReactionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OS-level descriptor handle, as the backend understands it.
pub type Fd = i32;

bitflags::bitflags! {
    /// Readiness interest and observation set.
    ///
    /// Abstracts over the platform poll constants:
    ///
    /// | Flag | Meaning |
    /// |------|---------|
    /// | [`READ`](Self::READ) | data available to read |
    /// | [`WRITE`](Self::WRITE) | writable without blocking |
    /// | [`CLOSE`](Self::CLOSE) | peer closed the stream |
    /// | [`ERROR`](Self::ERROR) | descriptor is in an error state |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct IoSet: u8 {
        const READ  = 0b0001;
        const WRITE = 0b0010;
        const CLOSE = 0b0100;
        const ERROR = 0b1000;
    }
}

/// A single observed readiness event.
///
/// Delivered to the bound reaction as its transient argument; absent
/// outside IO-driven dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoEvent {
    /// The descriptor that became ready.
    pub fd: Fd,
    /// The subset of the watched interest that fired.
    pub ready: IoSet,
}

/// Contract between the plant and an external readiness loop.
///
/// The backend owns the actual waiting. For each bound IO reaction it
/// receives the descriptor, the interest set, and an opaque token; it
/// must call `PowerPlant::dispatch_io(token, event)` whenever the
/// interest fires, and stop watching once `unbind` is called for the
/// token. Tokens may outlive readiness briefly — dispatching for an
/// already-unbound token is harmless.
pub trait IoBackend: Send + Sync {
    /// Starts watching `fd` for `interest`, attributed to `token`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`] when the descriptor cannot be watched.
    fn bind(&self, fd: Fd, interest: IoSet, token: ReactionId) -> Result<(), IoError>;

    /// Stops watching whatever was bound under `token`.
    fn unbind(&self, token: ReactionId);
}

/// IO backend failures, raised at bind time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    /// The descriptor is not watchable (negative, closed, wrong kind).
    #[error("invalid descriptor: {0}")]
    InvalidFd(Fd),

    /// Backend-specific failure.
    #[error("io backend failure: {0}")]
    Backend(String),
}

impl ErrorCode for IoError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidFd(_) => "IO_INVALID_FD",
            Self::Backend(_) => "IO_BACKEND_FAILURE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
