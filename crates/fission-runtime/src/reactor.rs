//! The reactor programming surface.
//!
//! A reactor is a module of behavior: it binds reactions during
//! [`setup`](Reactor::setup) and communicates only by emitting values.
//! Reactors hold their own state behind interior mutability; callbacks
//! capture an `Arc` of the reactor (and an [`Emitter`]) and run on
//! worker threads.
//!
//! ```no_run
//! use fission_runtime::dsl::Trigger;
//! use fission_runtime::reactor::{Reactor, ReactorContext};
//! use fission_runtime::error::BindError;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! struct Distance(f64);
//!
//! #[derive(Default)]
//! struct Odometry {
//!     total: AtomicU64,
//! }
//!
//! impl Reactor for Odometry {
//!     fn name(&self) -> &str {
//!         "odometry"
//!     }
//!
//!     fn setup(self: &Arc<Self>, ctx: &ReactorContext<'_>) -> Result<(), BindError> {
//!         let this = self.clone();
//!         ctx.on::<(Trigger<Distance>,)>()
//!             .label("accumulate")
//!             .then(move |d: Arc<Distance>| {
//!                 this.total.fetch_add(d.0 as u64, Ordering::Relaxed);
//!             })?;
//!         Ok(())
//!     }
//! }
//! ```

use crate::dsl::builder::Source;
use crate::dsl::{IoReady, ReactionBuilder, Shutdown, Startup, Tick, Trigger, WordSet};
use crate::error::BindError;
use crate::io::{Fd, IoSet};
use crate::net::NetError;
use crate::powerplant::Core;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// A module of reactions, installed under a plant.
///
/// Installed reactors are kept alive for the plant's lifetime; their
/// reactions can still be unbound individually through the handles
/// returned at bind time.
pub trait Reactor: Send + Sync + 'static {
    /// Short name, used as the scope prefix of reaction labels.
    fn name(&self) -> &str;

    /// Binds this reactor's reactions.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when a composition is invalid; the plant
    /// keeps whatever was bound before the failing call.
    fn setup(self: &Arc<Self>, ctx: &ReactorContext<'_>) -> Result<(), BindError>;
}

/// Bind-and-emit surface handed to a reactor during setup.
pub struct ReactorContext<'p> {
    core: &'p Arc<Core>,
    scope: String,
}

impl<'p> ReactorContext<'p> {
    pub(crate) fn new(core: &'p Arc<Core>, scope: String) -> Self {
        Self { core, scope }
    }

    /// Starts a reaction bound to emits of the word set's triggers.
    pub fn on<W: WordSet>(&self) -> ReactionBuilder<W> {
        self.builder(Source::Bus)
    }

    /// Starts a periodic reaction; the callback receives the tick.
    pub fn every(&self, period: Duration) -> ReactionBuilder<(Trigger<Tick>,)> {
        self.builder(Source::Every(period))
    }

    /// Starts an IO-driven reaction (implicitly single-flight).
    pub fn on_io(&self, fd: Fd, interest: IoSet) -> ReactionBuilder<(IoReady,)> {
        self.builder(Source::Io(fd, interest))
    }

    /// Runs once while the plant starts, before user emits.
    pub fn on_startup(&self) -> ReactionBuilder<(Trigger<Startup>,)> {
        self.builder(Source::Bus)
    }

    /// Runs during graceful shutdown, after other work drained.
    pub fn on_shutdown(&self) -> ReactionBuilder<(Trigger<Shutdown>,)> {
        self.builder(Source::Bus)
    }

    /// Emits a value locally (store + bus). Fire-and-forget.
    pub fn emit<T: Send + Sync + 'static>(&self, value: T) {
        self.core.emit(value);
    }

    /// Dispatches subscribers synchronously on the calling thread,
    /// bypassing the scheduler (and sync-group arbitration).
    pub fn emit_direct<T: Send + Sync + 'static>(&self, value: T) {
        self.core.emit_direct(value);
    }

    /// Defers the emit until the plant starts; a no-op difference
    /// from [`emit`](Self::emit) once the plant is running.
    pub fn emit_init<T: Send + Sync + 'static>(&self, value: T) {
        self.core.emit_init(value);
    }

    /// Hands the value to the network transport.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] when no transport is installed or the
    /// value cannot be encoded or sent.
    pub fn emit_net<T: Serialize + 'static>(&self, value: &T) -> Result<(), NetError> {
        self.core.emit_net(value)
    }

    /// A cloneable emit handle for use inside callbacks.
    pub fn emitter(&self) -> Emitter {
        Emitter {
            core: Arc::downgrade(self.core),
        }
    }

    /// Requests graceful shutdown of the plant.
    pub fn shutdown(&self) {
        self.core.request_shutdown();
    }

    fn builder<W: WordSet>(&self, source: Source) -> ReactionBuilder<W> {
        ReactionBuilder::new(self.core.clone(), self.scope.clone(), source)
    }
}

/// Cheap, cloneable emit handle captured by callbacks.
///
/// Holds the plant weakly: once the plant is gone, emits become
/// silent no-ops and [`emit_net`](Self::emit_net) reports
/// [`NetError::NoTransport`].
#[derive(Clone)]
pub struct Emitter {
    core: Weak<Core>,
}

impl Emitter {
    /// Emits a value locally. Fire-and-forget.
    pub fn emit<T: Send + Sync + 'static>(&self, value: T) {
        if let Some(core) = self.core.upgrade() {
            core.emit(value);
        }
    }

    /// Synchronous inline dispatch on the calling thread.
    pub fn emit_direct<T: Send + Sync + 'static>(&self, value: T) {
        if let Some(core) = self.core.upgrade() {
            core.emit_direct(value);
        }
    }

    /// Hands the value to the network transport.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] when the plant or transport is gone, or
    /// encoding/sending fails.
    pub fn emit_net<T: Serialize + 'static>(&self, value: &T) -> Result<(), NetError> {
        match self.core.upgrade() {
            Some(core) => core.emit_net(value),
            None => Err(NetError::NoTransport),
        }
    }

    /// The latest stored value of `T`, when any.
    #[must_use]
    pub fn latest<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.core.upgrade().and_then(|core| core.latest())
    }

    /// Requests graceful shutdown of the plant.
    pub fn shutdown(&self) {
        if let Some(core) = self.core.upgrade() {
            core.request_shutdown();
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}
