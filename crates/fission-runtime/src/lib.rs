//! fission-runtime — an in-process reactive runtime.
//!
//! Independent modules ("reactors") bind callbacks ("reactions") that
//! fire when typed values are emitted into the runtime. The runtime —
//! the [`PowerPlant`] — owns a pool of worker threads and dispatches
//! callbacks onto them according to the declarative modifiers chosen
//! at bind time: trigger sets, auxiliary joins, periodic timers, IO
//! readiness, priorities, sync groups, single-flight de-duplication,
//! one-shot reactions, and startup/shutdown hooks.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  fission-types  : ReactionId, PlantId, SyncKey, Priority,   │
//! │                   ErrorCode                                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  fission-runtime (THIS CRATE)                               │
//! │                                                             │
//! │  dsl/        : Trigger, With, Optional, Last, Raw, builder  │
//! │  reactor     : Reactor trait, ReactorContext, Emitter       │
//! │  powerplant  : PowerPlant, lifecycle, emission handlers     │
//! │  handle      : ReactionHandle                               │
//! │  io / net    : backend contracts (poll loop, transport)     │
//! │  config      : PlantConfig (TOML, layered merge)            │
//! │  diag        : counters + journal                           │
//! │                                                             │
//! │  internal: store (latest/history/transient), bus,           │
//! │            registry, scheduler, chronometer                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # A minimal plant
//!
//! ```
//! use fission_runtime::dsl::Trigger;
//! use fission_runtime::{PlantConfig, PowerPlant};
//! use std::sync::Arc;
//!
//! struct Step(u32);
//!
//! let plant = PowerPlant::new(PlantConfig {
//!     threads: 2,
//!     ..PlantConfig::default()
//! })
//! .unwrap();
//!
//! let ctx = plant.scope("demo");
//! let emitter = ctx.emitter();
//! ctx.on::<(Trigger<Step>,)>()
//!     .label("stop-at-three")
//!     .then(move |step: Arc<Step>| {
//!         if step.0 >= 3 {
//!             emitter.shutdown();
//!         } else {
//!             emitter.emit(Step(step.0 + 1));
//!         }
//!     })
//!     .unwrap();
//!
//! plant.emit(Step(0));
//! plant.start(); // blocks until the callback requests shutdown
//! ```
//!
//! # Guarantees
//!
//! - For one emitted value, the set of reactions dispatched is the
//!   subscriber snapshot at emit time, iterated in **bind order**.
//! - Within one priority level tasks execute FIFO by creation
//!   sequence; across levels, higher priority always first.
//! - At most one task per [`SyncKey`] executes at any instant.
//! - A `single` reaction never has more than one task queued or
//!   running; excess emits are dropped at creation time.
//! - Callback panics are isolated, counted, and journaled; workers
//!   survive them.
//!
//! There is no cross-type ordering guarantee, no persistence, and no
//! preemption: a callback runs to completion on its worker.

pub mod config;
pub mod diag;
pub mod dsl;
pub mod error;
pub mod handle;
pub mod io;
pub mod net;
pub mod powerplant;
pub mod reactor;

mod bus;
mod reaction;
mod registry;
mod scheduler;
mod store;
mod time;

pub use config::{LogLevel, PlantConfig};
pub use error::BindError;
pub use handle::ReactionHandle;
pub use powerplant::{PowerPlant, PowerPlantBuilder};
pub use reactor::{Emitter, Reactor, ReactorContext};

// Re-export the vocabulary layer for convenience.
pub use fission_types as types;
pub use fission_types::{PlantId, Priority, ReactionId, SyncKey};
