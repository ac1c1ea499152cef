//! Core vocabulary types for the fission runtime.
//!
//! This crate is the stable bottom layer of the fission workspace:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  fission-types  : ReactionId, PlantId, SyncKey, Priority,   │
//! │                   ErrorCode                     ◄── HERE    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  fission-runtime: DataStore, EventBus, Scheduler,           │
//! │                   PowerPlant, DSL words                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in here schedules, stores, or dispatches. These are the
//! identifiers and enums that every other fission crate (and user code
//! that inspects diagnostics) shares.
//!
//! # Contents
//!
//! - [`ReactionId`] — runtime-unique ascending identifier for a bound
//!   reaction.
//! - [`PlantId`] — identity of one runtime instance, used to tag
//!   network frames.
//! - [`SyncKey`] — a named serialization domain; at most one reaction
//!   task per key executes at a time.
//! - [`Priority`] — the five-level scheduling ladder.
//! - [`ErrorCode`] — the unified machine-readable error contract, plus
//!   the [`assert_error_code`]/[`assert_error_codes`] test helpers.

mod error;
mod id;
mod priority;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{PlantId, ReactionId, SyncKey};
pub use priority::Priority;
