//! # hamlet core library
//!
//! State model for a small simulated town. Every [`Character`] owns a
//! bounded [`MemoryStream`] of timestamped records, a mood, an energy pool
//! and a relationship map; every [`Room`] tracks who is inside it and
//! derives its ambient state from that occupancy.
//!
//! Nothing in this crate talks to the text-generation service or to a
//! terminal. The orchestrator in `hamlet-sim` reads these structures to
//! build prompts and writes the generated text back as memory records.
//!
//! ## Retention
//!
//! Two independent mechanisms keep a stream small:
//! - **Capacity eviction** runs on every insert and drops the least
//!   important record (oldest first among ties).
//! - **Age pruning** is caller-triggered and drops everything older than a
//!   given duration.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod character;
pub mod config;
pub mod error;
pub mod eviction;
pub mod memory;
pub mod mood;
pub mod room;
pub mod snapshot;
pub mod types;

pub use character::{Character, CharacterDefinition};
pub use config::HamletConfig;
pub use error::HamletError;
pub use memory::{Importance, MemoryKind, MemoryRecord, MemoryStream, NewMemory};
pub use mood::Mood;
pub use room::{Lighting, NoiseLevel, Room, RoomDefinition, RoomState};
pub use types::*;
