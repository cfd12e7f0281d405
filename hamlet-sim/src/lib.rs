//! # hamlet-sim: world orchestration
//!
//! Owns every [`Character`](hamlet_core::Character) and
//! [`Room`](hamlet_core::Room) in ID-keyed maps and advances them one turn
//! at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 World                        │
//! │   characters: BTreeMap<CharacterId, _>       │
//! │   rooms:      BTreeMap<RoomId, _>            │
//! │        │ turns                ▲ text         │
//! │        ▼                      │              │
//! │   dialogue (prompts) ──► Generator (llm)     │
//! │        │                                     │
//! │        ▼                                     │
//! │   outbox: Vec<SimEvent> ──► EventSink        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `definitions`: loading characters and rooms from JSON
//! - `dialogue`: prompt assembly from memories and surroundings
//! - `events`: render events and the console / JSON-lines sinks
//! - `turns`: turn requests and outcomes
//! - `world`: the state container and turn engine

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod definitions;
pub mod dialogue;
pub mod error;
pub mod events;
pub mod turns;
pub mod world;

pub use definitions::WorldDefinition;
pub use error::{SimError, ValidationError};
pub use events::{ConsoleRenderer, EventSink, JsonLinesRenderer, Mode, SimEvent};
pub use turns::{Generated, Turn, TurnOutcome, Utterance};
pub use world::World;
