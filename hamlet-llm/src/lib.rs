//! # hamlet-llm: the text-generation boundary
//!
//! Every piece of generated text in hamlet goes through the [`Generator`]
//! trait:
//!   - [`ChatClient`] calls any OpenAI-compatible chat-completion endpoint
//!     (DeepSeek by default) with a fixed timeout and optional retries.
//!   - [`ScriptedGenerator`] replays canned replies for tests and offline
//!     runs.
//!
//! Calls are synchronous. Failures come back as [`GenerationError`] values
//! so the orchestrator can substitute degraded content instead of aborting
//! a turn.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod prompt;
pub mod scripted;
pub mod types;

pub use client::ChatClient;
pub use error::GenerationError;
pub use scripted::{Fallback, ScriptedGenerator};
pub use types::{GenerationRequest, Generator};
