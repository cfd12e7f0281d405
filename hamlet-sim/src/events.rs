//! Render events emitted by the world.
//!
//! The world never writes to a terminal. It queues [`SimEvent`]s, and the
//! caller drains them into an [`EventSink`].

use std::fmt;
use std::io::{self, Write};

use hamlet_core::{CharacterId, MemoryRecord};
use serde::{Deserialize, Serialize};

/// How the player is currently driving the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Player picks each turn for the focused character.
    #[default]
    Interactive,
    /// Everyone acts on their own in observe-all rounds.
    Observation,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interactive => "interactive",
            Self::Observation => "observation",
        })
    }
}

/// Something the presentation layer should show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// Narration and world descriptions.
    SystemMessage {
        /// Text to show.
        text: String,
    },
    /// A character says something.
    Dialogue {
        /// Display name of the speaker.
        speaker: String,
        /// What was said.
        text: String,
    },
    /// One remembered record, shown on request.
    MemoryView {
        /// Whose memory it is.
        character: CharacterId,
        /// The record.
        record: MemoryRecord,
    },
    /// A failure the player should see.
    ErrorMessage {
        /// Description of the failure.
        text: String,
    },
    /// Status bar contents.
    StatusSnapshot {
        /// Display name of the focused room.
        location: String,
        /// People in that room.
        occupant_count: usize,
        /// Current mode.
        mode: Mode,
    },
}

impl SimEvent {
    /// Shorthand for a [`SimEvent::SystemMessage`].
    pub fn system(text: impl Into<String>) -> Self {
        Self::SystemMessage { text: text.into() }
    }

    /// Shorthand for a [`SimEvent::ErrorMessage`].
    pub fn error(text: impl Into<String>) -> Self {
        Self::ErrorMessage { text: text.into() }
    }
}

/// Consumer of render events.
pub trait EventSink {
    /// Present one event.
    ///
    /// # Errors
    /// Returns an I/O error if the output cannot be written.
    fn render(&mut self, event: &SimEvent) -> io::Result<()>;

    /// Present events in order.
    ///
    /// # Errors
    /// Stops at the first I/O error.
    fn render_all(&mut self, events: &[SimEvent]) -> io::Result<()> {
        for event in events {
            self.render(event)?;
        }
        Ok(())
    }
}

/// Plain-text renderer for terminals and logs.
#[derive(Debug)]
pub struct ConsoleRenderer<W> {
    out: W,
}

impl<W: Write> ConsoleRenderer<W> {
    /// Render into `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for ConsoleRenderer<W> {
    fn render(&mut self, event: &SimEvent) -> io::Result<()> {
        match event {
            SimEvent::SystemMessage { text } => writeln!(self.out, "[system] {text}"),
            SimEvent::Dialogue { speaker, text } => writeln!(self.out, "{speaker}: {text}"),
            SimEvent::MemoryView { record, .. } => writeln!(
                self.out,
                "  [{}] ({}, importance {}) {}",
                record.created_at.format("%H:%M"),
                record.kind,
                record.importance,
                record.content
            ),
            SimEvent::ErrorMessage { text } => writeln!(self.out, "[error] {text}"),
            SimEvent::StatusSnapshot {
                location,
                occupant_count,
                mode,
            } => writeln!(self.out, "-- {location} | {occupant_count} present | {mode} mode --"),
        }
    }
}

/// One JSON object per line, for piping into other tools.
#[derive(Debug)]
pub struct JsonLinesRenderer<W> {
    out: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    /// Render into `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLinesRenderer<W> {
    fn render(&mut self, event: &SimEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")
    }
}
