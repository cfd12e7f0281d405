//! Turn requests and their outcomes.

use hamlet_core::{CharacterId, RoomId};
use serde::{Deserialize, Serialize};

/// One discrete step of the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "turn", rename_all = "snake_case")]
pub enum Turn {
    /// Walk to an adjacent room.
    Move {
        /// Who moves.
        character: CharacterId,
        /// Where to.
        to: RoomId,
    },
    /// Say something to someone in the same room.
    Speak {
        /// Who talks.
        speaker: CharacterId,
        /// Who is addressed.
        listener: CharacterId,
    },
    /// Do something, driven by recent memories.
    Act {
        /// Who acts.
        character: CharacterId,
    },
    /// Look around the current room.
    Observe {
        /// Who looks.
        character: CharacterId,
    },
    /// Store a player-supplied memory.
    Remember {
        /// Whose memory.
        character: CharacterId,
        /// What to remember.
        content: String,
        /// Clamped into `1..=5`.
        importance: i64,
    },
    /// Everyone acts, maybe talks, maybe moves.
    ObserveAll,
}

/// Generated text plus whether it is a failure placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generated {
    /// The text stored and shown.
    pub text: String,
    /// `true` when generation failed and `text` is a placeholder.
    pub degraded: bool,
}

/// Result of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Who spoke.
    pub speaker: CharacterId,
    /// Who listened.
    pub listener: CharacterId,
    /// What was said.
    pub line: Generated,
    /// Relationship change applied to both sides.
    pub delta: i32,
    /// Speaker's relationship to the listener afterwards.
    pub speaker_relationship: u8,
    /// Listener's relationship to the speaker afterwards.
    pub listener_relationship: u8,
}

/// What an accepted turn did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// A character changed rooms.
    Moved {
        /// Who moved.
        character: CharacterId,
        /// Previous room.
        from: RoomId,
        /// New room.
        to: RoomId,
    },
    /// A conversation happened.
    Spoke(Utterance),
    /// A character did something.
    Acted {
        /// Who acted.
        character: CharacterId,
        /// What they did.
        action: Generated,
    },
    /// A character looked around.
    Observed {
        /// Who looked.
        character: CharacterId,
        /// Their impression.
        observation: Generated,
    },
    /// A custom memory was stored.
    Remembered {
        /// Whose memory.
        character: CharacterId,
    },
    /// An observe-all round finished.
    ObservedAll {
        /// Characters that took a turn.
        characters: usize,
    },
}
