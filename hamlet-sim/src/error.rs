//! Error types for the orchestrator.

use hamlet_core::{CharacterId, HamletError, RoomId};
use thiserror::Error;

/// Why a turn was refused. Nothing changes when a turn is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No character with this ID.
    #[error("unknown character '{0}'")]
    UnknownCharacter(CharacterId),

    /// No room with this ID.
    #[error("unknown room '{0}'")]
    UnknownRoom(RoomId),

    /// The target room is not reachable from where the character stands.
    #[error("'{from}' has no passage to '{to}'")]
    NotConnected {
        /// Current room.
        from: RoomId,
        /// Requested room.
        to: RoomId,
    },

    /// Speaker and listener are in different rooms.
    #[error("'{speaker}' and '{listener}' are not in the same room")]
    NotCoLocated {
        /// Who wanted to talk.
        speaker: CharacterId,
        /// Who they wanted to talk to.
        listener: CharacterId,
    },

    /// A character tried to talk to itself.
    #[error("'{0}' cannot hold a conversation with itself")]
    SelfConversation(CharacterId),
}

/// Failures while building or saving a world.
#[derive(Debug, Error)]
pub enum SimError {
    /// Two character definitions share an ID.
    #[error("duplicate character id '{0}'")]
    DuplicateCharacter(CharacterId),

    /// Two room definitions share an ID.
    #[error("duplicate room id '{0}'")]
    DuplicateRoom(RoomId),

    /// A character starts in a room that is not defined.
    #[error("character '{character}' starts in unknown room '{room}'")]
    UnknownInitialLocation {
        /// The misplaced character.
        character: CharacterId,
        /// The missing room.
        room: RoomId,
    },

    /// A definitions file could not be parsed.
    #[error("invalid world definition in {file}: {message}")]
    Definition {
        /// File (or source) that failed.
        file: String,
        /// Parser message.
        message: String,
    },

    /// Error from the core library (config, snapshots, I/O).
    #[error(transparent)]
    Core(#[from] HamletError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SimError>;
