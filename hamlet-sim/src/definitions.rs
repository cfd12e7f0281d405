//! Loading the immutable world definitions.
//!
//! Two JSON files describe a town:
//!
//! ```text
//! characters.json   {"characters": [CharacterDefinition, ...]}
//! rooms.json        {"rooms": [RoomDefinition, ...]}
//! ```

use std::path::Path;

use hamlet_core::{CharacterDefinition, RoomDefinition};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SimError};

/// File name of the character list inside a world directory.
pub const CHARACTERS_FILE: &str = "characters.json";
/// File name of the room list inside a world directory.
pub const ROOMS_FILE: &str = "rooms.json";

#[derive(Debug, Deserialize)]
struct CharactersFile {
    characters: Vec<CharacterDefinition>,
}

#[derive(Debug, Deserialize)]
struct RoomsFile {
    rooms: Vec<RoomDefinition>,
}

/// Everything needed to build a [`World`](crate::World).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldDefinition {
    /// Residents, in definition order.
    pub characters: Vec<CharacterDefinition>,
    /// Places, in definition order.
    pub rooms: Vec<RoomDefinition>,
}

impl WorldDefinition {
    /// Parse the two JSON documents.
    ///
    /// # Errors
    /// Returns [`SimError::Definition`] naming the document that failed.
    pub fn from_json(characters_json: &str, rooms_json: &str) -> Result<Self> {
        let characters: CharactersFile =
            serde_json::from_str(characters_json).map_err(|e| SimError::Definition {
                file: CHARACTERS_FILE.into(),
                message: e.to_string(),
            })?;
        let rooms: RoomsFile = serde_json::from_str(rooms_json).map_err(|e| SimError::Definition {
            file: ROOMS_FILE.into(),
            message: e.to_string(),
        })?;
        Ok(Self {
            characters: characters.characters,
            rooms: rooms.rooms,
        })
    }

    /// Read `characters.json` and `rooms.json` from `dir`.
    ///
    /// # Errors
    /// Returns [`SimError::Io`] if a file is missing, or
    /// [`SimError::Definition`] if one does not parse.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let characters = std::fs::read_to_string(dir.join(CHARACTERS_FILE))?;
        let rooms = std::fs::read_to_string(dir.join(ROOMS_FILE))?;
        let definition = Self::from_json(&characters, &rooms)?;
        info!(
            dir = %dir.display(),
            characters = definition.characters.len(),
            rooms = definition.rooms.len(),
            "Loaded world definition"
        );
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARACTERS: &str = r#"{"characters": [{
        "id": "alice", "name": "Alice", "age": 30, "occupation": "librarian",
        "personality": "quiet", "initial_location": "library"
    }]}"#;

    const ROOMS: &str = r#"{"rooms": [{
        "id": "library", "name": "Library", "description": "Rows of books.",
        "connected_to": ["square"], "items": ["bookshelf"],
        "ambient_sounds": ["pages turning"],
        "time_features": {"morning": "Dust drifts in the sunlight."}
    }]}"#;

    #[test]
    fn parses_both_documents() {
        let def = WorldDefinition::from_json(CHARACTERS, ROOMS).expect("parse");
        assert_eq!(def.characters[0].name, "Alice");
        assert_eq!(def.rooms[0].items, ["bookshelf"]);
    }

    #[test]
    fn reports_which_file_failed() {
        let err = WorldDefinition::from_json(CHARACTERS, "{\"rooms\": 3}").unwrap_err();
        assert!(matches!(err, SimError::Definition { ref file, .. } if file == ROOMS_FILE));
    }

    #[test]
    fn reads_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CHARACTERS_FILE), CHARACTERS).expect("write");
        std::fs::write(dir.path().join(ROOMS_FILE), ROOMS).expect("write");
        let def = WorldDefinition::from_dir(dir.path()).expect("load");
        assert_eq!(def.characters.len(), 1);
        assert_eq!(def.rooms.len(), 1);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err = WorldDefinition::from_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
