//! Memory record types and the per-character [`MemoryStream`].
//!
//! A record is immutable once the stream has stamped it. Callers describe
//! what happened with a [`NewMemory`]; the stream assigns `created_at` and
//! hands back the stored [`MemoryRecord`].

pub mod stream;

pub use stream::MemoryStream;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::CharacterId;

/// What kind of experience a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// The character went from one room to another.
    Movement,
    /// Something the character did.
    Action,
    /// A conversation the character took part in.
    Dialogue,
    /// Something the character noticed about its surroundings.
    Observation,
    /// Free-form record supplied by the player.
    Custom,
}

impl MemoryKind {
    /// Lowercase label, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movement => "movement",
            Self::Action => "action",
            Self::Dialogue => "dialogue",
            Self::Observation => "observation",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retention priority of a record, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Importance(u8);

impl Importance {
    /// Lowest importance.
    pub const TRIVIAL: Self = Self(1);
    /// Noticing the surroundings.
    pub const OBSERVATION: Self = Self(2);
    /// Movement and everyday actions.
    pub const ROUTINE: Self = Self(3);
    /// Conversations; the highest tier.
    pub const DIALOGUE: Self = Self(5);
    /// Smallest valid value.
    pub const MIN: u8 = 1;
    /// Largest valid value.
    pub const MAX: u8 = 5;

    /// Validate a raw importance. Returns `None` outside `1..=5`.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Clamp any integer into the valid range.
    #[must_use]
    pub fn saturating(value: i64) -> Self {
        let clamped = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Self(u8::try_from(clamped).unwrap_or(Self::MAX))
    }

    /// Raw value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Importance {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("importance {value} outside 1..=5"))
    }
}

impl From<Importance> for u8 {
    fn from(value: Importance) -> Self {
        value.0
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A memory as submitted by a caller, before the stream timestamps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemory {
    /// What kind of experience this is.
    pub kind: MemoryKind,
    /// Natural-language description.
    pub content: String,
    /// Retention priority.
    pub importance: Importance,
    /// Characters this memory is about (may be empty).
    pub related_character_ids: BTreeSet<CharacterId>,
}

impl NewMemory {
    /// Create a memory with no related characters.
    #[must_use]
    pub fn new(kind: MemoryKind, content: impl Into<String>, importance: Importance) -> Self {
        Self {
            kind,
            content: content.into(),
            importance,
            related_character_ids: BTreeSet::new(),
        }
    }

    /// Mark another character as involved.
    #[must_use]
    pub fn about(mut self, id: CharacterId) -> Self {
        self.related_character_ids.insert(id);
        self
    }

    /// Stamp the memory, producing the stored record.
    #[must_use]
    pub fn stamped(self, created_at: DateTime<Utc>) -> MemoryRecord {
        MemoryRecord {
            kind: self.kind,
            content: self.content,
            importance: self.importance,
            created_at,
            related_character_ids: self.related_character_ids,
        }
    }
}

/// A stored, timestamped memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// What kind of experience this is.
    pub kind: MemoryKind,
    /// Natural-language description.
    pub content: String,
    /// Retention priority.
    pub importance: Importance,
    /// When the stream accepted the record.
    pub created_at: DateTime<Utc>,
    /// Characters this memory is about. Always present, possibly empty.
    #[serde(default)]
    pub related_character_ids: BTreeSet<CharacterId>,
}

impl MemoryRecord {
    /// Whether `id` is among the related characters.
    #[must_use]
    pub fn involves(&self, id: &CharacterId) -> bool {
        self.related_character_ids.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_rejects_out_of_range() {
        assert!(Importance::new(0).is_none());
        assert!(Importance::new(6).is_none());
        assert_eq!(Importance::new(4).map(Importance::get), Some(4));
    }

    #[test]
    fn importance_saturates() {
        assert_eq!(Importance::saturating(-40), Importance::TRIVIAL);
        assert_eq!(Importance::saturating(99), Importance::DIALOGUE);
        assert_eq!(Importance::saturating(3), Importance::ROUTINE);
    }

    #[test]
    fn importance_deserialization_is_validated() {
        assert!(serde_json::from_str::<Importance>("7").is_err());
        let ok: Importance = serde_json::from_str("2").expect("valid importance");
        assert_eq!(ok, Importance::OBSERVATION);
    }

    #[test]
    fn record_serializes_with_public_field_names() {
        let record = NewMemory::new(MemoryKind::Movement, "walked to the park", Importance::ROUTINE)
            .stamped(Utc::now());
        let value = serde_json::to_value(&record).expect("serialize");
        let obj = value.as_object().expect("object");
        for field in ["kind", "content", "importance", "created_at", "related_character_ids"] {
            assert!(obj.contains_key(field), "missing field {field}");
        }
        assert_eq!(obj["kind"], "movement");
        assert_eq!(obj["related_character_ids"], serde_json::json!([]));
    }
}
