//! Characters: identity, mood, energy, relationships and their memory.
//!
//! A [`Character`] owns exactly one [`MemoryStream`]. The stream is only
//! reachable mutably through [`Character::record_memory`] and
//! [`Character::prune_memories`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::{MemoryRecord, MemoryStream, NewMemory};
use crate::mood::{self, Mood};
use crate::types::{CharacterId, Period, RoomId};

/// Relationship value assumed for characters never met.
pub const NEUTRAL_RELATIONSHIP: u8 = 50;
/// Relationship value above which two characters will interact.
pub const INTERACTION_THRESHOLD: u8 = 20;
/// Upper bound for relationship values.
pub const MAX_RELATIONSHIP: u8 = 100;
/// Upper bound for energy.
pub const MAX_ENERGY: u8 = 100;

/// Immutable character definition as read from the world configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    /// Unique ID.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Job or role in town.
    pub occupation: String,
    /// Short personality description.
    pub personality: String,
    /// Backstory.
    #[serde(default)]
    pub background: String,
    /// Hobbies and interests.
    #[serde(default)]
    pub interests: BTreeSet<String>,
    /// Room the character starts in.
    pub initial_location: RoomId,
    /// What the character usually does in each period.
    #[serde(default)]
    pub daily_routine: BTreeMap<Period, String>,
}

/// A simulated town resident.
///
/// Only built through [`Character::from_definition`], so energy and
/// relationships always start inside their bounds:
///
/// ```compile_fail
/// let c: hamlet_core::Character = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Character {
    /// Unique ID.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Job or role in town.
    pub occupation: String,
    /// Short personality description.
    pub personality: String,
    /// Backstory.
    pub background: String,
    /// Hobbies and interests.
    pub interests: BTreeSet<String>,
    /// Room the character is in.
    pub current_location: RoomId,
    /// What the character usually does in each period.
    pub daily_routine: BTreeMap<Period, String>,
    mood: Mood,
    energy: u8,
    relationships: HashMap<CharacterId, u8>,
    #[serde(skip)]
    memory: MemoryStream,
}

impl Character {
    /// Build a fresh character: calm, full energy, no relationships, empty memory.
    #[must_use]
    pub fn from_definition(definition: CharacterDefinition, memory_capacity: usize) -> Self {
        Self {
            id: definition.id,
            name: definition.name,
            age: definition.age,
            occupation: definition.occupation,
            personality: definition.personality,
            background: definition.background,
            interests: definition.interests,
            current_location: definition.initial_location,
            daily_routine: definition.daily_routine,
            mood: Mood::default(),
            energy: MAX_ENERGY,
            relationships: HashMap::new(),
            memory: MemoryStream::new(memory_capacity),
        }
    }

    /// One-line description used as the generation persona.
    #[must_use]
    pub fn persona(&self) -> String {
        format!(
            "{} is a {}-year-old {}. Personality: {}.",
            self.name, self.age, self.occupation, self.personality
        )
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    /// Read-only view of the memory stream.
    #[must_use]
    pub fn memories(&self) -> &MemoryStream {
        &self.memory
    }

    /// Store a memory stamped at `now`. Returns records evicted to make room.
    pub fn record_memory(&mut self, memory: NewMemory, now: DateTime<Utc>) -> Vec<MemoryRecord> {
        self.memory.add(memory, now)
    }

    /// Forget everything created at or before `now - older_than`.
    pub fn prune_memories(&mut self, older_than: Duration, now: DateTime<Utc>) -> usize {
        self.memory.prune(older_than, now)
    }

    /// Replace the memory stream wholesale, e.g. when restoring a save.
    pub fn restore_memories(&mut self, stream: MemoryStream) {
        self.memory = stream;
    }

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    /// Affinity toward `other`, defaulting to [`NEUTRAL_RELATIONSHIP`].
    #[must_use]
    pub fn relationship_with(&self, other: &CharacterId) -> u8 {
        self.relationships
            .get(other)
            .copied()
            .unwrap_or(NEUTRAL_RELATIONSHIP)
    }

    /// All explicitly stored relationships.
    #[must_use]
    pub fn relationships(&self) -> &HashMap<CharacterId, u8> {
        &self.relationships
    }

    /// Shift affinity toward `other` by `delta`, clamped to `0..=100`.
    ///
    /// Only this side is updated. Returns the new value.
    pub fn update_relationship(&mut self, other: &CharacterId, delta: i32) -> u8 {
        let current = i64::from(self.relationship_with(other));
        let next = (current + i64::from(delta)).clamp(0, i64::from(MAX_RELATIONSHIP));
        let next = u8::try_from(next).unwrap_or(MAX_RELATIONSHIP);
        self.relationships.insert(other.clone(), next);
        next
    }

    /// Whether the relationship is good enough to start an interaction.
    #[must_use]
    pub fn can_interact_with(&self, other: &CharacterId) -> bool {
        self.relationship_with(other) > INTERACTION_THRESHOLD
    }

    // ------------------------------------------------------------------
    // Energy
    // ------------------------------------------------------------------

    /// Current energy in `0..=100`.
    #[must_use]
    pub fn energy(&self) -> u8 {
        self.energy
    }

    /// Spend `amount` energy if available. Energy is untouched on failure.
    pub fn consume_energy(&mut self, amount: u8) -> bool {
        if self.energy >= amount {
            self.energy -= amount;
            true
        } else {
            false
        }
    }

    /// Recover `amount` energy, capped at 100.
    pub fn rest(&mut self, amount: u8) {
        self.energy = self.energy.saturating_add(amount).min(MAX_ENERGY);
    }

    // ------------------------------------------------------------------
    // Mood and routine
    // ------------------------------------------------------------------

    /// Current mood.
    #[must_use]
    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Recompute mood from `recent_events`. See [`mood::assess`].
    pub fn update_mood<'a, I>(&mut self, recent_events: I) -> Mood
    where
        I: IntoIterator<Item = &'a MemoryRecord>,
    {
        self.mood = mood::assess(recent_events);
        self.mood
    }

    /// Time-of-day bucket for `now`.
    #[must_use]
    pub fn current_period(&self, now: &DateTime<Utc>) -> Period {
        Period::at(now)
    }

    /// Routine text for the period containing `now`, if one is configured.
    #[must_use]
    pub fn current_routine(&self, now: &DateTime<Utc>) -> Option<&str> {
        self.daily_routine
            .get(&self.current_period(now))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Importance, MemoryKind};
    use chrono::TimeZone;

    pub(crate) fn definition(id: &str) -> CharacterDefinition {
        CharacterDefinition {
            id: CharacterId::new(id),
            name: id.to_uppercase(),
            age: 30,
            occupation: "librarian".into(),
            personality: "quiet and curious".into(),
            background: String::new(),
            interests: BTreeSet::from(["books".to_string()]),
            initial_location: RoomId::new("library"),
            daily_routine: BTreeMap::from([
                (Period::Morning, "opens the library".to_string()),
                (Period::Afternoon, "shelves returns".to_string()),
                (Period::Evening, "reads at home".to_string()),
            ]),
        }
    }

    #[test]
    fn fresh_character_defaults() {
        let c = Character::from_definition(definition("alice"), 10);
        assert_eq!(c.energy(), 100);
        assert_eq!(c.mood(), Mood::Calm);
        assert_eq!(c.relationship_with(&CharacterId::new("bob")), NEUTRAL_RELATIONSHIP);
        assert_eq!(c.memories().capacity(), 10);
        assert_eq!(c.current_location, RoomId::new("library"));
    }

    #[test]
    fn relationship_clamps_both_ways() {
        let mut c = Character::from_definition(definition("alice"), 10);
        let bob = CharacterId::new("bob");
        assert_eq!(c.update_relationship(&bob, 500), 100);
        assert_eq!(c.update_relationship(&bob, i32::MIN), 0);
        assert_eq!(c.update_relationship(&bob, 15), 15);
    }

    #[test]
    fn interaction_threshold_is_strict() {
        let mut c = Character::from_definition(definition("alice"), 10);
        let bob = CharacterId::new("bob");
        c.update_relationship(&bob, -30);
        assert_eq!(c.relationship_with(&bob), 20);
        assert!(!c.can_interact_with(&bob));
        c.update_relationship(&bob, 1);
        assert!(c.can_interact_with(&bob));
    }

    #[test]
    fn energy_bounds() {
        let mut c = Character::from_definition(definition("alice"), 10);
        assert!(c.consume_energy(60));
        assert!(!c.consume_energy(41));
        assert_eq!(c.energy(), 40);
        c.rest(250);
        assert_eq!(c.energy(), 100);
    }

    #[test]
    fn routine_follows_period() {
        let c = Character::from_definition(definition("alice"), 10);
        let morning = Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).single().expect("date");
        let night = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).single().expect("date");
        assert_eq!(c.current_routine(&morning), Some("opens the library"));
        assert_eq!(c.current_routine(&night), Some("reads at home"));
        assert_eq!(c.current_period(&morning), Period::Morning);
        assert_eq!(c.current_period(&night), Period::Evening);
    }

    #[test]
    fn record_memory_goes_through_stream() {
        let mut c = Character::from_definition(definition("alice"), 2);
        let now = Utc::now();
        for i in 0..3 {
            c.record_memory(
                NewMemory::new(MemoryKind::Action, format!("act {i}"), Importance::ROUTINE),
                now,
            );
        }
        assert_eq!(c.memories().len(), 2);
    }

    #[test]
    fn stored_levels_in_a_definition_are_ignored() {
        let json = r#"{
            "id": "carol",
            "name": "Carol",
            "age": 41,
            "occupation": "baker",
            "personality": "cheerful",
            "initial_location": "bakery",
            "energy": 250,
            "relationships": {"bob": 200}
        }"#;
        let def: CharacterDefinition = serde_json::from_str(json).expect("parse");
        let c = Character::from_definition(def, 10);
        assert_eq!(c.energy(), MAX_ENERGY);
        assert!(c.relationships().is_empty());
        assert_eq!(c.relationship_with(&CharacterId::new("bob")), NEUTRAL_RELATIONSHIP);
    }

    #[test]
    fn definition_parses_from_json() {
        let json = r#"{
            "id": "carol",
            "name": "Carol",
            "age": 41,
            "occupation": "baker",
            "personality": "cheerful",
            "interests": ["bread", "gossip"],
            "initial_location": "bakery",
            "daily_routine": {"morning": "bakes bread", "evening": "closes shop"}
        }"#;
        let def: CharacterDefinition = serde_json::from_str(json).expect("parse");
        assert_eq!(def.daily_routine.get(&Period::Morning).map(String::as_str), Some("bakes bread"));
        assert!(def.background.is_empty());
        assert_eq!(def.interests.len(), 2);
    }
}
