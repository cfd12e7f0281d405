//! Rooms: graph nodes with occupancy-derived ambient state.
//!
//! `occupants` and the derived parts of [`RoomState`] only change through
//! [`Room::add_occupant`] and [`Room::remove_occupant`], which recompute the
//! state from the occupant count every time.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CharacterId, Period, RoomId};

/// Temperature of an empty room, in °C.
pub const BASE_TEMPERATURE: f32 = 22.0;
/// Ceiling for occupancy warming, in °C.
pub const MAX_TEMPERATURE: f32 = 26.0;
/// Warming per occupant, in °C.
pub const WARMING_PER_OCCUPANT: f32 = 0.5;
/// Occupant count at which a room becomes noisy.
pub const NOISY_OCCUPANCY: usize = 3;

/// Immutable room definition as read from the world configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDefinition {
    /// Unique ID.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Static description.
    pub description: String,
    /// Rooms reachable in one move. Directed as stored.
    #[serde(default)]
    pub connected_to: BTreeSet<RoomId>,
    /// Things in the room that can be inspected.
    #[serde(default)]
    pub items: Vec<String>,
    /// Sounds heard during the day, most characteristic first.
    #[serde(default)]
    pub ambient_sounds: Vec<String>,
    /// Extra description per period.
    #[serde(default)]
    pub time_features: BTreeMap<Period, String>,
}

/// Noise derived from occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseLevel {
    /// Nobody inside.
    #[default]
    Quiet,
    /// One or two people.
    Normal,
    /// Three or more.
    Noisy,
}

impl NoiseLevel {
    /// Noise for a given occupant count.
    #[must_use]
    pub fn for_occupancy(count: usize) -> Self {
        match count {
            0 => Self::Quiet,
            n if n < NOISY_OCCUPANCY => Self::Normal,
            _ => Self::Noisy,
        }
    }
}

impl fmt::Display for NoiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quiet => "quiet",
            Self::Normal => "normal",
            Self::Noisy => "noisy",
        })
    }
}

/// Lighting of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lighting {
    /// Initial lighting before the first housekeeping tick.
    #[default]
    Normal,
    /// Daylight.
    Bright,
    /// Night.
    Dim,
}

impl Lighting {
    /// Daylight between 06:00 and 18:00, dim otherwise.
    #[must_use]
    pub fn for_hour(hour: u32) -> Self {
        if (6..18).contains(&hour) {
            Self::Bright
        } else {
            Self::Dim
        }
    }
}

impl fmt::Display for Lighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Bright => "bright",
            Self::Dim => "dim",
        })
    }
}

/// Mutable ambient state of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    /// Current lighting.
    pub lighting: Lighting,
    /// Temperature in °C, derived from occupancy.
    pub temperature: f32,
    /// Cleanliness in `0..=10`.
    pub cleanliness: u8,
    /// Noise, derived from occupancy.
    pub noise_level: NoiseLevel,
    /// Free-form mood of the place.
    pub atmosphere: String,
}

impl Default for RoomState {
    fn default() -> Self {
        Self {
            lighting: Lighting::Normal,
            temperature: BASE_TEMPERATURE,
            cleanliness: 10,
            noise_level: NoiseLevel::Quiet,
            atmosphere: "normal".to_string(),
        }
    }
}

/// A place in town.
///
/// Only built through [`Room::from_definition`], so occupancy and the
/// derived state cannot be loaded from outside:
///
/// ```compile_fail
/// let room: hamlet_core::Room = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    /// Unique ID.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Static description.
    pub description: String,
    /// Rooms reachable in one move.
    pub connected_to: BTreeSet<RoomId>,
    /// Things in the room that can be inspected.
    pub items: Vec<String>,
    /// Sounds heard during the day.
    pub ambient_sounds: Vec<String>,
    /// Extra description per period.
    pub time_features: BTreeMap<Period, String>,
    occupants: BTreeSet<CharacterId>,
    state: RoomState,
}

impl Room {
    /// Build an empty room with the initial state.
    #[must_use]
    pub fn from_definition(definition: RoomDefinition) -> Self {
        Self {
            id: definition.id,
            name: definition.name,
            description: definition.description,
            connected_to: definition.connected_to,
            items: definition.items,
            ambient_sounds: definition.ambient_sounds,
            time_features: definition.time_features,
            occupants: BTreeSet::new(),
            state: RoomState::default(),
        }
    }

    /// Characters currently inside, in ID order.
    #[must_use]
    pub fn occupants(&self) -> &BTreeSet<CharacterId> {
        &self.occupants
    }

    /// Whether `id` is inside.
    #[must_use]
    pub fn contains(&self, id: &CharacterId) -> bool {
        self.occupants.contains(id)
    }

    /// Current ambient state.
    #[must_use]
    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Add a character. Idempotent.
    pub fn add_occupant(&mut self, id: CharacterId) {
        self.occupants.insert(id);
        self.recompute_state();
    }

    /// Remove a character. Idempotent.
    pub fn remove_occupant(&mut self, id: &CharacterId) {
        self.occupants.remove(id);
        self.recompute_state();
    }

    /// Re-derive noise and temperature from the occupant count.
    pub fn recompute_state(&mut self) {
        let count = self.occupants.len();
        self.state.noise_level = NoiseLevel::for_occupancy(count);
        #[allow(clippy::cast_precision_loss)]
        let warming = WARMING_PER_OCCUPANT * count as f32;
        self.state.temperature = (BASE_TEMPERATURE + warming).min(MAX_TEMPERATURE);
    }

    /// Set lighting for the hour of `now`.
    pub fn set_lighting_for(&mut self, now: &DateTime<Utc>) -> Lighting {
        self.state.lighting = Lighting::for_hour(now.hour());
        self.state.lighting
    }

    /// Whether `target` is directly reachable.
    #[must_use]
    pub fn can_move_to(&self, target: &RoomId) -> bool {
        self.connected_to.contains(target)
    }

    /// Full description at `now`: static text, the period feature,
    /// temperature and lighting, then who is here.
    #[must_use]
    pub fn describe(&self, now: &DateTime<Utc>) -> String {
        let mut lines = vec![self.description.clone()];
        if let Some(feature) = self.time_features.get(&Period::at(now)) {
            lines.push(feature.clone());
        }
        lines.push(format!(
            "The temperature is {:.1}°C and the lighting is {}.",
            self.state.temperature, self.state.lighting
        ));
        if !self.occupants.is_empty() {
            let names: Vec<&str> = self.occupants.iter().map(CharacterId::as_str).collect();
            lines.push(format!("Present: {}", names.join(", ")));
        }
        lines.join("\n")
    }

    /// Everything a character can do here at `now`. Built fresh per call.
    #[must_use]
    pub fn available_interactions(&self, now: &DateTime<Utc>) -> Vec<String> {
        let mut interactions: Vec<String> =
            self.items.iter().map(|item| format!("inspect the {item}")).collect();
        let extra: [&str; 2] = match Period::at(now) {
            Period::Morning => ["open the curtains", "tidy up the room"],
            Period::Afternoon => ["adjust the air conditioning", "take a short rest"],
            Period::Evening => ["turn on the lights", "get ready for bed"],
        };
        interactions.extend(extra.iter().map(|s| (*s).to_string()));
        interactions
    }

    /// What can be heard at `now`.
    #[must_use]
    pub fn ambient_sound(&self, now: &DateTime<Utc>) -> &str {
        match now.hour() {
            6..=8 => "birdsong at dawn",
            9..=17 => self.ambient_sounds.first().map_or("silence", String::as_str),
            _ => "insects chirping in the night",
        }
    }
}
