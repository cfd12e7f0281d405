//! The world: every character and room, keyed by ID, plus the turn engine.
//!
//! All mutation goes through turns. A turn first validates against the
//! current state and either changes nothing (returning a
//! [`ValidationError`]) or applies its whole effect. Generation failures
//! never refuse a turn; the text is replaced by a placeholder and the turn
//! completes with `degraded` set.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use hamlet_core::memory::stream::NO_MEMORIES;
use hamlet_core::{
    Character, CharacterId, Clock, HamletConfig, Importance, MemoryKind, MemoryRecord, NewMemory,
    Room, RoomId, snapshot,
};
use hamlet_llm::{GenerationRequest, Generator};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::definitions::WorldDefinition;
use crate::dialogue;
use crate::error::{Result, SimError, ValidationError};
use crate::events::{Mode, SimEvent};
use crate::turns::{Generated, Turn, TurnOutcome, Utterance};

/// Result of validating a turn.
pub type Validated<T> = std::result::Result<T, ValidationError>;

/// Energy regained per housekeeping pass at night.
pub const NIGHT_REST: u8 = 10;
/// Energy spent per housekeeping pass during the day.
pub const DAYTIME_DRAIN: u8 = 1;
/// First hour of the night (inclusive).
pub const NIGHT_STARTS: u32 = 22;
/// First hour of the day (inclusive).
pub const DAY_STARTS: u32 = 6;

/// The whole town.
pub struct World {
    config: HamletConfig,
    characters: BTreeMap<CharacterId, Character>,
    rooms: BTreeMap<RoomId, Room>,
    generator: Arc<dyn Generator>,
    clock: Box<dyn Clock>,
    rng: StdRng,
    focus: Option<CharacterId>,
    outbox: Vec<SimEvent>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("characters", &self.characters.len())
            .field("rooms", &self.rooms.len())
            .field("generator", &self.generator.name())
            .field("clock", &self.clock)
            .field("focus", &self.focus)
            .field("pending_events", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl World {
    /// Build a world from validated config and loaded definitions.
    ///
    /// Characters are placed in their initial rooms and the first defined
    /// character gets the focus. Passages to undefined rooms are kept but
    /// logged, and never offered as a destination.
    ///
    /// # Errors
    /// Returns [`SimError::Core`] for invalid config, or a definition error
    /// for duplicate IDs and unknown initial locations.
    pub fn new(
        config: HamletConfig,
        definition: WorldDefinition,
        generator: Arc<dyn Generator>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let mut rooms = BTreeMap::new();
        for room in definition.rooms {
            if rooms.contains_key(&room.id) {
                return Err(SimError::DuplicateRoom(room.id));
            }
            rooms.insert(room.id.clone(), Room::from_definition(room));
        }
        for room in rooms.values() {
            for target in room.connected_to.iter().filter(|t| !rooms.contains_key(*t)) {
                warn!(room = %room.id, target = %target, "Passage leads to an undefined room");
            }
        }

        let mut characters = BTreeMap::new();
        let mut focus = None;
        for def in definition.characters {
            if characters.contains_key(&def.id) {
                return Err(SimError::DuplicateCharacter(def.id));
            }
            let Some(room) = rooms.get_mut(&def.initial_location) else {
                return Err(SimError::UnknownInitialLocation {
                    character: def.id,
                    room: def.initial_location,
                });
            };
            room.add_occupant(def.id.clone());
            focus.get_or_insert_with(|| def.id.clone());
            characters.insert(
                def.id.clone(),
                Character::from_definition(def, config.memory.capacity),
            );
        }

        let now = clock.now();
        for room in rooms.values_mut() {
            room.set_lighting_for(&now);
        }

        let rng = match config.turns.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            characters = characters.len(),
            rooms = rooms.len(),
            generator = generator.name(),
            "World initialized"
        );

        Ok(Self {
            config,
            characters,
            rooms,
            generator,
            clock,
            rng,
            focus,
            outbox: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HamletConfig {
        &self.config
    }

    /// Look up a character.
    #[must_use]
    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.get(id)
    }

    /// Look up a room.
    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// All characters in ID order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// All rooms in ID order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Take every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn get(&self, id: &CharacterId) -> Validated<&Character> {
        self.characters
            .get(id)
            .ok_or_else(|| ValidationError::UnknownCharacter(id.clone()))
    }

    fn get_mut(&mut self, id: &CharacterId) -> Validated<&mut Character> {
        self.characters
            .get_mut(id)
            .ok_or_else(|| ValidationError::UnknownCharacter(id.clone()))
    }

    fn location_of(&self, character: &Character) -> Validated<&Room> {
        self.rooms
            .get(&character.current_location)
            .ok_or_else(|| ValidationError::UnknownRoom(character.current_location.clone()))
    }

    fn recent_window(&self) -> Duration {
        Duration::hours(i64::from(self.config.memory.recent_window_hours))
    }

    // ------------------------------------------------------------------
    // Focus and status
    // ------------------------------------------------------------------

    /// Point the player's view at `id`. Unknown IDs leave the focus alone.
    pub fn focus(&mut self, id: &CharacterId) -> bool {
        if self.characters.contains_key(id) {
            self.focus = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// The character the player is following.
    #[must_use]
    pub fn focused_character(&self) -> Option<&Character> {
        self.focus.as_ref().and_then(|id| self.characters.get(id))
    }

    /// Where the focused character currently is.
    #[must_use]
    pub fn focused_room(&self) -> Option<&Room> {
        self.focused_character()
            .and_then(|c| self.rooms.get(&c.current_location))
    }

    /// Queue a status bar update for the focused room.
    pub fn status(&mut self, mode: Mode) {
        let event = match self.focused_room() {
            Some(room) => SimEvent::StatusSnapshot {
                location: room.name.clone(),
                occupant_count: room.occupants().len(),
                mode,
            },
            None => SimEvent::error("No character is in focus"),
        };
        self.outbox.push(event);
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    fn generate(&mut self, request: &GenerationRequest, subject: &CharacterId) -> Generated {
        match self.generator.generate(request) {
            Ok(text) => Generated {
                text: text.trim().to_string(),
                degraded: false,
            },
            Err(err) => {
                warn!(
                    character = %subject,
                    generator = self.generator.name(),
                    error = %err,
                    "Generation failed, substituting placeholder"
                );
                self.outbox
                    .push(SimEvent::error(format!("Generation failed for {subject}: {err}")));
                Generated {
                    text: format!("(generation failed: {err})"),
                    degraded: true,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Turns
    // ------------------------------------------------------------------

    /// Run one turn.
    ///
    /// # Errors
    /// Returns the [`ValidationError`] that refused the turn. A refused turn
    /// changes nothing.
    pub fn execute(&mut self, turn: Turn) -> Validated<TurnOutcome> {
        match turn {
            Turn::Move { character, to } => {
                let from = self.try_move_character(&character, &to)?;
                Ok(TurnOutcome::Moved { character, from, to })
            }
            Turn::Speak { speaker, listener } => {
                self.try_speak(&speaker, &listener).map(TurnOutcome::Spoke)
            }
            Turn::Act { character } => {
                let action = self.try_act(&character)?;
                Ok(TurnOutcome::Acted { character, action })
            }
            Turn::Observe { character } => {
                let observation = self.try_observe(&character)?;
                Ok(TurnOutcome::Observed {
                    character,
                    observation,
                })
            }
            Turn::Remember {
                character,
                content,
                importance,
            } => {
                self.try_remember(&character, content, importance)?;
                Ok(TurnOutcome::Remembered { character })
            }
            Turn::ObserveAll => Ok(TurnOutcome::ObservedAll {
                characters: self.observe_all(),
            }),
        }
    }

    /// Move `id` to the adjacent room `to`, returning the room it left.
    ///
    /// # Errors
    /// Unknown character or room, or no passage from the current room.
    pub fn try_move_character(&mut self, id: &CharacterId, to: &RoomId) -> Validated<RoomId> {
        let character = self.get(id)?;
        let from_room = self.location_of(character)?;
        let target = self
            .rooms
            .get(to)
            .ok_or_else(|| ValidationError::UnknownRoom(to.clone()))?;
        if !from_room.can_move_to(to) {
            return Err(ValidationError::NotConnected {
                from: from_room.id.clone(),
                to: to.clone(),
            });
        }

        let from = from_room.id.clone();
        let content = format!("Moved from {} to {}", from_room.name, target.name);
        let narration = format!("{} walks from {} to {}.", character.name, from_room.name, target.name);
        let now = self.now();

        if let Some(room) = self.rooms.get_mut(&from) {
            room.remove_occupant(id);
        }
        if let Some(room) = self.rooms.get_mut(to) {
            room.add_occupant(id.clone());
        }
        let character = self.get_mut(id)?;
        character.current_location = to.clone();
        character.record_memory(
            NewMemory::new(MemoryKind::Movement, content, Importance::ROUTINE),
            now,
        );

        debug!(character = %id, from = %from, to = %to, "Character moved");
        self.outbox.push(SimEvent::system(narration));
        Ok(from)
    }

    /// `speaker` says something to `listener`.
    ///
    /// The relationship delta is drawn from
    /// `turns.dialogue_delta_min..=turns.dialogue_delta_max` and applied to
    /// both sides, so an initially symmetric relationship stays symmetric.
    ///
    /// # Errors
    /// Unknown characters, self-conversation, or different rooms.
    pub fn try_speak(&mut self, speaker: &CharacterId, listener: &CharacterId) -> Validated<Utterance> {
        if speaker == listener {
            return Err(ValidationError::SelfConversation(speaker.clone()));
        }
        let s = self.get(speaker)?;
        let l = self.get(listener)?;
        if s.current_location != l.current_location {
            return Err(ValidationError::NotCoLocated {
                speaker: speaker.clone(),
                listener: listener.clone(),
            });
        }
        let room = self.location_of(s)?;

        let now = self.now();
        let prompt = dialogue::dialogue_prompt(s, l, room, self.recent_window(), now);
        let request = GenerationRequest::dialogue(prompt, s.persona())
            .with_temperature(self.config.llm.temperature)
            .with_max_tokens(self.config.llm.max_tokens);
        let speaker_name = s.name.clone();
        let listener_name = l.name.clone();

        let line = self.generate(&request, speaker);
        let delta = self
            .rng
            .gen_range(self.config.turns.dialogue_delta_min..=self.config.turns.dialogue_delta_max);

        let s = self.get_mut(speaker)?;
        let speaker_relationship = s.update_relationship(listener, delta);
        s.record_memory(
            NewMemory::new(
                MemoryKind::Dialogue,
                format!("Talked with {listener_name}: {}", line.text),
                Importance::DIALOGUE,
            )
            .about(listener.clone()),
            now,
        );

        let record_listener = self.config.turns.record_listener_memory;
        let l = self.get_mut(listener)?;
        let listener_relationship = l.update_relationship(speaker, delta);
        if record_listener {
            l.record_memory(
                NewMemory::new(
                    MemoryKind::Dialogue,
                    format!("{speaker_name} said to me: {}", line.text),
                    Importance::DIALOGUE,
                )
                .about(speaker.clone()),
                now,
            );
        }

        debug!(
            speaker = %speaker,
            listener = %listener,
            delta,
            degraded = line.degraded,
            "Conversation"
        );
        self.outbox.push(SimEvent::Dialogue {
            speaker: speaker_name,
            text: line.text.clone(),
        });

        Ok(Utterance {
            speaker: speaker.clone(),
            listener: listener.clone(),
            line,
            delta,
            speaker_relationship,
            listener_relationship,
        })
    }

    /// `id` decides what to do, based on recent memories and the room.
    ///
    /// # Errors
    /// Unknown character.
    pub fn try_act(&mut self, id: &CharacterId) -> Validated<Generated> {
        let character = self.get(id)?;
        let room = self.location_of(character)?;
        let now = self.now();
        let prompt = dialogue::action_prompt(character, room, self.recent_window(), now);
        let request = GenerationRequest::action(prompt, character.persona())
            .with_temperature(self.config.llm.temperature)
            .with_max_tokens(self.config.llm.max_tokens);
        let name = character.name.clone();

        let action = self.generate(&request, id);
        self.get_mut(id)?.record_memory(
            NewMemory::new(MemoryKind::Action, action.text.clone(), Importance::ROUTINE),
            now,
        );

        debug!(character = %id, degraded = action.degraded, "Character acted");
        self.outbox
            .push(SimEvent::system(format!("{name}'s action: {}", action.text)));
        Ok(action)
    }

    /// `id` looks around the current room and records an impression.
    ///
    /// # Errors
    /// Unknown character.
    pub fn try_observe(&mut self, id: &CharacterId) -> Validated<Generated> {
        let character = self.get(id)?;
        let room = self.location_of(character)?;
        let now = self.now();
        let description = room.describe(&now);
        let prompt = dialogue::observation_prompt(character, room, now);
        let request = GenerationRequest::observation(prompt, character.persona())
            .with_temperature(self.config.llm.temperature)
            .with_max_tokens(self.config.llm.max_tokens);
        let name = character.name.clone();

        self.outbox.push(SimEvent::system(description));
        let observation = self.generate(&request, id);
        self.get_mut(id)?.record_memory(
            NewMemory::new(
                MemoryKind::Observation,
                observation.text.clone(),
                Importance::OBSERVATION,
            ),
            now,
        );

        debug!(character = %id, degraded = observation.degraded, "Character looked around");
        self.outbox.push(SimEvent::Dialogue {
            speaker: name,
            text: observation.text.clone(),
        });
        Ok(observation)
    }

    /// Store a player-supplied memory. Importance is clamped into `1..=5`.
    ///
    /// # Errors
    /// Unknown character.
    pub fn try_remember(
        &mut self,
        id: &CharacterId,
        content: impl Into<String>,
        importance: i64,
    ) -> Validated<()> {
        let now = self.now();
        let character = self.get_mut(id)?;
        character.record_memory(
            NewMemory::new(MemoryKind::Custom, content, Importance::saturating(importance)),
            now,
        );
        let name = character.name.clone();
        debug!(character = %id, importance, "Custom memory stored");
        self.outbox.push(SimEvent::system(format!("{name} will remember that.")));
        Ok(())
    }

    /// Queue a [`SimEvent::MemoryView`] for each memory of `id` inside the
    /// recent window, returning how many were shown.
    ///
    /// # Errors
    /// Unknown character.
    pub fn try_recall(&mut self, id: &CharacterId) -> Validated<usize> {
        let now = self.now();
        let within = self.recent_window();
        let records: Vec<MemoryRecord> = self
            .get(id)?
            .memories()
            .recent(within, now)
            .cloned()
            .collect();
        if records.is_empty() {
            self.outbox.push(SimEvent::system(NO_MEMORIES));
        }
        let shown = records.len();
        self.outbox
            .extend(records.into_iter().map(|record| SimEvent::MemoryView {
                character: id.clone(),
                record,
            }));
        Ok(shown)
    }

    fn reject(&mut self, err: &ValidationError) {
        debug!(error = %err, "Turn rejected");
        self.outbox.push(SimEvent::error(err.to_string()));
    }

    /// [`try_move_character`](Self::try_move_character), reporting only
    /// success. A refused move is a silent no-op.
    pub fn move_character(&mut self, id: &CharacterId, to: &RoomId) -> bool {
        match self.try_move_character(id, to) {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "Move refused");
                false
            }
        }
    }

    /// [`try_speak`](Self::try_speak); a refusal is queued as an error event.
    pub fn speak(&mut self, speaker: &CharacterId, listener: &CharacterId) -> Option<Utterance> {
        self.try_speak(speaker, listener)
            .map_err(|err| self.reject(&err))
            .ok()
    }

    /// [`try_act`](Self::try_act); a refusal is queued as an error event.
    pub fn act(&mut self, id: &CharacterId) -> Option<String> {
        self.try_act(id)
            .map(|action| action.text)
            .map_err(|err| self.reject(&err))
            .ok()
    }

    /// [`try_observe`](Self::try_observe); a refusal is queued as an error event.
    pub fn observe(&mut self, id: &CharacterId) -> Option<String> {
        self.try_observe(id)
            .map(|observation| observation.text)
            .map_err(|err| self.reject(&err))
            .ok()
    }

    /// [`try_remember`](Self::try_remember); a refusal is queued as an error event.
    pub fn remember(&mut self, id: &CharacterId, content: impl Into<String>, importance: i64) -> bool {
        self.try_remember(id, content, importance)
            .map_err(|err| self.reject(&err))
            .is_ok()
    }

    /// [`try_recall`](Self::try_recall); a refusal is queued as an error event.
    pub fn recall(&mut self, id: &CharacterId) -> usize {
        self.try_recall(id)
            .map_err(|err| self.reject(&err))
            .unwrap_or(0)
    }

    /// People `id` could start a conversation with right now.
    fn conversation_partners(&self, id: &CharacterId) -> Vec<CharacterId> {
        let Some(character) = self.characters.get(id) else {
            return Vec::new();
        };
        let Some(room) = self.rooms.get(&character.current_location) else {
            return Vec::new();
        };
        room.occupants()
            .iter()
            .filter(|other| *other != id && character.can_interact_with(other))
            .cloned()
            .collect()
    }

    /// Defined rooms reachable from where `id` stands.
    fn exits(&self, id: &CharacterId) -> Vec<RoomId> {
        let Some(room) = self
            .characters
            .get(id)
            .and_then(|c| self.rooms.get(&c.current_location))
        else {
            return Vec::new();
        };
        room.connected_to
            .iter()
            .filter(|target| self.rooms.contains_key(*target))
            .cloned()
            .collect()
    }

    fn refresh_mood(&mut self, id: &CharacterId, within: Duration, now: DateTime<Utc>) {
        if let Some(character) = self.characters.get_mut(id) {
            let recent: Vec<MemoryRecord> = character.memories().recent(within, now).cloned().collect();
            let mood = character.update_mood(&recent);
            debug!(character = %id, mood = %mood, "Mood updated");
        }
    }

    /// One autonomous round: in ID order, every character acts, then may
    /// talk to someone nearby, then may wander off. Returns how many
    /// characters took a turn.
    pub fn observe_all(&mut self) -> usize {
        let ids: Vec<CharacterId> = self.characters.keys().cloned().collect();
        let talk = self.config.turns.talk_probability;
        let wander = self.config.turns.move_probability;
        let mood_window = Duration::minutes(i64::from(self.config.turns.mood_window_minutes));

        for id in &ids {
            self.act(id);

            let partners = self.conversation_partners(id);
            if !partners.is_empty() && self.rng.gen_bool(talk) {
                if let Some(partner) = partners.choose(&mut self.rng).cloned() {
                    self.speak(id, &partner);
                }
            }

            let exits = self.exits(id);
            if !exits.is_empty() && self.rng.gen_bool(wander) {
                if let Some(to) = exits.choose(&mut self.rng).cloned() {
                    self.move_character(id, &to);
                }
            }

            let now = self.now();
            self.refresh_mood(id, mood_window, now);
        }

        debug!(characters = ids.len(), "Observe-all round finished");
        ids.len()
    }

    /// Periodic upkeep: moods, energy, lighting and age pruning.
    ///
    /// Energy recovers by [`NIGHT_REST`] between [`NIGHT_STARTS`] and
    /// [`DAY_STARTS`] and drains by [`DAYTIME_DRAIN`] otherwise. Returns the
    /// number of memories pruned.
    pub fn housekeeping(&mut self) -> usize {
        let now = self.now();
        let hour = now.hour();
        let night = hour >= NIGHT_STARTS || hour < DAY_STARTS;
        let mood_window = Duration::minutes(i64::from(self.config.turns.mood_window_minutes));
        let retention = Duration::days(i64::from(self.config.memory.retention_days));

        let ids: Vec<CharacterId> = self.characters.keys().cloned().collect();
        let mut pruned = 0;
        for id in &ids {
            self.refresh_mood(id, mood_window, now);
            if let Some(character) = self.characters.get_mut(id) {
                if night {
                    character.rest(NIGHT_REST);
                } else {
                    character.consume_energy(DAYTIME_DRAIN);
                }
                pruned += character.prune_memories(retention, now);
            }
        }
        for room in self.rooms.values_mut() {
            room.set_lighting_for(&now);
        }

        debug!(pruned, night, "Housekeeping done");
        pruned
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Write one `<character id>.json` snapshot per character into `dir`.
    ///
    /// # Errors
    /// Returns an error if the directory or a file cannot be written.
    pub fn export_snapshots(&self, dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(dir)?;
        for (id, character) in &self.characters {
            snapshot::save_to_file(character.memories(), &dir.join(format!("{id}.json")))?;
        }
        info!(dir = %dir.display(), characters = self.characters.len(), "Snapshots exported");
        Ok(self.characters.len())
    }

    /// Replace memory streams with the `<character id>.json` snapshots found
    /// in `dir`. Characters without a file keep their current memories, and a
    /// missing directory restores nothing.
    ///
    /// # Errors
    /// Returns an error if a snapshot exists but cannot be read or decoded.
    pub fn import_snapshots(&mut self, dir: &Path) -> Result<usize> {
        let capacity = self.config.memory.capacity;
        let mut restored = 0;
        for (id, character) in &mut self.characters {
            let path = dir.join(format!("{id}.json"));
            if !path.is_file() {
                continue;
            }
            character.restore_memories(snapshot::load_from_file(&path, capacity)?);
            restored += 1;
        }
        info!(dir = %dir.display(), restored, "Snapshots imported");
        Ok(restored)
    }
}
