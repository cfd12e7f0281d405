//! Prompt assembly from character and room state.
//!
//! Pure functions: they read a character's memories and surroundings and
//! fill a template from [`hamlet_llm::prompt`]. Nothing here mutates state
//! or calls the generator.

use chrono::{DateTime, Duration, Utc};
use hamlet_core::{Character, MemoryRecord, Period, Room};
use hamlet_llm::prompt::{self, render_template};

/// Memories quoted in an action prompt.
pub const ACTION_MEMORY_COUNT: usize = 5;
/// Shared moments quoted in a dialogue prompt.
pub const SHARED_HISTORY_COUNT: usize = 2;

/// Last `n` records inside the window, oldest first.
fn last_recent(character: &Character, within: Duration, now: DateTime<Utc>, n: usize) -> Vec<&MemoryRecord> {
    let recent: Vec<&MemoryRecord> = character.memories().recent(within, now).collect();
    let start = recent.len().saturating_sub(n);
    recent[start..].to_vec()
}

/// Prompt asking `character` what it does next in `room`.
#[must_use]
pub fn action_prompt(character: &Character, room: &Room, within: Duration, now: DateTime<Utc>) -> String {
    let memories = last_recent(character, within, now, ACTION_MEMORY_COUNT);
    let memories = if memories.is_empty() {
        prompt::NO_RECENT_EXPERIENCES.to_string()
    } else {
        memories.iter().map(|r| r.content.as_str()).collect::<Vec<_>>().join("\n")
    };

    let situation = match character.current_routine(&now) {
        Some(routine) => format!("It is {}; you usually {routine} around now.", Period::at(&now)),
        None => format!("It is {}.", Period::at(&now)),
    };
    let interactions = room.available_interactions(&now).join(", ");

    render_template(
        prompt::ACTION_TEMPLATE,
        &[
            ("name", character.name.as_str()),
            ("personality", character.personality.as_str()),
            ("memories", memories.as_str()),
            ("room", room.name.as_str()),
            ("situation", situation.as_str()),
            ("interactions", interactions.as_str()),
        ],
    )
}

/// Prompt for `speaker` addressing `listener`, both in `room`.
///
/// Includes the speaker's view of the relationship and up to two recent
/// memories that involve the listener.
#[must_use]
pub fn dialogue_prompt(
    speaker: &Character,
    listener: &Character,
    room: &Room,
    within: Duration,
    now: DateTime<Utc>,
) -> String {
    let shared: Vec<&MemoryRecord> = speaker
        .memories()
        .recent(within, now)
        .filter(|r| r.involves(&listener.id))
        .collect();
    let start = shared.len().saturating_sub(SHARED_HISTORY_COUNT);
    let shared_history = if shared.is_empty() {
        String::new()
    } else {
        let mut text = format!("Your recent moments with {}:\n", listener.name);
        for record in &shared[start..] {
            text.push_str("- ");
            text.push_str(&record.content);
            text.push('\n');
        }
        text
    };

    render_template(
        prompt::DIALOGUE_TEMPLATE,
        &[
            ("speaker", speaker.name.as_str()),
            ("speaker_personality", speaker.personality.as_str()),
            ("listener", listener.name.as_str()),
            ("listener_personality", listener.personality.as_str()),
            ("relationship", prompt::relationship_phrase(speaker.relationship_with(&listener.id))),
            ("shared_history", shared_history.as_str()),
            ("room", room.name.as_str()),
        ],
    )
}

/// Prompt asking `character` to describe `room`.
#[must_use]
pub fn observation_prompt(character: &Character, room: &Room, now: DateTime<Utc>) -> String {
    let description = room.describe(&now);
    render_template(
        prompt::OBSERVATION_TEMPLATE,
        &[
            ("name", character.name.as_str()),
            ("room", room.name.as_str()),
            ("description", description.as_str()),
        ],
    )
}
