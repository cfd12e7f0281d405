//! Prompt templates for hamlet turns.
//!
//! Templates use `{name}` placeholders filled by [`render_template`]. The
//! orchestrator supplies every variable; an unfilled placeholder in a
//! rendered prompt is a bug.

/// Prompt for a character deciding what to do next.
pub const ACTION_TEMPLATE: &str = r"You are {name} ({personality}).
Your recent experiences:
{memories}
You are now in {room}. {situation}
Things you could do here: {interactions}.
Considering your personality and experiences, what do you do? Describe it in one or two sentences.";

/// Prompt for one line of dialogue from speaker to listener.
pub const DIALOGUE_TEMPLATE: &str = r"You are {speaker} ({speaker_personality}). You have just run into {listener} ({listener_personality}).
{relationship}
{shared_history}You are both in {room}. What do you say to {listener}?";

/// Prompt for a character's impression of a room.
pub const OBSERVATION_TEMPLATE: &str = r"You are {name}. Describe how {room} looks and feels to you right now.
{description}";

/// Placeholder used when a character has nothing recent to draw on.
pub const NO_RECENT_EXPERIENCES: &str = "(nothing in particular)";

/// How a speaker feels about a listener, phrased for the dialogue prompt.
#[must_use]
pub fn relationship_phrase(value: u8) -> &'static str {
    match value {
        80.. => "The two of you are very close.",
        60..=79 => "The two of you are friends.",
        0..=20 => "The two of you are not on good terms.",
        _ => "The two of you are acquaintances.",
    }
}

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}
