//! Mood assessment from recent experiences.
//!
//! Mood is a pure function of the records handed in: the same events
//! always give the same mood. Each record contributes
//!
//! ```text
//! valence += importance × sentiment(content)
//! arousal += importance            (dialogue and action records only)
//! ```
//!
//! where `sentiment` is a small keyword lexicon with intensity modifiers
//! ("very", "slightly", ...). Dialogue counts through the same lexicon, so a
//! warm conversation lifts the mood and an argument sours it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::memory::{MemoryKind, MemoryRecord};

/// A character's current mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Pleased with how things are going.
    Happy,
    /// Pleased and stirred up.
    Excited,
    /// Nothing much happening. Also the starting mood.
    #[default]
    Calm,
    /// Worn out by running around.
    Tired,
    /// Things have been going badly.
    Frustrated,
}

impl Mood {
    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Excited => "excited",
            Self::Calm => "calm",
            Self::Tired => "tired",
            Self::Frustrated => "frustrated",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "happy", "glad", "great", "good", "thank", "love", "enjoy", "friend", "laugh", "smile",
    "welcome", "wonderful", "delight", "fun", "kind", "help", "celebrat", "nice", "pleasant",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "angry", "upset", "bad", "hate", "annoy", "argue", "argument", "fight", "lost",
    "fail", "problem", "worr", "sorry", "rude", "afraid", "scared", "lonely", "cry", "broke",
];

/// Intensity modifiers; the first one found scales the whole text.
const INTENSIFIERS: &[(&str, f32)] = &[
    ("extremely", 1.5),
    ("very", 1.3),
    ("really", 1.2),
    ("quite", 1.1),
    ("a little", 0.6),
    ("slightly", 0.5),
];

/// Valence at or above which an aroused character is excited.
const EXCITED_VALENCE: f32 = 8.0;
/// Arousal needed for excitement.
const EXCITED_AROUSAL: f32 = 8.0;
/// Movement records needed before tiredness is considered.
const TIRED_MOVEMENTS: usize = 3;

/// Sentiment of one text in `[-1.5, 1.5]`: positive minus negative
/// keyword hits, normalised to the sign and scaled by the first intensifier.
#[must_use]
pub fn sentiment(text: &str) -> f32 {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(**w)).count();
    let base = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => return 0.0,
    };
    let scale = INTENSIFIERS
        .iter()
        .find(|(word, _)| lower.contains(word))
        .map_or(1.0, |(_, s)| *s);
    base * scale
}

/// Decide a mood from recent events.
#[must_use]
pub fn assess<'a, I>(events: I) -> Mood
where
    I: IntoIterator<Item = &'a MemoryRecord>,
{
    let mut valence = 0.0_f32;
    let mut arousal = 0.0_f32;
    let mut total = 0_usize;
    let mut movements = 0_usize;

    for record in events {
        total += 1;
        let weight = f32::from(record.importance.get());
        valence += weight * sentiment(&record.content);
        match record.kind {
            MemoryKind::Dialogue | MemoryKind::Action => arousal += weight,
            MemoryKind::Movement => movements += 1,
            MemoryKind::Observation | MemoryKind::Custom => {}
        }
    }

    if total == 0 {
        return Mood::Calm;
    }
    if movements >= TIRED_MOVEMENTS && movements * 2 >= total && valence <= 0.0 {
        return Mood::Tired;
    }
    if valence >= EXCITED_VALENCE && arousal >= EXCITED_AROUSAL {
        Mood::Excited
    } else if valence > 0.0 {
        Mood::Happy
    } else if valence < 0.0 {
        Mood::Frustrated
    } else {
        Mood::Calm
    }
}
