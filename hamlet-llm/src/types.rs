//! Request type and the [`Generator`] trait.

use serde::Serialize;

use crate::error::Result;

/// Default token budget, matching the service's configured default.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Sampling temperature for action prompts.
pub const ACTION_TEMPERATURE: f32 = 0.7;
/// Sampling temperature for dialogue prompts.
pub const DIALOGUE_TEMPERATURE: f32 = 0.8;
/// Sampling temperature for free-form observations.
pub const OBSERVATION_TEMPERATURE: f32 = 0.8;

/// One request for generated text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// The user prompt.
    pub prompt: String,
    /// 0.0 is deterministic, higher is more creative.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Who is speaking, appended to the system message.
    pub persona: Option<String>,
}

impl GenerationRequest {
    /// A plain request with default sampling and no persona.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: DIALOGUE_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            persona: None,
        }
    }

    /// Request for a character's next action.
    #[must_use]
    pub fn action(prompt: impl Into<String>, persona: impl Into<String>) -> Self {
        Self::new(prompt)
            .with_temperature(ACTION_TEMPERATURE)
            .with_persona(persona)
    }

    /// Request for a line of dialogue.
    #[must_use]
    pub fn dialogue(prompt: impl Into<String>, persona: impl Into<String>) -> Self {
        Self::new(prompt)
            .with_temperature(DIALOGUE_TEMPERATURE)
            .with_persona(persona)
    }

    /// Request for an impression of the surroundings.
    #[must_use]
    pub fn observation(prompt: impl Into<String>, persona: impl Into<String>) -> Self {
        Self::new(prompt)
            .with_temperature(OBSERVATION_TEMPERATURE)
            .with_persona(persona)
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Attach a persona.
    #[must_use]
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }
}

/// Anything that turns a prompt into text.
///
/// Calls block until the text arrives or the generator gives up. Failures
/// come back as values; a generator never panics on a bad response.
pub trait Generator: Send + Sync {
    /// Produce text for `request`.
    ///
    /// # Errors
    /// Returns a [`GenerationError`](crate::GenerationError) on any failure.
    fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
