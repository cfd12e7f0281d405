//! Blocking client for OpenAI-compatible chat-completion endpoints.

use std::time::{Duration, Instant};

use hamlet_core::config::LlmConfig;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{GenerationError, Result};
use crate::types::{GenerationRequest, Generator};

/// System message every request starts with; the persona is appended.
pub const SYSTEM_PREAMBLE: &str = "You are a resident of a small virtual town.";

/// Longest error body kept in [`GenerationError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Talks to `{base_url}/chat/completions` with a bearer token.
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns [`GenerationError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            timeout_secs,
            max_retries,
        })
    }

    /// Create a client from the `[llm]` section, reading the key from
    /// `api_key_env`. A missing key is not an error here; every call will
    /// then fail with [`GenerationError::Unavailable`].
    ///
    /// # Errors
    /// Returns [`GenerationError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!(var = %config.api_key_env, "No API key set, generation will be unavailable");
        }
        Self::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            config.timeout_secs,
            config.max_retries,
        )
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn body(&self, request: &GenerationRequest) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_message(request.persona.as_deref()) },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    fn attempt(&self, api_key: &str, body: &serde_json::Value) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .map_err(|e| GenerationError::from_reqwest(&e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| GenerationError::from_reqwest(&e, self.timeout_secs))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                code: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        parse_completion(&text)
    }
}

impl Generator for ChatClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GenerationError::Unavailable("no API key configured".into()));
        };
        let body = self.body(request);

        let mut last_error = GenerationError::Unavailable("no attempt made".into());
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt = attempt + 1, of = self.max_retries + 1, "Retrying generation");
            }
            let start = Instant::now();
            match self.attempt(api_key, &body) {
                Ok(text) => {
                    debug!(
                        model = %self.model,
                        chars = text.len(),
                        latency_ms = start.elapsed().as_millis(),
                        "Generation succeeded"
                    );
                    return Ok(text);
                }
                Err(err) => {
                    warn!(error = %err, attempt = attempt + 1, "Generation attempt failed");
                    last_error = err;
                }
            }
        }

        if self.max_retries == 0 {
            Err(last_error)
        } else {
            Err(GenerationError::RetriesExhausted {
                attempts: self.max_retries + 1,
                last_error: last_error.to_string(),
            })
        }
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// System message for an optional persona.
#[must_use]
pub fn system_message(persona: Option<&str>) -> String {
    match persona {
        Some(p) if !p.is_empty() => format!("{SYSTEM_PREAMBLE}\n{p}"),
        _ => SYSTEM_PREAMBLE.to_string(),
    }
}

/// Extract `choices[0].message.content` from a completion body.
///
/// # Errors
/// Returns [`GenerationError::Malformed`] when the body is not a completion
/// or has no choices.
pub fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| GenerationError::Malformed("response has no choices".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Good morning!"}}]}"#;
        assert_eq!(parse_completion(body).expect("parse"), "Good morning!");
    }

    #[test]
    fn empty_choices_is_malformed() {
        assert!(matches!(parse_completion(r#"{"choices":[]}"#), Err(GenerationError::Malformed(_))));
        assert!(matches!(parse_completion("not json"), Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn system_message_appends_persona() {
        assert_eq!(system_message(None), SYSTEM_PREAMBLE);
        assert_eq!(system_message(Some("")), SYSTEM_PREAMBLE);
        assert!(system_message(Some("Alice is a baker.")).ends_with("\nAlice is a baker."));
    }

    #[test]
    fn body_carries_sampling_parameters() {
        let client = ChatClient::new("https://example.invalid/v1/", None, "deepseek-chat", 30, 0)
            .expect("client");
        assert_eq!(client.endpoint(), "https://example.invalid/v1/chat/completions");

        let body = client.body(&GenerationRequest::action("act", "Alice").with_max_tokens(99));
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 99);
        assert_eq!(body["messages"][1]["content"], "act");
        assert!(body["messages"][0]["content"].as_str().is_some_and(|s| s.contains("Alice")));
    }

    #[test]
    fn missing_key_is_unavailable_without_network() {
        let client = ChatClient::new("http://127.0.0.1:1", None, "m", 1, 3).expect("client");
        let err = client.generate(&GenerationRequest::new("hi")).unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }

    #[test]
    fn refused_connection_exhausts_retries() {
        let client =
            ChatClient::new("http://127.0.0.1:1", Some("k".into()), "m", 2, 1).expect("client");
        let err = client.generate(&GenerationRequest::new("hi")).unwrap_err();
        assert!(matches!(err, GenerationError::RetriesExhausted { attempts: 2, .. }));
    }
}
