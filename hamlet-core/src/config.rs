//! Configuration for a hamlet simulation.
//!
//! Maps directly to `hamlet.toml`. Every field has a default, so an empty
//! file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HamletError, Result};

/// Longest retention or lookback window accepted, in days.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HamletConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Per-character memory limits.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Turn policy knobs.
    #[serde(default)]
    pub turns: TurnConfig,
    /// Text-generation service settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Memory snapshot settings.
    #[serde(default)]
    pub snapshots: SnapshotConfig,
}

impl HamletConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `HamletError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| HamletError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    /// Returns `HamletError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.memory.capacity == 0 {
            return Err(HamletError::Config("memory.capacity must be at least 1".into()));
        }
        for (name, value, max) in [
            ("memory.retention_days", self.memory.retention_days, MAX_WINDOW_DAYS),
            ("memory.recent_window_hours", self.memory.recent_window_hours, MAX_WINDOW_DAYS * 24),
            ("turns.mood_window_minutes", self.turns.mood_window_minutes, MAX_WINDOW_DAYS * 24 * 60),
        ] {
            if value > max {
                return Err(HamletError::Config(format!("{name} must be at most {max}, got {value}")));
            }
        }
        if self.turns.dialogue_delta_min > self.turns.dialogue_delta_max {
            return Err(HamletError::Config(format!(
                "turns.dialogue_delta_min ({}) exceeds turns.dialogue_delta_max ({})",
                self.turns.dialogue_delta_min, self.turns.dialogue_delta_max
            )));
        }
        for (name, p) in [
            ("turns.talk_probability", self.turns.talk_probability),
            ("turns.move_probability", self.turns.move_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(HamletError::Config(format!("{name} must be within 0..=1, got {p}")));
            }
        }
        if !matches!(self.llm.provider.as_str(), "openai" | "scripted") {
            return Err(HamletError::Config(format!(
                "llm.provider must be \"openai\" or \"scripted\", got {:?}",
                self.llm.provider
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(HamletError::Config("llm.timeout_secs must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(HamletError::Config(format!(
                "llm.temperature must be within 0..=2, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory holding `characters.json` and `rooms.json`.
    #[serde(default = "default_world_dir")]
    pub world_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            world_dir: default_world_dir(),
        }
    }
}

/// Per-character memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Records kept per character before eviction.
    #[serde(default = "default_100")]
    pub capacity: usize,
    /// Housekeeping prunes records older than this many days.
    #[serde(default = "default_7")]
    pub retention_days: u32,
    /// Window used when recalling "recent" memories.
    #[serde(default = "default_24")]
    pub recent_window_hours: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            retention_days: 7,
            recent_window_hours: 24,
        }
    }
}

/// Turn policy. The dialogue delta range is deliberately biased toward
/// warming relationships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// RNG seed. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Lower bound of the per-conversation relationship change.
    #[serde(default = "default_delta_min")]
    pub dialogue_delta_min: i32,
    /// Upper bound of the per-conversation relationship change.
    #[serde(default = "default_delta_max")]
    pub dialogue_delta_max: i32,
    /// Chance a character talks to someone during an observe-all round.
    #[serde(default = "default_0_7")]
    pub talk_probability: f64,
    /// Chance a character wanders off during an observe-all round.
    #[serde(default = "default_0_3")]
    pub move_probability: f64,
    /// How far back mood looks.
    #[serde(default = "default_360")]
    pub mood_window_minutes: u32,
    /// Whether the listener also remembers a conversation.
    #[serde(default = "default_true")]
    pub record_listener_memory: bool,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            seed: None,
            dialogue_delta_min: -5,
            dialogue_delta_max: 10,
            talk_probability: 0.7,
            move_probability: 0.3,
            mood_window_minutes: 360,
            record_listener_memory: true,
        }
    }
}

/// Text-generation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "openai" (any compatible endpoint) or "scripted" (offline).
    #[serde(default = "default_openai")]
    pub provider: String,
    /// Base URL for the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout.
    #[serde(default = "default_30")]
    pub timeout_secs: u64,
    /// Upper bound on generated tokens.
    #[serde(default = "default_4096")]
    pub max_tokens: u32,
    /// Default sampling temperature.
    #[serde(default = "default_0_8_f32")]
    pub temperature: f32,
    /// Extra attempts after a failed request.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_openai(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: 30,
            max_tokens: 4096,
            temperature: 0.8,
            max_retries: 0,
        }
    }
}

/// Memory snapshot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory of `<character id>.json` snapshots, read at startup and
    /// written at shutdown. `None` disables snapshots.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_world_dir() -> PathBuf { PathBuf::from("world") }
fn default_openai() -> String { "openai".to_string() }
fn default_base_url() -> String { "https://api.deepseek.com/v1".to_string() }
fn default_model() -> String { "deepseek-chat".to_string() }
fn default_api_key_env() -> String { "DEEPSEEK_API_KEY".to_string() }
fn default_0_3() -> f64 { 0.3 }
fn default_0_7() -> f64 { 0.7 }
fn default_0_8_f32() -> f32 { 0.8 }
fn default_delta_min() -> i32 { -5 }
fn default_delta_max() -> i32 { 10 }
fn default_7() -> u32 { 7 }
fn default_24() -> u32 { 24 }
fn default_30() -> u64 { 30 }
fn default_100() -> usize { 100 }
fn default_360() -> u32 { 360 }
fn default_4096() -> u32 { 4096 }
