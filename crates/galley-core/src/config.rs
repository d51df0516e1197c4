//! Engine configuration model.
//!
//! Every field has a default so a partial (or missing) `config.toml` is valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::notification::Audience;
use crate::session::SessionTtl;

/// Root configuration for the engine.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GalleyConfig {
    pub session: SessionConfig,
    pub matching: MatchingConfig,
    pub intake: IntakeConfig,
    pub notifications: NotificationConfig,
    pub llm: LlmConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time before a text session is swept.
    pub text_ttl_secs: u64,
    /// Idle time before a voice session is swept.
    pub voice_ttl_secs: u64,
    /// Maximum number of turns (user + assistant entries) kept per session.
    pub max_history: usize,
    /// How often the background sweeper runs.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            text_ttl_secs: 60 * 60,
            voice_ttl_secs: 15 * 60,
            max_history: 20,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn ttl(&self) -> SessionTtl {
        SessionTtl {
            text: Duration::from_secs(self.text_ttl_secs),
            voice: Duration::from_secs(self.voice_ttl_secs),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum normalized edit-distance similarity for a fuzzy match.
    pub similarity_threshold: f64,
    /// Shortest phrase allowed to match by being contained in a catalog name.
    pub min_containment_len: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            min_containment_len: 3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct IntakeConfig {
    /// Consecutive not-understood turns before handing off to staff.
    pub max_clarifications: u32,
    pub currency_symbol: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_clarifications: 2,
            currency_symbol: "$".to_string(),
        }
    }
}

/// Staff recipients and message templates.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    pub kitchen: Vec<String>,
    pub delivery: Vec<String>,
    pub management: Vec<String>,
    /// Delay of the guest follow-up after delivery.
    pub follow_up_delay_secs: u64,
    /// Template overrides keyed like `"ready.guest"` or `"delivered.guest.follow_up"`.
    pub templates: HashMap<String, String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            kitchen: Vec::new(),
            delivery: Vec::new(),
            management: Vec::new(),
            follow_up_delay_secs: 10 * 60,
            templates: HashMap::new(),
        }
    }
}

impl NotificationConfig {
    /// Configured phone numbers for a staff audience. Guests are resolved
    /// through the room repository, never from configuration.
    pub fn staff_recipients(&self, audience: Audience) -> &[String] {
        match audience {
            Audience::Guest => &[],
            Audience::Kitchen => &self.kitchen,
            Audience::Delivery => &self.delivery,
            Audience::Management => &self.management,
        }
    }

    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_secs(self.follow_up_delay_secs)
    }
}

/// OpenAI-compatible chat completion endpoint settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: Some(300),
            timeout_secs: 20,
        }
    }
}
