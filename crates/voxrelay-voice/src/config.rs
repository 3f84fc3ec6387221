use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_SPEECH_API_BASE: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_SPEECH_MODEL: &str = "@cf/myshell-ai/melotts";
pub const DEFAULT_CONVERSATION_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CONVERSATION_MODEL: &str = "gemini-2.0-flash";

/// Upper bound accepted for `max_output_tokens`.
pub const MAX_REPLY_TOKENS_LIMIT: u32 = 8192;

fn default_timeout_seconds() -> u64 {
    30
}

fn default_speech_api_base() -> String {
    DEFAULT_SPEECH_API_BASE.to_string()
}

fn default_speech_model() -> String {
    DEFAULT_SPEECH_MODEL.to_string()
}

fn default_conversation_api_base() -> String {
    DEFAULT_CONVERSATION_API_BASE.to_string()
}

fn default_conversation_model() -> String {
    DEFAULT_CONVERSATION_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_output_tokens() -> u32 {
    250
}

fn default_history_turns() -> usize {
    6
}

/// Credentials and endpoint for the Workers AI speech synthesis model.
///
/// An empty `account_id` or `api_token` means the speech service is not
/// configured.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub account_id: String,
    #[serde(default, skip_serializing)]
    pub api_token: String,
    #[serde(default = "default_speech_api_base")]
    pub api_base: String,
    #[serde(default = "default_speech_model")]
    pub model: String,
    /// Per-request timeout in seconds. Default: 30.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            api_base: default_speech_api_base(),
            model: default_speech_model(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("account_id", &self.account_id)
            .field("api_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl SpeechConfig {
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.account_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

/// Credentials and generation settings for the Gemini conversation model.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_conversation_api_base")]
    pub api_base: String,
    #[serde(default = "default_conversation_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Reply length cap sent to the model. Clamped to `1..=8192`.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// How many of the most recent history turns are replayed as context.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Replaces the built-in system instruction when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_conversation_api_base(),
            model: default_conversation_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            history_turns: default_history_turns(),
            timeout_seconds: default_timeout_seconds(),
            system_prompt: None,
        }
    }
}

impl fmt::Debug for ConversationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("history_turns", &self.history_turns)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("system_prompt", &self.system_prompt.is_some())
            .finish()
    }
}

impl ConversationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn reply_token_limit(&self) -> u32 {
        self.max_output_tokens.clamp(1, MAX_REPLY_TOKENS_LIMIT)
    }
}
