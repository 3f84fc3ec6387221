use crate::clean::clean_for_speech;
use crate::config::{ConversationConfig, MAX_REPLY_TOKENS_LIMIT};
use crate::error::VoiceError;
use crate::prompt::{build_prompt, DEFAULT_SYSTEM_INSTRUCTION};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use voxrelay_types::ConversationTurn;

const SERVICE: &str = "conversation";

/// Capability to produce the assistant's next reply.
#[async_trait]
pub trait ConversationModel: Send + Sync {
    /// Whether the credentials needed to call the upstream are present.
    fn is_configured(&self) -> bool;

    /// Generates a reply to `message` given the prior turns, oldest first.
    ///
    /// `max_reply_tokens` bounds this reply only; `None` uses the configured
    /// limit.
    async fn converse(
        &self,
        message: &str,
        history: &[ConversationTurn],
        max_reply_tokens: Option<u32>,
    ) -> Result<String, VoiceError>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Conversation client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: ConversationConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Builds the client. A missing API key is reported on the first call,
    /// not here, so the server can still start and report readiness.
    pub fn new(config: ConversationConfig) -> Result<Self, VoiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| VoiceError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn system_instruction(&self) -> &str {
        self.config
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    /// Request body for one conversation turn. A per-call token limit is
    /// clamped to the same range as the configured one.
    pub fn request_body(
        &self,
        message: &str,
        history: &[ConversationTurn],
        max_reply_tokens: Option<u32>,
    ) -> Value {
        let prompt = build_prompt(message, history, self.config.history_turns);
        let token_limit = max_reply_tokens.map_or_else(
            || self.config.reply_token_limit(),
            |n| n.clamp(1, MAX_REPLY_TOKENS_LIMIT),
        );
        json!({
            "systemInstruction": {
                "parts": [{ "text": self.system_instruction() }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": token_limit
            }
        })
    }
}

#[async_trait]
impl ConversationModel for GeminiClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn converse(
        &self,
        message: &str,
        history: &[ConversationTurn],
        max_reply_tokens: Option<u32>,
    ) -> Result<String, VoiceError> {
        if message.trim().is_empty() {
            return Err(VoiceError::InvalidInput("message is required".to_string()));
        }
        if !self.is_configured() {
            return Err(VoiceError::Config(
                "conversation model API key is missing (GEMINI_API_KEY)".to_string(),
            ));
        }

        debug!(
            model = %self.config.model,
            history = history.len(),
            "requesting conversation reply"
        );

        let timeout = self.config.timeout();
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.request_body(message, history, max_reply_tokens))
            .send()
            .await
            .map_err(|e| VoiceError::from_transport(SERVICE, timeout, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| VoiceError::from_transport(SERVICE, timeout, e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| format!("Gemini API error: {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "conversation upstream failed");
            return Err(VoiceError::Upstream {
                service: SERVICE,
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_slice(&body).map_err(|e| {
            VoiceError::malformed(SERVICE, format!("invalid response body: {}", e))
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let reply = clean_for_speech(&text);
        if reply.is_empty() {
            return Err(VoiceError::malformed(SERVICE, "response has no text content"));
        }
        Ok(reply)
    }
}
