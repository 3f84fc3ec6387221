use crate::config::SpeechConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use voxrelay_types::Language;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
pub const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

const SERVICE: &str = "speech";

/// Capability to render text as audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether the credentials needed to call the upstream are present.
    fn is_configured(&self) -> bool;

    /// Synthesizes `text` in `language`, returning a WAV payload.
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, VoiceError>;
}

/// Rejects empty or oversized synthesis input.
pub fn validate_text(text: &str) -> Result<(), VoiceError> {
    if text.trim().is_empty() {
        return Err(VoiceError::InvalidInput("text is required".to_string()));
    }
    if text.len() > MAX_TTS_INPUT_BYTES {
        return Err(VoiceError::InvalidInput(format!(
            "text exceeds maximum size: {} bytes (limit: {} bytes)",
            text.len(),
            MAX_TTS_INPUT_BYTES
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    result: Option<RunResult>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct RunResult {
    audio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Speech synthesis through the Cloudflare Workers AI MeloTTS model.
#[derive(Debug, Clone)]
pub struct CloudflareTts {
    config: SpeechConfig,
    http: reqwest::Client,
}

impl CloudflareTts {
    pub fn new(config: SpeechConfig) -> Result<Self, VoiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| VoiceError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    /// Full URL of the model run endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_id,
            self.config.model
        )
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudflareTts {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, VoiceError> {
        validate_text(text)?;
        if !self.is_configured() {
            return Err(VoiceError::Config(
                "speech synthesis credentials are missing (CLOUDFLARE_ACCOUNT_ID / CLOUDFLARE_API_TOKEN)"
                    .to_string(),
            ));
        }

        debug!(
            language = language.code(),
            chars = text.chars().count(),
            "requesting speech synthesis"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_token)
            .json(&json!({
                "prompt": text,
                "lang": language.iso_code(),
            }))
            .send()
            .await
            .map_err(|e| VoiceError::from_transport(SERVICE, self.timeout(), e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| VoiceError::from_transport(SERVICE, self.timeout(), e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<RunEnvelope>(&body)
                .ok()
                .and_then(|env| env.errors.into_iter().next())
                .map(|m| m.message)
                .unwrap_or_else(|| format!("Cloudflare API Error: {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "speech synthesis upstream failed");
            return Err(VoiceError::Upstream {
                service: SERVICE,
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: RunEnvelope = serde_json::from_slice(&body).map_err(|e| {
            VoiceError::malformed(SERVICE, format!("invalid response body: {}", e))
        })?;
        let audio = envelope
            .result
            .and_then(|r| r.audio)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| VoiceError::malformed(SERVICE, "response has no audio"))?;

        base64::engine::general_purpose::STANDARD
            .decode(audio.trim())
            .map_err(|e| VoiceError::malformed(SERVICE, format!("audio is not valid base64: {}", e)))
    }
}

/// One successfully synthesized chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedChunk {
    pub index: usize,
    pub text: String,
    pub audio: Vec<u8>,
}

/// Outcome of synthesizing a chunk sequence.
///
/// Synthesis stops at the first failing chunk. `chunks` holds everything
/// rendered before it, in order.
#[derive(Debug)]
pub struct ChunkedSynthesis {
    pub chunks: Vec<SynthesizedChunk>,
    pub total: usize,
    pub failure: Option<(usize, VoiceError)>,
}

impl ChunkedSynthesis {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Synthesizes `chunks` one after another, aborting at the first failure.
pub async fn synthesize_chunks(
    synthesizer: &dyn SpeechSynthesizer,
    chunks: &[String],
    language: Language,
) -> ChunkedSynthesis {
    let mut done = Vec::with_capacity(chunks.len());
    for (index, text) in chunks.iter().enumerate() {
        match synthesizer.synthesize(text, language).await {
            Ok(audio) => done.push(SynthesizedChunk {
                index,
                text: text.clone(),
                audio,
            }),
            Err(e) => {
                warn!(
                    index,
                    total = chunks.len(),
                    "chunk synthesis failed, abandoning remaining chunks: {}",
                    e
                );
                return ChunkedSynthesis {
                    chunks: done,
                    total: chunks.len(),
                    failure: Some((index, e)),
                };
            }
        }
    }
    ChunkedSynthesis {
        chunks: done,
        total: chunks.len(),
        failure: None,
    }
}
