//! Speech synthesis handlers.

use crate::api::{json_body, ApiError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use voxrelay_types::Language;
use voxrelay_voice::{split_for_speech, synthesize_chunks, validate_text};

/// Smallest chunk size a caller may request on `/api/speak`.
pub const MIN_SPEAK_CHUNK_CHARS: usize = 20;

fn default_language() -> String {
    Language::default().code().to_string()
}

/// Request body for the speech endpoints.
#[derive(Debug, Deserialize)]
pub struct GenerateVoiceRequest {
    #[serde(default)]
    pub text: String,
    /// Front-end language code. Default: `EN`.
    #[serde(default = "default_language")]
    pub language: String,
}

/// Request body for `POST /api/speak`.
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Overrides the configured chunk size for this request.
    #[serde(default, rename = "maxChunkChars")]
    pub max_chunk_chars: Option<usize>,
}

/// Response body for a chunk plan.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkPlanResponse {
    pub chunks: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpokenChunk {
    pub index: usize,
    pub text: String,
    /// Base64-encoded WAV audio.
    pub audio: String,
}

/// Response body for `POST /api/speak`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakResponse {
    pub success: bool,
    pub chunks: Vec<SpokenChunk>,
    pub total: usize,
    pub completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validates text and language before any upstream call is made.
fn validate(text: &str, language: &str) -> Result<Language, ApiError> {
    validate_text(text)?;
    Ok(language.parse::<Language>().map_err(voxrelay_voice::VoiceError::from)?)
}

fn require_speech(state: &AppState) -> Result<(), ApiError> {
    if state.speech.is_configured() {
        Ok(())
    } else {
        Err(ApiError::ServiceUnavailable(
            "speech synthesis credentials are not configured".to_string(),
        ))
    }
}

fn wav_response(audio: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (
                header::CONTENT_DISPOSITION,
                "inline; filename=\"generated_voice.wav\"",
            ),
        ],
        audio,
    )
        .into_response()
}

/// Handler for `POST /api/generate-voice`.
///
/// Synthesizes the whole text in one upstream call and returns the WAV bytes.
pub async fn generate_voice_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<GenerateVoiceRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?;
    let language = validate(&request.text, &request.language)?;
    require_speech(&state)?;

    let audio = state.speech.synthesize(&request.text, language).await?;
    tracing::info!(
        language = language.code(),
        bytes = audio.len(),
        "generated voice"
    );
    Ok(wav_response(audio))
}

/// Handler for `POST /api/generate-voice-chunked`.
///
/// Text that fits in one chunk is synthesized directly. Longer text is
/// returned as a chunk plan for the client to synthesize piece by piece
/// through `/api/generate-voice`.
pub async fn generate_voice_chunked_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<GenerateVoiceRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?;
    let language = validate(&request.text, &request.language)?;
    require_speech(&state)?;

    let chunks = split_for_speech(&request.text, state.max_chunk_chars);
    if chunks.len() <= 1 {
        let audio = state.speech.synthesize(&request.text, language).await?;
        return Ok(wav_response(audio));
    }

    let total = chunks.len();
    tracing::debug!(total, language = language.code(), "planned speech chunks");
    Ok(Json(ChunkPlanResponse { chunks, total }).into_response())
}

/// Handler for `POST /api/speak`.
///
/// Chunks the text and synthesizes every chunk in order. Synthesis stops at
/// the first failing chunk; the response then carries the chunks rendered so
/// far, the error, and a status mapped from the failure.
pub async fn speak_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SpeakRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?;
    let language = validate(&request.text, &request.language)?;
    require_speech(&state)?;

    // A caller may shrink chunks, but never below the floor nor above the
    // configured size.
    let ceiling = state.max_chunk_chars.max(MIN_SPEAK_CHUNK_CHARS);
    let max_chunk_chars = request
        .max_chunk_chars
        .map_or(ceiling, |n| n.clamp(MIN_SPEAK_CHUNK_CHARS, ceiling));
    let chunks = split_for_speech(&request.text, max_chunk_chars);
    if chunks.len() > state.max_speak_chunks {
        return Err(ApiError::BadRequest(format!(
            "text needs {} chunks at {} characters each (limit: {} chunks)",
            chunks.len(),
            max_chunk_chars,
            state.max_speak_chunks
        )));
    }
    let outcome = synthesize_chunks(state.speech.as_ref(), &chunks, language).await;

    let engine = base64::engine::general_purpose::STANDARD;
    let spoken: Vec<SpokenChunk> = outcome
        .chunks
        .into_iter()
        .map(|c| SpokenChunk {
            index: c.index,
            text: c.text,
            audio: engine.encode(&c.audio),
        })
        .collect();
    let completed = spoken.len();

    let (status, error) = match outcome.failure {
        None => (StatusCode::OK, None),
        Some((index, err)) => {
            let api_err = ApiError::from(err);
            (
                api_err.status(),
                Some(format!("chunk {}: {}", index, api_err.message())),
            )
        }
    };

    let body = SpeakResponse {
        success: error.is_none(),
        chunks: spoken,
        total: outcome.total,
        completed,
        error,
    };
    Ok((status, Json(body)).into_response())
}
