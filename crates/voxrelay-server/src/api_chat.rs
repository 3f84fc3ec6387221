//! Conversation handler.

use crate::api::{json_body, ApiError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use voxrelay_types::ConversationHistory;
use voxrelay_voice::VoiceError;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Prior turns, oldest first. Round-tripped by the client on every call.
    #[serde(default)]
    pub history: ConversationHistory,
    /// Caps the reply length for this call.
    #[serde(default, rename = "maxReplyTokens")]
    pub max_reply_tokens: Option<u32>,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Chat errors are reported as `{success: false, error}` rather than the
/// plain `{error}` body used elsewhere.
#[derive(Debug)]
pub struct ChatFailure(pub ApiError);

impl From<ApiError> for ChatFailure {
    fn from(err: ApiError) -> Self {
        ChatFailure(err)
    }
}

impl From<VoiceError> for ChatFailure {
    fn from(err: VoiceError) -> Self {
        ChatFailure(err.into())
    }
}

impl IntoResponse for ChatFailure {
    fn into_response(self) -> Response {
        let body = ChatResponse {
            success: false,
            response: None,
            error: Some(self.0.message().to_string()),
        };
        (self.0.status(), Json(body)).into_response()
    }
}

/// Handler for `POST /api/chat`.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatFailure> {
    let request = json_body(payload)?;
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()).into());
    }

    let reply = state
        .conversation
        .converse(
            &request.message,
            &request.history,
            request.max_reply_tokens,
        )
        .await?;
    tracing::info!(
        history = request.history.len(),
        reply_chars = reply.chars().count(),
        "generated chat reply"
    );

    Ok(Json(ChatResponse {
        success: true,
        response: Some(reply),
        error: None,
    }))
}
