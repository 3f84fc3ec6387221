//! voxrelay server library logic.
//!
//! A stateless HTTP relay between a browser voice front end and two cloud
//! AI services. Every request is handled on its own: the conversation
//! history arrives with the request and is dropped once the reply is sent.

pub mod api;
pub mod api_chat;
pub mod api_voice;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use voxrelay_types::ServiceReadiness;
use voxrelay_voice::{
    CloudflareTts, ConversationModel, GeminiClient, SpeechSynthesizer, VoiceError,
};

/// Application state shared across all request handlers.
///
/// Immutable after startup; handlers only read from it.
#[derive(Clone)]
pub struct AppState {
    /// Speech synthesis upstream.
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Conversation model upstream.
    pub conversation: Arc<dyn ConversationModel>,
    /// Default maximum characters per speech chunk.
    pub max_chunk_chars: usize,
    /// Most chunks one `/api/speak` request may synthesize.
    pub max_speak_chunks: usize,
    /// Directory of the browser front end, if it should be served.
    pub client_dir: Option<String>,
}

impl AppState {
    /// Builds the production clients from configuration.
    pub fn from_config(config: &config::Config) -> Result<Self, VoiceError> {
        let speech = CloudflareTts::new(config.speech.clone())?;
        let conversation = GeminiClient::new(config.conversation.clone())?;
        Ok(Self {
            speech: Arc::new(speech),
            conversation: Arc::new(conversation),
            max_chunk_chars: config.chunking.max_chunk_chars,
            max_speak_chunks: config.chunking.max_speak_chunks,
            client_dir: Some(config.server.client_dir.clone()),
        })
    }

    /// Which upstreams have credentials, read fresh from the clients.
    pub fn readiness(&self) -> ServiceReadiness {
        ServiceReadiness {
            speech: self.speech.is_configured(),
            conversation: self.conversation.is_configured(),
        }
    }
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(api::health_handler))
        .route("/api/voices", get(api::voices_handler))
        .route("/api/chat", post(api_chat::chat_handler))
        .route(
            "/api/generate-voice",
            post(api_voice::generate_voice_handler),
        )
        .route(
            "/api/generate-voice-chunked",
            post(api_voice::generate_voice_chunked_handler),
        )
        .route("/api/speak", post(api_voice::speak_handler));

    // Serve the browser front end if the directory exists.
    let router = match state.client_dir.as_deref() {
        Some(dir) if Path::new(dir).join("index.html").exists() => {
            tracing::info!(path = %dir, "serving client static files");
            let index = Path::new(dir).join("index.html");
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        Some(dir) => {
            tracing::info!(path = %dir, "client directory not found, skipping static file serving");
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
