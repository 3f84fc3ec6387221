//! Fake upstreams and request helpers shared by the API tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use voxrelay_server::{app, AppState};
use voxrelay_types::{ConversationTurn, Language};
use voxrelay_voice::{ConversationModel, SpeechSynthesizer, VoiceError};

/// Speech fake. Returns a tiny WAV-like payload, or fails on any chunk
/// containing `fail_marker`.
pub struct FakeSpeech {
    pub configured: bool,
    pub fail_marker: Option<&'static str>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(String, Language)>>,
}

impl FakeSpeech {
    pub fn ready() -> Self {
        Self {
            configured: true,
            fail_marker: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::ready()
        }
    }

    pub fn failing_on(marker: &'static str) -> Self {
        Self {
            fail_marker: Some(marker),
            ..Self::ready()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((text.to_string(), language));
        if self.fail_marker.is_some_and(|m| text.contains(m)) {
            return Err(VoiceError::Upstream {
                service: "speech",
                status: Some(500),
                message: "synthesis backend exploded".into(),
            });
        }
        let mut audio = b"RIFF".to_vec();
        audio.extend_from_slice(text.as_bytes());
        Ok(audio)
    }
}

/// Conversation fake with a canned reply or error.
pub struct FakeConversation {
    pub configured: bool,
    pub reply: Result<String, fn() -> VoiceError>,
    pub calls: AtomicUsize,
    pub last_history: Mutex<Vec<ConversationTurn>>,
    pub last_max_reply_tokens: Mutex<Option<u32>>,
}

impl FakeConversation {
    pub fn replying(reply: &str) -> Self {
        Self {
            configured: true,
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_history: Mutex::new(Vec::new()),
            last_max_reply_tokens: Mutex::new(None),
        }
    }

    pub fn failing(err: fn() -> VoiceError) -> Self {
        Self {
            reply: Err(err),
            ..Self::replying("")
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying("unused")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationModel for FakeConversation {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn converse(
        &self,
        _message: &str,
        history: &[ConversationTurn],
        max_reply_tokens: Option<u32>,
    ) -> Result<String, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_history.lock().unwrap() = history.to_vec();
        *self.last_max_reply_tokens.lock().unwrap() = max_reply_tokens;
        if !self.configured {
            return Err(VoiceError::Config("GEMINI_API_KEY is not set".into()));
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

pub fn build_app(
    speech: Arc<FakeSpeech>,
    conversation: Arc<FakeConversation>,
    max_chunk_chars: usize,
) -> axum::Router {
    app(AppState {
        speech,
        conversation,
        max_chunk_chars,
        max_speak_chunks: 50,
        client_dir: None,
    })
}

pub async fn post_json(app: axum::Router, uri: &str, body: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get(app: axum::Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
