//! Exercises the HTTP clients against a local mock of each upstream.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64::Engine;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voxrelay_types::{ConversationTurn, Language};
use voxrelay_voice::{
    CloudflareTts, ConversationConfig, ConversationModel, ErrorKind, GeminiClient, SpeechConfig,
    SpeechSynthesizer, VoiceError,
};

#[derive(Clone, Default)]
struct Recorded {
    last: Arc<Mutex<Option<(HeaderMap, String, Value)>>>,
}

impl Recorded {
    fn take(&self) -> (HeaderMap, String, Value) {
        self.last.lock().unwrap().take().expect("no request recorded")
    }
}

/// Starts `router` on an ephemeral port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn wav_bytes() -> Vec<u8> {
    let mut wav = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
    wav.extend_from_slice(&[0u8; 24]);
    wav
}

async fn mock_cloudflare(status: StatusCode, body: Value) -> (String, Recorded) {
    let recorded = Recorded::default();
    let router = Router::new()
        .route(
            "/client/v4/accounts/{account}/ai/run/{*model}",
            post(
                move |State(rec): State<Recorded>,
                      Path((account, model)): Path<(String, String)>,
                      headers: HeaderMap,
                      Json(payload): Json<Value>| {
                    let body = body.clone();
                    async move {
                        *rec.last.lock().unwrap() =
                            Some((headers, format!("{}/{}", account, model), payload));
                        (status, Json(body)).into_response()
                    }
                },
            ),
        )
        .with_state(recorded.clone());
    (format!("{}/client/v4", serve(router).await), recorded)
}

async fn mock_gemini(status: StatusCode, body: Value) -> (String, Recorded) {
    let recorded = Recorded::default();
    let router = Router::new()
        .route(
            "/v1beta/models/{model}",
            post(
                move |State(rec): State<Recorded>,
                      Path(model): Path<String>,
                      headers: HeaderMap,
                      Json(payload): Json<Value>| {
                    let body = body.clone();
                    async move {
                        *rec.last.lock().unwrap() = Some((headers, model, payload));
                        (status, Json(body)).into_response()
                    }
                },
            ),
        )
        .with_state(recorded.clone());
    (format!("{}/v1beta", serve(router).await), recorded)
}

fn speech_client(api_base: String) -> CloudflareTts {
    let mut config = SpeechConfig::new("acct-123", "cf-token");
    config.api_base = api_base;
    config.timeout_seconds = 5;
    CloudflareTts::new(config).unwrap()
}

fn conversation_client(api_base: String) -> GeminiClient {
    let mut config = ConversationConfig::new("gemini-key");
    config.api_base = api_base;
    config.timeout_seconds = 5;
    GeminiClient::new(config).unwrap()
}

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_synthesize_decodes_audio() {
    let audio = wav_bytes();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&audio);
    let (base, recorded) = mock_cloudflare(
        StatusCode::OK,
        json!({ "result": { "audio": encoded }, "success": true, "errors": [] }),
    )
    .await;

    let bytes = speech_client(base)
        .synthesize("Hello world", Language::Jp)
        .await
        .expect("synthesis should succeed");
    assert_eq!(bytes, audio);

    let (headers, path, payload) = recorded.take();
    assert_eq!(path, "acct-123/@cf/myshell-ai/melotts");
    assert_eq!(headers["authorization"], "Bearer cf-token");
    assert_eq!(payload, json!({ "prompt": "Hello world", "lang": "ja" }));
}

#[tokio::test]
async fn test_synthesize_surfaces_upstream_message() {
    let (base, _) = mock_cloudflare(
        StatusCode::UNAUTHORIZED,
        json!({ "success": false, "errors": [{ "code": 10000, "message": "Authentication error" }] }),
    )
    .await;

    let err = speech_client(base)
        .synthesize("Hello", Language::En)
        .await
        .unwrap_err();
    match err {
        VoiceError::Upstream {
            status, message, ..
        } => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "Authentication error");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_synthesize_rejects_missing_audio() {
    let (base, _) = mock_cloudflare(StatusCode::OK, json!({ "result": {}, "success": true })).await;
    let err = speech_client(base)
        .synthesize("Hello", Language::En)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(err.to_string().contains("no audio"), "{}", err);
}

#[tokio::test]
async fn test_synthesize_rejects_invalid_base64() {
    let (base, _) = mock_cloudflare(
        StatusCode::OK,
        json!({ "result": { "audio": "***not base64***" }, "success": true }),
    )
    .await;
    let err = speech_client(base)
        .synthesize("Hello", Language::En)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[tokio::test]
async fn test_synthesize_unreachable_upstream() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = speech_client(format!("http://{}/client/v4", addr))
        .synthesize("Hello", Language::En)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[tokio::test]
async fn test_synthesize_times_out() {
    let router = Router::new().route(
        "/client/v4/accounts/{account}/ai/run/{*model}",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let base = format!("{}/client/v4", serve(router).await);

    let mut config = SpeechConfig::new("acct", "token");
    config.api_base = base;
    config.timeout_seconds = 1;
    let err = CloudflareTts::new(config)
        .unwrap()
        .synthesize("Hello", Language::En)
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::Timeout { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_converse_returns_reply_unchanged() {
    let (base, recorded) = mock_gemini(StatusCode::OK, gemini_reply("Hi there!")).await;

    let reply = conversation_client(base)
        .converse("Hello", &[], None)
        .await
        .expect("conversation should succeed");
    assert_eq!(reply, "Hi there!");

    let (headers, model, payload) = recorded.take();
    assert_eq!(model, "gemini-2.0-flash:generateContent");
    assert_eq!(headers["x-goog-api-key"], "gemini-key");
    assert_eq!(payload["contents"][0]["parts"][0]["text"], "User: Hello");
    assert_eq!(payload["generationConfig"]["maxOutputTokens"], 250);
}

#[tokio::test]
async fn test_converse_sends_per_call_token_limit() {
    let (base, recorded) = mock_gemini(StatusCode::OK, gemini_reply("Sure.")).await;

    conversation_client(base)
        .converse("Keep it short", &[], Some(40))
        .await
        .unwrap();

    let (_, _, payload) = recorded.take();
    assert_eq!(payload["generationConfig"]["maxOutputTokens"], 40);
}

#[tokio::test]
async fn test_converse_sends_history_in_order() {
    let (base, recorded) = mock_gemini(StatusCode::OK, gemini_reply("4.")).await;
    let history = vec![
        ConversationTurn::user("Can you do math?"),
        ConversationTurn::assistant("Sure, try me."),
    ];

    let reply = conversation_client(base)
        .converse("What's 2+2?", &history, None)
        .await
        .unwrap();
    assert_eq!(reply, "4.");

    let (_, _, payload) = recorded.take();
    let prompt = payload["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert_eq!(
        prompt,
        "Previous conversation:\nUser: Can you do math?\nAssistant: Sure, try me.\n\nUser: What's 2+2?"
    );
}

#[tokio::test]
async fn test_converse_cleans_markdown() {
    let (base, _) = mock_gemini(
        StatusCode::OK,
        gemini_reply("**Great** question!!\n- first\n- second"),
    )
    .await;
    let reply = conversation_client(base).converse("Hi", &[], None).await.unwrap();
    assert_eq!(reply, "Great question! first second");
}

#[tokio::test]
async fn test_converse_joins_multiple_parts() {
    let (base, _) = mock_gemini(
        StatusCode::OK,
        json!({ "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "again." }] } }] }),
    )
    .await;
    let reply = conversation_client(base).converse("Hi", &[], None).await.unwrap();
    assert_eq!(reply, "Hello again.");
}

#[tokio::test]
async fn test_converse_missing_content_is_upstream_error() {
    let (base, _) = mock_gemini(
        StatusCode::OK,
        json!({ "candidates": [], "promptFeedback": { "blockReason": "SAFETY" } }),
    )
    .await;
    let err = conversation_client(base).converse("Hi", &[], None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[tokio::test]
async fn test_converse_surfaces_upstream_status() {
    let (base, _) = mock_gemini(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" } }),
    )
    .await;
    let err = conversation_client(base).converse("Hi", &[], None).await.unwrap_err();
    match err {
        VoiceError::Upstream {
            status, message, ..
        } => {
            assert_eq!(status, Some(429));
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}
