//! API error type and the stateless informational handlers.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use voxrelay_types::{Language, ServiceReadiness};
use voxrelay_voice::{ErrorKind, VoiceError};

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller.
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::BadGateway(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::InternalServerError(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message()
        }));

        (self.status(), body).into_response()
    }
}

impl From<VoiceError> for ApiError {
    /// Upstream detail is logged here and replaced by a generic message; the
    /// caller only learns which service failed and its HTTP status.
    fn from(err: VoiceError) -> Self {
        match err.kind() {
            ErrorKind::Validation => ApiError::BadRequest(err.to_string()),
            ErrorKind::Configuration => {
                tracing::warn!("request rejected, service not configured: {}", err);
                ApiError::ServiceUnavailable(err.to_string())
            }
            ErrorKind::Upstream => {
                tracing::error!("upstream failure: {}", err);
                let message = match &err {
                    VoiceError::Upstream {
                        service,
                        status: Some(status),
                        ..
                    } => format!("{} service request failed (upstream status {})", service, status),
                    VoiceError::Upstream { service, .. } => {
                        format!("{} service request failed", service)
                    }
                    _ => "upstream request failed".to_string(),
                };
                ApiError::BadGateway(message)
            }
            ErrorKind::Timeout => {
                tracing::error!("upstream timeout: {}", err);
                let message = match &err {
                    VoiceError::Timeout { service, .. } => {
                        format!("{} service timed out, please try again", service)
                    }
                    _ => "request timed out, please try again".to_string(),
                };
                ApiError::GatewayTimeout(message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Unwraps an optional JSON body extraction, turning rejections into
/// `400 Bad Request` with a JSON error body.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(ApiError::from)
}

/// Response body for `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub services: ServiceReadiness,
}

/// Handler for `GET /api/health`.
///
/// Readiness is derived from configuration only; no upstream is contacted.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        services: state.readiness(),
    })
}

/// Handler for `GET /api/voices`.
pub async fn voices_handler() -> Json<Value> {
    let mut languages = Map::new();
    let mut speakers = Map::new();
    for lang in Language::ALL {
        languages.insert(lang.code().to_string(), json!(lang.display_name()));
        speakers.insert(lang.code().to_string(), json!(lang.speakers()));
    }
    Json(json!({
        "languages": languages,
        "speakers": speakers,
    }))
}
