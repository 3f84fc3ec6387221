use std::time::Duration;
use thiserror::Error;
use voxrelay_types::LanguageError;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    UnsupportedLanguage(#[from] LanguageError),

    #[error("not configured: {0}")]
    Config(String),

    #[error("{service} upstream error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{service} upstream timed out after {} seconds", .after.as_secs())]
    Timeout {
        service: &'static str,
        after: Duration,
    },
}

/// Coarse classification used to pick an HTTP status at the router boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input. Never retried.
    Validation,
    /// A credential is missing; fixed only by redeploying with configuration.
    Configuration,
    /// The upstream answered with a failure or an unusable payload.
    Upstream,
    /// The upstream did not answer within the client timeout.
    Timeout,
}

impl VoiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::UnsupportedLanguage(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Converts a transport failure from `reqwest` into an upstream error.
    pub(crate) fn from_transport(
        service: &'static str,
        timeout: Duration,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                service,
                after: timeout,
            }
        } else {
            Self::Upstream {
                service,
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            status: None,
            message: message.into(),
        }
    }
}
