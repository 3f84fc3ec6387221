//! Shared types for the voxrelay service.
//!
//! This crate holds the domain vocabulary used by both the upstream clients
//! (`voxrelay-voice`) and the HTTP surface (`voxrelay-server`): conversation
//! turns, supported speech languages, and the readiness report returned by
//! the health probe.
//!
//! Nothing in here performs I/O. Everything is plain data with serde derives
//! matching the JSON the browser front end sends and receives.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human speaking to the assistant.
    User,
    /// A previous reply generated by the language model.
    #[serde(alias = "model")]
    Assistant,
}

impl Role {
    /// Speaker label used when the history is rendered into a prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// One message in a conversation.
///
/// Turns are never mutated after construction; a history is rebuilt from the
/// caller-supplied JSON on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    /// The spoken or generated text. Older front ends send this as `content`.
    #[serde(alias = "content")]
    pub text: String,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// Chronologically ordered conversation turns, oldest first.
pub type ConversationHistory = Vec<ConversationTurn>;

/// Readiness of each upstream dependency, derived from configuration only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceReadiness {
    /// Speech synthesis credentials are present.
    pub speech: bool,
    /// Conversation model credentials are present.
    pub conversation: bool,
}

mod voice;
pub use voice::{Language, LanguageError};
