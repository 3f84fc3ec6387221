//! Upstream voice services for voxrelay.
//!
//! Wraps the two remote AI services the relay depends on: a speech
//! synthesis model that turns text into WAV audio, and a generative
//! language model that produces conversational replies. Both sit behind
//! small traits ([`SpeechSynthesizer`], [`ConversationModel`]) so the HTTP
//! layer can be exercised against fakes.
//!
//! Also home to the text handling that surrounds those calls: splitting
//! long replies into speakable chunks, cleaning model output for speech,
//! and assembling the conversation prompt.
//!
//! Every call is a single attempt with a bounded timeout. Nothing is cached
//! and no conversation state is kept between calls.

pub mod chat;
pub mod chunk;
pub mod clean;
pub mod config;
pub mod error;
pub mod prompt;
pub mod tts;

pub use chat::{ConversationModel, GeminiClient};
pub use chunk::{chunks, split_for_speech, Chunks, DEFAULT_MAX_CHUNK_CHARS};
pub use clean::clean_for_speech;
pub use config::{ConversationConfig, SpeechConfig};
pub use error::{ErrorKind, VoiceError};
pub use tts::{
    synthesize_chunks, validate_text, ChunkedSynthesis, CloudflareTts, SpeechSynthesizer,
    SynthesizedChunk,
};
