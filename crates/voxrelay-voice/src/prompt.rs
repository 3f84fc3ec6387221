//! Prompt assembly for the conversation model.

use voxrelay_types::ConversationTurn;

/// System instruction used unless the configuration overrides it.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are a friendly, encouraging voice assistant talking with someone face to face. \
Your words are converted to speech, so follow these rules:
- Keep replies brief and conversational, usually one to three sentences.
- Never use markdown, bullet points, asterisks or other special characters.
- Use simple, clear language and ask a short follow-up question when it helps.
- Use commas for short pauses and periods for medium pauses.
- Use \"...\" for a longer pause, for example while the listener thinks.
- When listing vocabulary words, put a long pause of many dots (\".........\") after each word \
so the listener has time to repeat it.";

/// Appended to the prompt when the user asks for vocabulary practice.
pub const VOCABULARY_HINT: &str =
    "[TEACHING MODE: User wants vocabulary practice. Use LONG pauses (..........) between each word!]";

const VOCABULARY_KEYWORDS: [&str; 8] = [
    "list of words",
    "give me words",
    "vocabulary words",
    "practice words",
    "word list",
    "some words",
    "quiz me",
    "test me",
];

/// Whether the message asks for a word list or a quiz.
pub fn wants_vocabulary_practice(message: &str) -> bool {
    let lower = message.to_lowercase();
    VOCABULARY_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Renders the user-side prompt: the last `max_turns` turns of `history` in
/// chronological order, followed by the new message.
pub fn build_prompt(message: &str, history: &[ConversationTurn], max_turns: usize) -> String {
    let recent = &history[history.len().saturating_sub(max_turns)..];

    let mut prompt = String::new();
    if !recent.is_empty() {
        prompt.push_str("Previous conversation:\n");
        for turn in recent {
            prompt.push_str(turn.role.label());
            prompt.push_str(": ");
            prompt.push_str(&turn.text);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str("User: ");
    prompt.push_str(message);

    if wants_vocabulary_practice(message) {
        prompt.push('\n');
        prompt.push_str(VOCABULARY_HINT);
    }

    prompt
}
