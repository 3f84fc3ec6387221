//! Normalising model output before it is spoken.
//!
//! Language models like to answer in markdown. Read aloud, asterisks and
//! list bullets are noise, so replies are flattened to plain sentences
//! while dot runs are kept as pacing cues: three dots for a pause, a long
//! run for the extended pause used between vocabulary words.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Replacement for a run of nine or more dots.
pub const LONG_PAUSE: &str = "..............";

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.+?)`").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*[-*•]\s+").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static MISSING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])([A-Z])").unwrap());
static DOT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3,}").unwrap());
static BANGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").unwrap());
static QUESTIONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?{2,}").unwrap());
static SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#@$%^&*_+=\[\]{}|\\<>~]").unwrap());
static SPACE_BEFORE_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\.").unwrap());

/// Strips formatting from `text` and normalises punctuation for speech.
pub fn clean_for_speech(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = CODE.replace_all(&text, "$1");

    let text = BULLET.replace_all(&text, "");
    let text = NUMBERED.replace_all(&text, "");

    let text = WHITESPACE.replace_all(&text, " ");
    let text = MISSING_SPACE.replace_all(&text, "$1 $2");

    let text = DOT_RUN.replace_all(&text, |caps: &Captures<'_>| {
        if caps[0].len() >= 9 {
            LONG_PAUSE
        } else {
            "..."
        }
    });
    let text = BANGS.replace_all(&text, "!");
    let text = QUESTIONS.replace_all(&text, "?");

    let text = SYMBOLS.replace_all(&text, "");
    let text = SPACE_BEFORE_DOT.replace_all(&text, ".");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_replies_pass_through() {
        assert_eq!(clean_for_speech("4."), "4.");
        assert_eq!(clean_for_speech("Hi there!"), "Hi there!");
        assert_eq!(
            clean_for_speech("That's right... want another one?"),
            "That's right... want another one?"
        );
    }

    #[test]
    fn strips_markdown_emphasis_and_code() {
        assert_eq!(
            clean_for_speech("The word **ubiquitous** means *everywhere*, like `air`."),
            "The word ubiquitous means everywhere, like air."
        );
    }

    #[test]
    fn strips_list_markers() {
        let text = "Try these:\n- apple\n* banana\n1. cherry\n2. date";
        assert_eq!(clean_for_speech(text), "Try these: apple banana cherry date");
    }

    #[test]
    fn inserts_space_after_sentence_end() {
        assert_eq!(clean_for_speech("Great job.Next one!Ready?Go"), "Great job. Next one! Ready? Go");
    }

    #[test]
    fn normalises_dot_runs() {
        assert_eq!(clean_for_speech("Well.... okay"), "Well... okay");
        assert_eq!(clean_for_speech("first.........second"), format!("first{LONG_PAUSE}second"));
        assert_eq!(
            clean_for_speech("word.................................next"),
            format!("word{LONG_PAUSE}next")
        );
    }

    #[test]
    fn collapses_repeated_marks() {
        assert_eq!(clean_for_speech("Wow!!! Really???"), "Wow! Really?");
    }

    #[test]
    fn removes_symbols_and_space_before_dots() {
        assert_eq!(clean_for_speech("50% of #people <3 this ."), "50 of people 3 this.");
        assert_eq!(clean_for_speech("hmm ... yes"), "hmm... yes");
    }

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(clean_for_speech("  hello \n\n  world  "), "hello world");
    }
}
