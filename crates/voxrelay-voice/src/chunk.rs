//! Splitting reply text into speakable chunks.
//!
//! Long replies are synthesized piecewise so the browser can start playing
//! the first sentence while later ones are still being rendered, and can
//! stop fetching as soon as the user interrupts.
//!
//! A chunk never exceeds the configured number of characters. Within that
//! window the split point is, in order of preference:
//!
//! 1. just after the last sentence terminator (`.`, `!`, `?`) followed by
//!    whitespace, or the last full-width terminator (`。`, `！`, `？`),
//! 2. just after the last clause separator (`,`, `;`, `:`) followed by
//!    whitespace, or the last full-width separator,
//! 3. before the last whitespace character,
//! 4. a hard cut at the window edge.
//!
//! Whitespace at split points is dropped, so joining the chunks with single
//! spaces gives back the input up to whitespace normalisation (hard cuts
//! excepted).

/// Default upper bound on chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 100;

/// Iterator over the chunks of a text. Clone it to restart.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

/// Returns an iterator over `text` split into chunks of at most `max_chars`
/// characters. A `max_chars` of zero is treated as one.
pub fn chunks(text: &str, max_chars: usize) -> Chunks<'_> {
    Chunks {
        rest: text,
        max_chars: max_chars.max(1),
    }
}

/// Collects [`chunks`] into owned strings.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    chunks(text, max_chars).map(str::to_owned).collect()
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_clause_end(c: char) -> bool {
    matches!(c, ',' | ';' | ':')
}

// Full-width punctuation is not followed by a space in CJK text.
fn is_cjk_sentence_end(c: char) -> bool {
    matches!(c, '。' | '！' | '？')
}

fn is_cjk_clause_end(c: char) -> bool {
    matches!(c, '、' | '，' | '；')
}

/// Byte offset at which `rest` should be cut, given that the first
/// `window_end` bytes hold exactly the allowed number of characters.
fn split_point(rest: &str, window_end: usize) -> usize {
    let mut sentence = None;
    let mut clause = None;
    let mut space = None;

    for (i, c) in rest[..window_end].char_indices() {
        if c.is_whitespace() {
            if i > 0 {
                space = Some(i);
            }
            continue;
        }
        let end = i + c.len_utf8();
        if is_cjk_sentence_end(c) {
            sentence = Some(end);
            continue;
        }
        if is_cjk_clause_end(c) {
            clause = Some(end);
            continue;
        }
        let followed_by_gap = rest[end..].chars().next().map_or(true, char::is_whitespace);
        if !followed_by_gap {
            continue;
        }
        if is_sentence_end(c) {
            sentence = Some(end);
        } else if is_clause_end(c) {
            clause = Some(end);
        }
    }

    sentence.or(clause).or(space).unwrap_or(window_end)
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest.trim_start();
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        let Some((window_end, _)) = rest.char_indices().nth(self.max_chars) else {
            self.rest = "";
            return Some(rest.trim_end());
        };

        let (head, tail) = rest.split_at(split_point(rest, window_end));
        self.rest = tail;
        Some(head.trim_end())
    }
}
