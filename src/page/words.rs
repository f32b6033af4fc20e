// src/page/words.rs
// =============================================================================
// Pulls countable words out of page text.
//
// Steps for each piece of text:
// 1. Decode literal "\uXXXX" sequences some pages ship in their text
//    (surrogate pairs are combined, anything undecodable is left as-is)
// 2. Match words: runs of Unicode letters, digits and underscores
// 3. Drop words containing '_' (identifiers, not prose)
// 4. Keep words whose length in characters is within the configured range
//
// HTML entities (&amp; and friends) are already decoded by the HTML parser.
// =============================================================================

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

// Which word lengths get counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRules {
    pub min_len: usize,
    // None = no upper bound
    pub max_len: Option<usize>,
}

impl Default for WordRules {
    fn default() -> Self {
        Self {
            min_len: 10,
            max_len: None,
        }
    }
}

impl WordRules {
    pub fn accepts(&self, len: usize) -> bool {
        len >= self.min_len && self.max_len.map_or(true, |max| len <= max)
    }
}

// Both patterns are constants, so compiling them can't fail at runtime.
fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[\p{L}\d_]+").expect("word pattern is valid"))
}

fn escape_pattern() -> &'static Regex {
    static ESCAPE: OnceLock<Regex> = OnceLock::new();
    ESCAPE.get_or_init(|| {
        Regex::new(
            r"\\u([dD][89abAB][0-9a-fA-F]{2})\\u([dD][c-fC-F][0-9a-fA-F]{2})|\\u([0-9a-fA-F]{4})",
        )
        .expect("escape pattern is valid")
    })
}

fn hex(digits: &str) -> Option<u32> {
    u32::from_str_radix(digits, 16).ok()
}

// Replaces literal \uXXXX sequences with the characters they name
//
// Example:
//   r"A\u0022H\u2318Z" -> "A\"H⌘Z"
pub fn decode_unicode_escapes(text: &str) -> Cow<'_, str> {
    escape_pattern().replace_all(text, |caps: &Captures| {
        let decoded = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(high), Some(low), _) => hex(high.as_str())
                .zip(hex(low.as_str()))
                .and_then(|(h, l)| char::from_u32(0x10000 + ((h - 0xD800) << 10) + (l - 0xDC00))),
            (_, _, Some(single)) => hex(single.as_str()).and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(c) => c.to_string(),
            // Lone surrogates have no character; keep the original text.
            None => caps[0].to_string(),
        }
    })
}

// Adds every acceptable word in `text` to `counts`
pub fn count_words(text: &str, rules: &WordRules, counts: &mut HashMap<String, u64>) {
    let text = decode_unicode_escapes(text);
    for found in word_pattern().find_iter(&text) {
        let word = found.as_str();
        if word.contains('_') || !rules.accepts(word.chars().count()) {
            continue;
        }
        match counts.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                counts.insert(word.to_string(), 1);
            }
        }
    }
}
