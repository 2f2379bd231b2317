use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::config::env_u64;

const DEFAULT_MAX_CHARS: usize = 10_000;
const DEFAULT_MAX_WORDS: usize = 1_000;
const DEFAULT_FALLBACK_LIMIT: usize = 200;
const FALLBACK_LEVEL: &str = "easy";
const MIN_TOKEN_CHARS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct DocumentLimits {
    pub max_chars: usize,
    pub max_words: usize,
    pub fallback_limit: usize,
}

impl DocumentLimits {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_chars: env_u64("DOCUMENT_MAX_CHARS").map(|v| v as usize).unwrap_or(defaults.max_chars),
            max_words: env_u64("DOCUMENT_MAX_WORDS").map(|v| v as usize).unwrap_or(defaults.max_words),
            fallback_limit: env_u64("CLASSIFY_FALLBACK_LIMIT")
                .map(|v| v as usize)
                .unwrap_or(defaults.fallback_limit),
        }
    }
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_words: DEFAULT_MAX_WORDS,
            fallback_limit: DEFAULT_FALLBACK_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordLevel {
    pub word: String,
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is empty")]
    Empty,
    #[error("could not read document: {0}")]
    Unreadable(String),
}

/// Turns an uploaded document into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Empty);
        }
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Unreadable(e.to_string()))
    }
}

pub fn word_count_estimate(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cuts text down to what is sent upstream: first `max_chars` characters, then
/// at most `max_words` whitespace-separated words.
pub fn limit_text(text: &str, limits: &DocumentLimits) -> String {
    let clipped: String = match text.char_indices().nth(limits.max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    };

    if word_count_estimate(&clipped) > limits.max_words {
        clipped
            .split_whitespace()
            .take(limits.max_words)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        clipped
    }
}

/// Local stand-in for the classifier: distinct tokens of the text in reading
/// order, all labelled with the default level.
pub fn fallback_classification(text: &str, limit: usize) -> Vec<WordLevel> {
    let cleaned: String = text
        .chars()
        .map(|ch| if is_token_char(ch) || ch.is_whitespace() { ch } else { ' ' })
        .collect();

    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for token in cleaned.split_whitespace() {
        if words.len() >= limit {
            break;
        }
        if token.chars().count() < MIN_TOKEN_CHARS {
            continue;
        }
        if seen.insert(token) {
            words.push(WordLevel {
                word: token.to_string(),
                level: FALLBACK_LEVEL.to_string(),
            });
        }
    }
    words
}

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ('\u{00C0}'..='\u{1EF9}').contains(&ch)
}
