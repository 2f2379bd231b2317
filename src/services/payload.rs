//! Defensive readers for generation-service payloads.
//!
//! Nothing here fails on an unexpected shape: missing fields read as empty,
//! entries that cannot be interpreted are skipped.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOptions {
    pub term: String,
    pub correct: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSentences {
    pub word: String,
    pub sentences: Vec<String>,
    pub correct_index: usize,
}

/// Returns `payload[field]` when it is an array, otherwise the whole payload.
pub fn list_field_or_passthrough(payload: Value, field: &str) -> Value {
    match payload.get(field) {
        Some(list @ Value::Array(_)) => list.clone(),
        _ => payload,
    }
}

pub fn text_field(entry: &Value, field: &str) -> String {
    entry.get(field).and_then(scalar_text).unwrap_or_default()
}

pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    }
}

pub fn index_field(entry: &Value, field: &str) -> usize {
    match entry.get(field) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .map(|n| n as usize)
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub fn questions(payload: &Value) -> &[Value] {
    payload
        .get("questions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn parse_distractor_questions(payload: &Value) -> Vec<GeneratedOptions> {
    questions(payload)
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| GeneratedOptions {
            term: text_field(entry, "term"),
            correct: text_field(entry, "correct"),
            options: string_list(entry.get("options")),
        })
        .collect()
}

pub fn parse_sentence_questions(payload: &Value) -> Vec<GeneratedSentences> {
    questions(payload)
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| GeneratedSentences {
            word: text_field(entry, "word"),
            sentences: string_list(entry.get("sentences")),
            correct_index: index_field(entry, "correct_index"),
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
