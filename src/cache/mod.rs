pub mod codec;

use serde::Serialize;

/// Generated content persisted on a study item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSlot {
    McqOptions,
    SentenceOptions,
}

impl CacheSlot {
    pub fn column(self) -> &'static str {
        match self {
            CacheSlot::McqOptions => "mcq_options",
            CacheSlot::SentenceOptions => "sentence_options",
        }
    }
}

/// A slot counts as present only when it decodes to at least one entry.
/// Blank or corrupt payloads read as a miss and get regenerated.
pub fn read_slot(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    let values = codec::decode(raw);
    if values.is_empty() {
        if !raw.trim().is_empty() {
            tracing::debug!(payload_len = raw.len(), "unreadable cache payload, treating as miss");
        }
        return None;
    }
    Some(values)
}

pub fn write_slot(values: &[String]) -> String {
    codec::encode(values)
}
