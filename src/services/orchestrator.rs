//! Cache-first assembly of generated study content.
//!
//! For a batch of study items the orchestrator serves every populated cache
//! slot directly, asks the generation service once for all the misses, writes
//! whatever comes back into the slots and merges both halves into one answer.
//! Upstream trouble shrinks the answer; it never turns into an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{self, CacheSlot};
use crate::db::{StoreError, StudyItem, StudyItemStore};
use crate::services::document::{self, DocumentLimits, WordLevel};
use crate::services::fanout::{self, Branch};
use crate::services::generation::{ContentGenerator, DistractorPair};
use crate::services::payload::{self, GeneratedSentences};
use crate::services::selector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultipleChoiceQuestion {
    pub term: String,
    pub correct: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceQuestion {
    pub word: String,
    pub sentences: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Classification {
    Upstream(Value),
    Fallback(Vec<WordLevel>),
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentEnrichment {
    #[serde(rename = "rawText")]
    pub raw_text: String,
    #[serde(rename = "wordCountEstimate")]
    pub word_count_estimate: usize,
    pub classify: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classify_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcards: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcards_error: Option<String>,
}

/// Result of a call whose payload is handed to the caller untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Passthrough {
    Available(Value),
    Unavailable { reason: String },
}

impl Passthrough {
    pub fn into_value(self) -> Value {
        match self {
            Passthrough::Available(value) => value,
            Passthrough::Unavailable { reason } => serde_json::json!({
                "available": false,
                "error": reason,
            }),
        }
    }
}

impl From<Branch<Value>> for Passthrough {
    fn from(branch: Branch<Value>) -> Self {
        match branch {
            Branch::Ready(value) => Passthrough::Available(value),
            Branch::Unavailable { reason } => Passthrough::Unavailable { reason },
        }
    }
}

#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    store: Arc<dyn StudyItemStore>,
    generator: Arc<dyn ContentGenerator>,
    branch_timeout: Duration,
    limits: DocumentLimits,
}

impl EnrichmentOrchestrator {
    pub fn new(
        store: Arc<dyn StudyItemStore>,
        generator: Arc<dyn ContentGenerator>,
        branch_timeout: Duration,
        limits: DocumentLimits,
    ) -> Self {
        Self {
            store,
            generator,
            branch_timeout,
            limits,
        }
    }

    pub async fn multiple_choice(
        &self,
        set_id: i64,
        options_count: i32,
    ) -> Result<Vec<MultipleChoiceQuestion>, StoreError> {
        let items = self.store.items_in_set(set_id).await?;

        let mut questions = Vec::new();
        let mut pending = Vec::new();
        let mut pending_by_term: HashMap<&str, usize> = HashMap::new();

        for (idx, item) in items.iter().enumerate() {
            let term = item.term();
            if term.is_empty() {
                continue;
            }
            match item.cached(CacheSlot::McqOptions) {
                Some(options) => questions.push(present_mcq(item, &options, options_count)),
                None => {
                    pending.push(DistractorPair {
                        term: term.to_string(),
                        definition: item.answer().to_string(),
                    });
                    pending_by_term.insert(term, idx);
                }
            }
        }

        let cached = questions.len();
        if pending.is_empty() {
            tracing::debug!(set_id, cached, "multiple choice served from cache");
            return Ok(questions);
        }

        let branch = fanout::bounded(
            "generate-distractors",
            self.branch_timeout,
            self.generator.generate_distractors(&pending, options_count),
        )
        .await;
        let Some(generated) = branch.ready() else {
            tracing::warn!(set_id, cached, missing = pending.len(), "distractors unavailable, serving cached items only");
            return Ok(questions);
        };

        let mut fresh: Vec<(usize, MultipleChoiceQuestion)> = Vec::new();
        let mut handled = HashSet::new();
        for entry in generated {
            let Some(&idx) = pending_by_term.get(entry.term.trim()) else {
                tracing::debug!(set_id, term = %entry.term, "generated entry matches no pending item");
                continue;
            };
            if entry.options.is_empty() || !handled.insert(idx) {
                continue;
            }
            let item = &items[idx];
            if !self.persist(item, CacheSlot::McqOptions, &entry.options).await {
                continue;
            }
            fresh.push((idx, present_mcq(item, &entry.options, options_count)));
        }

        fresh.sort_by_key(|(idx, _)| *idx);
        tracing::info!(
            set_id,
            cached,
            requested = pending.len(),
            generated = fresh.len(),
            "multiple choice assembled"
        );
        questions.extend(fresh.into_iter().map(|(_, q)| q));
        Ok(questions)
    }

    pub async fn sentence_choice(
        &self,
        set_id: i64,
        options_count: i32,
    ) -> Result<Vec<SentenceQuestion>, StoreError> {
        let limit = selector::sentence_option_count(options_count);
        let items = self.store.items_in_set(set_id).await?;

        let mut questions = Vec::new();
        let mut pending = Vec::new();
        let mut pending_by_word: HashMap<&str, usize> = HashMap::new();

        for (idx, item) in items.iter().enumerate() {
            let word = item.term();
            if word.is_empty() {
                continue;
            }
            match item.cached(CacheSlot::SentenceOptions) {
                Some(sentences) => questions.push(SentenceQuestion {
                    word: word.to_string(),
                    sentences: selector::select_sentences(&sentences, limit),
                    correct_index: 0,
                }),
                None => {
                    pending.push(word.to_string());
                    pending_by_word.insert(word, idx);
                }
            }
        }

        let cached = questions.len();
        if pending.is_empty() {
            tracing::debug!(set_id, cached, "sentence choice served from cache");
            return Ok(questions);
        }

        let branch = fanout::bounded(
            "generate-sentences",
            self.branch_timeout,
            self.generator.generate_sentences(&pending, limit),
        )
        .await;
        let Some(generated) = branch.ready() else {
            tracing::warn!(set_id, cached, missing = pending.len(), "sentences unavailable, serving cached items only");
            return Ok(questions);
        };

        let mut fresh: Vec<(usize, SentenceQuestion)> = Vec::new();
        let mut handled = HashSet::new();
        for entry in generated {
            let Some(&idx) = pending_by_word.get(entry.word.trim()) else {
                tracing::debug!(set_id, word = %entry.word, "generated entry matches no pending item");
                continue;
            };
            if entry.sentences.is_empty() || !handled.insert(idx) {
                continue;
            }
            let item = &items[idx];
            let normalized = correct_first(&entry);
            if !self.persist(item, CacheSlot::SentenceOptions, &normalized).await {
                continue;
            }
            fresh.push((idx, present_fresh_sentences(item.term(), &entry, &normalized, limit)));
        }

        fresh.sort_by_key(|(idx, _)| *idx);
        tracing::info!(
            set_id,
            cached,
            requested = pending.len(),
            generated = fresh.len(),
            "sentence choice assembled"
        );
        questions.extend(fresh.into_iter().map(|(_, q)| q));
        Ok(questions)
    }

    /// Classifies and turns document text into flashcards with both upstream
    /// calls in flight at once.
    pub async fn enrich_document(&self, raw_text: String) -> DocumentEnrichment {
        let word_count_estimate = document::word_count_estimate(&raw_text);
        let safe_text = document::limit_text(&raw_text, &self.limits);

        let (classified, flashcards) = fanout::join2(
            self.branch_timeout,
            ("classify", self.generator.classify(&safe_text)),
            ("flashcards", self.generator.flashcards(&safe_text)),
        )
        .await;

        let (classify, classify_error) = match classified {
            Branch::Ready(value) => (
                Classification::Upstream(payload::list_field_or_passthrough(value, "words")),
                None,
            ),
            Branch::Unavailable { reason } => {
                let fallback = document::fallback_classification(&safe_text, self.limits.fallback_limit);
                tracing::info!(tokens = fallback.len(), "classification fell back to local tokens");
                (Classification::Fallback(fallback), Some(reason))
            }
        };

        let (flashcards, flashcards_error) = match flashcards {
            Branch::Ready(value) => (Some(value), None),
            Branch::Unavailable { reason } => (None, Some(reason)),
        };

        DocumentEnrichment {
            raw_text,
            word_count_estimate,
            classify,
            classify_error,
            flashcards,
            flashcards_error,
        }
    }

    pub async fn word_info(&self, word: &str) -> Passthrough {
        fanout::bounded("word-info", self.branch_timeout, self.generator.word_info(word))
            .await
            .into()
    }

    pub async fn enrich_text(&self, text: &str) -> Passthrough {
        fanout::bounded("flashcards", self.branch_timeout, self.generator.flashcards(text))
            .await
            .into()
    }

    /// Writes the generated list into the item's slot. Returns `false` only
    /// when the item disappeared in the meantime; a failed write still lets
    /// the freshly generated content be presented.
    async fn persist(&self, item: &StudyItem, slot: CacheSlot, values: &[String]) -> bool {
        match self.store.write_slot(item.id, slot, &cache::write_slot(values)).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!(item_id = item.id, slot = slot.column(), "item vanished before cache write");
                false
            }
            Err(err) => {
                tracing::warn!(item_id = item.id, slot = slot.column(), error = %err, "failed to persist generated content");
                true
            }
        }
    }
}

fn present_mcq(item: &StudyItem, candidates: &[String], options_count: i32) -> MultipleChoiceQuestion {
    let correct = item.answer();
    MultipleChoiceQuestion {
        term: item.term().to_string(),
        correct: correct.to_string(),
        options: selector::select_options(correct, candidates, options_count),
    }
}

/// Moves the sentence marked correct to the front so a later cache read can
/// rely on index 0.
fn correct_first(entry: &GeneratedSentences) -> Vec<String> {
    let mut sentences = entry.sentences.clone();
    let idx = if entry.correct_index < sentences.len() { entry.correct_index } else { 0 };
    let correct = sentences.remove(idx);
    sentences.insert(0, correct);
    sentences
}

fn present_fresh_sentences(
    word: &str,
    entry: &GeneratedSentences,
    normalized: &[String],
    limit: usize,
) -> SentenceQuestion {
    if entry.correct_index < entry.sentences.len().min(limit) {
        SentenceQuestion {
            word: word.to_string(),
            sentences: selector::select_sentences(&entry.sentences, limit),
            correct_index: entry.correct_index,
        }
    } else {
        SentenceQuestion {
            word: word.to_string(),
            sentences: selector::select_sentences(normalized, limit),
            correct_index: 0,
        }
    }
}
