#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;

use flashcard_backend_rust::config::Config;
use flashcard_backend_rust::db::{MemoryStudyItemStore, StudyItem};
use flashcard_backend_rust::services::document::{DocumentLimits, ExtractError, TextExtractor};
use flashcard_backend_rust::services::generation::{
    ContentGenerator, DistractorPair, GenerationConfig, GenerationError,
};
use flashcard_backend_rust::services::orchestrator::EnrichmentOrchestrator;
use flashcard_backend_rust::services::payload::{GeneratedOptions, GeneratedSentences};
use flashcard_backend_rust::state::AppState;

pub const BRANCH_TIMEOUT: Duration = Duration::from_secs(6);
pub const TEST_SECRET: &str = "integration-test-secret";

pub fn card(id: i64, set_id: i64, word: &str, definition: &str) -> StudyItem {
    StudyItem {
        id,
        set_id,
        word: Some(word.to_string()),
        definition: Some(definition.to_string()),
        mcq_options: None,
        sentence_options: None,
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn unavailable(what: &str) -> GenerationError {
    GenerationError::HttpStatus {
        status: reqwest::StatusCode::BAD_GATEWAY,
        body: format!("{what} unavailable"),
    }
}

/// Scripted generation service. Anything left unset answers with an error.
#[derive(Default)]
pub struct StubGenerator {
    pub delay: Duration,
    pub distractors: Option<Vec<GeneratedOptions>>,
    pub sentences: Option<Vec<GeneratedSentences>>,
    pub word_info: Option<Value>,
    pub flashcards: Option<Value>,
    pub classify: Option<Value>,
    pub classify_delay: Duration,
    pub flashcards_delay: Duration,
    pub distractor_calls: AtomicUsize,
    pub sentence_calls: AtomicUsize,
    pub requested_pairs: Mutex<Vec<DistractorPair>>,
    pub requested_words: Mutex<Vec<String>>,
    /// Runs while a generation call is in flight.
    pub during_generation: Option<Box<dyn Fn() + Send + Sync>>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distractors(mut self, entries: Vec<GeneratedOptions>) -> Self {
        self.distractors = Some(entries);
        self
    }

    pub fn with_sentences(mut self, entries: Vec<GeneratedSentences>) -> Self {
        self.sentences = Some(entries);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn distractor_calls(&self) -> usize {
        self.distractor_calls.load(Ordering::SeqCst)
    }

    pub fn sentence_calls(&self) -> usize {
        self.sentence_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self, extra: Duration) {
        let total = self.delay + extra;
        if !total.is_zero() {
            tokio::time::sleep(total).await;
        }
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn word_info(&self, _word: &str) -> Result<Value, GenerationError> {
        self.pause(Duration::ZERO).await;
        self.word_info.clone().ok_or_else(|| unavailable("word-info"))
    }

    async fn flashcards(&self, _text: &str) -> Result<Value, GenerationError> {
        self.pause(self.flashcards_delay).await;
        self.flashcards.clone().ok_or_else(|| unavailable("flashcards"))
    }

    async fn classify(&self, _text: &str) -> Result<Value, GenerationError> {
        self.pause(self.classify_delay).await;
        self.classify.clone().ok_or_else(|| unavailable("classify"))
    }

    async fn generate_distractors(
        &self,
        pairs: &[DistractorPair],
        _options_count: i32,
    ) -> Result<Vec<GeneratedOptions>, GenerationError> {
        self.distractor_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_pairs.lock().extend_from_slice(pairs);
        if let Some(hook) = &self.during_generation {
            hook();
        }
        self.pause(Duration::ZERO).await;
        self.distractors.clone().ok_or_else(|| unavailable("generate-distractors"))
    }

    async fn generate_sentences(
        &self,
        words: &[String],
        _options_count: usize,
    ) -> Result<Vec<GeneratedSentences>, GenerationError> {
        self.sentence_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_words.lock().extend_from_slice(words);
        if let Some(hook) = &self.during_generation {
            hook();
        }
        self.pause(Duration::ZERO).await;
        self.sentences.clone().ok_or_else(|| unavailable("generate-sentences"))
    }
}

pub fn options(term: &str, correct: &str, distractors: &[&str]) -> GeneratedOptions {
    GeneratedOptions {
        term: term.to_string(),
        correct: correct.to_string(),
        options: strings(distractors),
    }
}

pub fn sentences(word: &str, list: &[&str], correct_index: usize) -> GeneratedSentences {
    GeneratedSentences {
        word: word.to_string(),
        sentences: strings(list),
        correct_index,
    }
}

pub fn orchestrator(store: Arc<MemoryStudyItemStore>, generator: Arc<StubGenerator>) -> EnrichmentOrchestrator {
    EnrichmentOrchestrator::new(store, generator, BRANCH_TIMEOUT, DocumentLimits::default())
}

/// Treats the upload as UTF-8 text so route tests need no real PDF.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Empty);
        }
        String::from_utf8(bytes.to_vec()).map_err(|e| ExtractError::Unreadable(e.to_string()))
    }
}

pub fn test_state(
    store: Arc<MemoryStudyItemStore>,
    generator: Arc<StubGenerator>,
    jwt_secret: Option<&str>,
) -> AppState {
    let config = Config {
        jwt_secret: jwt_secret.map(str::to_string),
        ..Config::default()
    };
    let generation = GenerationConfig {
        branch_timeout: BRANCH_TIMEOUT,
        ..GenerationConfig::default()
    };
    AppState::new(
        config,
        None,
        store,
        generator,
        &generation,
        DocumentLimits::default(),
        Arc::new(PlainTextExtractor),
    )
}

pub fn create_test_app(
    store: Arc<MemoryStudyItemStore>,
    generator: Arc<StubGenerator>,
    jwt_secret: Option<&str>,
) -> Router {
    flashcard_backend_rust::build_app(test_state(store, generator, jwt_secret))
}
