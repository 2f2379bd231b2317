use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::{env_string, env_u64};
use crate::services::payload::{self, GeneratedOptions, GeneratedSentences};

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_BRANCH_TIMEOUT_MS: u64 = 6_000;

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    /// Upper bound on how long a request waits for one outbound branch.
    pub branch_timeout: Duration,
}

impl GenerationConfig {
    pub fn from_env() -> Self {
        let base_url = env_string("MODEL_SERVICE_BASE").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_millis(
                env_u64("MODEL_SERVICE_CONNECT_TIMEOUT_MS").unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            ),
            response_timeout: Duration::from_millis(
                env_u64("MODEL_SERVICE_TIMEOUT_MS").unwrap_or(DEFAULT_RESPONSE_TIMEOUT_MS),
            ),
            branch_timeout: Duration::from_millis(
                env_u64("MODEL_SERVICE_BRANCH_TIMEOUT_MS").unwrap_or(DEFAULT_BRANCH_TIMEOUT_MS),
            ),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            branch_timeout: Duration::from_millis(DEFAULT_BRANCH_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistractorPair {
    pub term: String,
    pub definition: String,
}

/// The generation service as seen by the orchestrator.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn word_info(&self, word: &str) -> Result<Value, GenerationError>;

    async fn flashcards(&self, text: &str) -> Result<Value, GenerationError>;

    async fn classify(&self, text: &str) -> Result<Value, GenerationError>;

    async fn generate_distractors(
        &self,
        pairs: &[DistractorPair],
        options_count: i32,
    ) -> Result<Vec<GeneratedOptions>, GenerationError>;

    async fn generate_sentences(
        &self,
        words: &[String],
        options_count: usize,
    ) -> Result<Vec<GeneratedSentences>, GenerationError>;
}

#[derive(Debug, Serialize)]
struct DistractorRequest<'a> {
    options_count: i32,
    pairs: &'a [DistractorPair],
}

#[derive(Debug, Serialize)]
struct SentenceRequest<'a> {
    options_count: usize,
    words: &'a [String],
}

/// HTTP client for the generation service. Built once and shared, so every
/// request reuses the same connection pool.
#[derive(Clone)]
pub struct HttpContentGenerator {
    config: GenerationConfig,
    client: reqwest::Client,
}

impl HttpContentGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.response_timeout)
            .build()
            .unwrap_or_else(|err| {
                tracing::error!(error = %err, "generation client build failed, falling back to an unbounded client");
                reqwest::Client::new()
            });

        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    async fn post_json<T>(&self, path: &str, body: &T) -> Result<Value, GenerationError>
    where
        T: Serialize + ?Sized,
    {
        let request = self.client.post(self.url(path)).json(body);
        self.send(path, request).await
    }

    async fn send(&self, path: &str, request: reqwest::RequestBuilder) -> Result<Value, GenerationError> {
        let started = std::time::Instant::now();
        let resp = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(endpoint = path, %status, "generation service returned an error status");
            return Err(GenerationError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_transport(e))?;
        let value: Value = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            endpoint = path,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation service responded"
        );
        Ok(value)
    }

    fn map_transport(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout_budget(err.is_connect()))
        } else {
            GenerationError::Request(err)
        }
    }

    /// The limit that was hit: connecting or waiting for the response.
    fn timeout_budget(&self, during_connect: bool) -> Duration {
        if during_connect {
            self.config.connect_timeout
        } else {
            self.config.response_timeout
        }
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn word_info(&self, word: &str) -> Result<Value, GenerationError> {
        self.post_json("word-info", &serde_json::json!({ "word": word })).await
    }

    async fn flashcards(&self, text: &str) -> Result<Value, GenerationError> {
        self.post_json("flashcards", &serde_json::json!({ "text": text })).await
    }

    async fn classify(&self, text: &str) -> Result<Value, GenerationError> {
        let request = self.client.post(self.url("classify")).form(&[("text", text)]);
        self.send("classify", request).await
    }

    async fn generate_distractors(
        &self,
        pairs: &[DistractorPair],
        options_count: i32,
    ) -> Result<Vec<GeneratedOptions>, GenerationError> {
        let body = DistractorRequest { options_count, pairs };
        let payload = self.post_json("generate-distractors", &body).await?;
        Ok(payload::parse_distractor_questions(&payload))
    }

    async fn generate_sentences(
        &self,
        words: &[String],
        options_count: usize,
    ) -> Result<Vec<GeneratedSentences>, GenerationError> {
        let body = SentenceRequest { options_count, words };
        let payload = self.post_json("generate-sentences", &body).await?;
        Ok(payload::parse_sentence_questions(&payload))
    }
}
