use axum::extract::{Extension, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::CallerIdentity;
use crate::db::StoreError;
use crate::response::AppError;
use crate::services::orchestrator::{MultipleChoiceQuestion, SentenceQuestion};
use crate::state::AppState;

const DEFAULT_OPTIONS_COUNT: i32 = 4;
const MAX_OPTIONS_COUNT: i32 = 20;

#[derive(Serialize)]
pub struct QuestionsResponse<T> {
    questions: Vec<T>,
}

/// Both fields stay raw so a malformed value is reported in our own error
/// shape instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameQuery {
    set_id: Option<String>,
    options_count: Option<String>,
}

impl GameQuery {
    fn set_id(&self) -> Result<i64, AppError> {
        let raw = self
            .set_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::bad_request("Missing setId"))?;
        raw.parse()
            .map_err(|_| AppError::validation(format!("Invalid setId: {raw}")))
    }

    fn options_count(&self) -> Result<i32, AppError> {
        match self.options_count.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(DEFAULT_OPTIONS_COUNT),
            Some(raw) => raw
                .parse::<i32>()
                .map(|count| count.min(MAX_OPTIONS_COUNT))
                .map_err(|_| AppError::validation(format!("Invalid optionsCount: {raw}"))),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/multiple-choice", get(multiple_choice))
        .route("/sentence-choice", get(sentence_choice))
}

async fn multiple_choice(
    State(state): State<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    query: Option<Query<GameQuery>>,
) -> Result<Json<QuestionsResponse<MultipleChoiceQuestion>>, AppError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let set_id = query.set_id()?;
    let options_count = query.options_count()?;

    let questions = state
        .orchestrator()
        .multiple_choice(set_id, options_count)
        .await
        .map_err(store_failure)?;

    tracing::debug!(
        set_id,
        options_count,
        questions = questions.len(),
        caller = caller.as_ref().map(|Extension(c)| c.username.as_str()),
        "multiple-choice batch served"
    );
    Ok(Json(QuestionsResponse { questions }))
}

async fn sentence_choice(
    State(state): State<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    query: Option<Query<GameQuery>>,
) -> Result<Json<QuestionsResponse<SentenceQuestion>>, AppError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let set_id = query.set_id()?;
    let options_count = query.options_count()?;

    let questions = state
        .orchestrator()
        .sentence_choice(set_id, options_count)
        .await
        .map_err(store_failure)?;

    tracing::debug!(
        set_id,
        options_count,
        questions = questions.len(),
        caller = caller.as_ref().map(|Extension(c)| c.username.as_str()),
        "sentence-choice batch served"
    );
    Ok(Json(QuestionsResponse { questions }))
}

fn store_failure(err: StoreError) -> AppError {
    AppError::internal(format!("failed to load study items: {err}"))
}
