use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai-word", post(ai_word))
        .route("/enrich", post(enrich))
}

async fn ai_word(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let word = body
        .get("word")
        .and_then(scalar_text)
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing 'word'"))?;

    Ok(Json(state.orchestrator().word_info(&word).await.into_value()))
}

async fn enrich(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let text = enrich_input(&body).ok_or_else(|| AppError::bad_request("Provide 'text' or 'words'"))?;

    Ok(Json(state.orchestrator().enrich_text(&text).await.into_value()))
}

/// `text` wins when it is a string; otherwise a `words` list is joined with
/// single spaces.
fn enrich_input(body: &Value) -> Option<String> {
    if let Some(text) = body.get("text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let words = body.get("words")?.as_array()?;
    Some(words.iter().filter_map(scalar_text).collect::<Vec<_>>().join(" "))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
