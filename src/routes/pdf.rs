use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Extension, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;

use crate::auth::CallerIdentity;
use crate::response::{json_error, AppError};
use crate::services::orchestrator::DocumentEnrichment;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(upload))
}

async fn upload(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DocumentEnrichment>, AppError> {
    let multipart = multipart.map_err(|e| AppError::bad_request(e.body_text()))?;
    let bytes = read_file_field(multipart)
        .await?
        .ok_or_else(|| AppError::validation("Missing file"))?;
    let size = bytes.len();

    let extractor = state.extractor();
    let raw_text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "document extraction aborted");
            AppError::validation("Error processing document")
        })?
        .map_err(|err| AppError::validation(format!("Error processing document: {err}")))?;

    tracing::info!(
        caller = %caller.username,
        bytes = size,
        chars = raw_text.chars().count(),
        "document text extracted"
    );

    Ok(Json(state.orchestrator().enrich_document(raw_text).await))
}

async fn read_file_field(mut multipart: Multipart) -> Result<Option<Bytes>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(upload_error)?;
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

/// Keeps the multipart layer's status, so an oversized body stays a 413.
fn upload_error(err: MultipartError) -> AppError {
    json_error(err.status(), "UPLOAD_ERROR", format!("Invalid upload: {}", err.body_text()))
}
