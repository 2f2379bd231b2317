pub mod flashcards;
pub mod games;
pub mod health;
pub mod pdf;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::middleware::auth::{optional_auth, require_auth};
use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let upload_limit = state.config().upload_limit_bytes;

    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api/games",
            games::router().route_layer(middleware::from_fn_with_state(state.clone(), optional_auth)),
        )
        .nest(
            "/api/flashcards",
            flashcards::router().route_layer(middleware::from_fn_with_state(state.clone(), optional_auth)),
        )
        .nest(
            "/api/pdf",
            pdf::router()
                .layer(DefaultBodyLimit::max(upload_limit))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        )
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
