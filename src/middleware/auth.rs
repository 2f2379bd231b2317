use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::{self, AuthError};
use crate::response::AppError;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match auth::authenticate(state.config().jwt_secret.as_deref(), req.headers()) {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(err) => rejection(err).into_response(),
    }
}

/// Attaches the caller when a valid token is present; public routes still
/// proceed without one.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Ok(caller) = auth::authenticate(state.config().jwt_secret.as_deref(), req.headers()) {
        req.extensions_mut().insert(caller);
    }

    next.run(req).await
}

fn rejection(err: AuthError) -> AppError {
    match err {
        AuthError::MissingSecret => AppError::service_unavailable("Authentication is not configured"),
        AuthError::MissingToken => AppError::unauthorized("Missing authentication token"),
        AuthError::InvalidToken => {
            tracing::debug!(error = %err, "rejected token");
            AppError::unauthorized("Authentication failed, please sign in again")
        }
    }
}
