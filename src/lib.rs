pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::{DatabaseProxy, MemoryStudyItemStore, PgStudyItemStore, StudyItemStore};
use crate::services::document::{DocumentLimits, PdfTextExtractor};
use crate::services::generation::{GenerationConfig, HttpContentGenerator};
use crate::state::AppState;

/// Wraps the routes with the HTTP layers every deployment carries.
pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Builds the state from the environment. Without a reachable database the
/// service keeps running on an empty in-memory store.
pub async fn create_state(config: Config) -> AppState {
    let db_proxy = match DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized, using in-memory store");
            None
        }
    };

    let store: Arc<dyn StudyItemStore> = match &db_proxy {
        Some(proxy) => Arc::new(PgStudyItemStore::new(Arc::clone(proxy))),
        None => Arc::new(MemoryStudyItemStore::new()),
    };

    let generation = GenerationConfig::from_env();
    tracing::info!(base_url = %generation.base_url, "generation service configured");
    let generator = Arc::new(HttpContentGenerator::new(generation.clone()));

    AppState::new(
        config,
        db_proxy,
        store,
        generator,
        &generation,
        DocumentLimits::from_env(),
        Arc::new(PdfTextExtractor),
    )
}

pub async fn create_app() -> axum::Router {
    build_app(create_state(Config::from_env()).await)
}
