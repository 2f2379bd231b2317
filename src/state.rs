use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::db::{DatabaseProxy, StudyItemStore};
use crate::services::document::{DocumentLimits, TextExtractor};
use crate::services::generation::{ContentGenerator, GenerationConfig};
use crate::services::orchestrator::EnrichmentOrchestrator;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    db_proxy: Option<Arc<DatabaseProxy>>,
    orchestrator: EnrichmentOrchestrator,
    extractor: Arc<dyn TextExtractor>,
}

impl AppState {
    pub fn new(
        config: Config,
        db_proxy: Option<Arc<DatabaseProxy>>,
        store: Arc<dyn StudyItemStore>,
        generator: Arc<dyn ContentGenerator>,
        generation: &GenerationConfig,
        limits: DocumentLimits,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config: Arc::new(config),
            db_proxy,
            orchestrator: EnrichmentOrchestrator::new(store, generator, generation.branch_timeout, limits),
            extractor,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn orchestrator(&self) -> &EnrichmentOrchestrator {
        &self.orchestrator
    }

    pub fn extractor(&self) -> Arc<dyn TextExtractor> {
        Arc::clone(&self.extractor)
    }
}
