use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::cache::{self, CacheSlot};
use crate::db::operations::study_items;
use crate::db::DatabaseProxy;

/// A flashcard as far as enrichment is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
    pub id: i64,
    pub set_id: i64,
    pub word: Option<String>,
    pub definition: Option<String>,
    pub mcq_options: Option<String>,
    pub sentence_options: Option<String>,
}

impl StudyItem {
    pub fn term(&self) -> &str {
        self.word.as_deref().unwrap_or("").trim()
    }

    pub fn answer(&self) -> &str {
        self.definition.as_deref().unwrap_or("").trim()
    }

    pub fn slot(&self, slot: CacheSlot) -> Option<&str> {
        match slot {
            CacheSlot::McqOptions => self.mcq_options.as_deref(),
            CacheSlot::SentenceOptions => self.sentence_options.as_deref(),
        }
    }

    pub fn cached(&self, slot: CacheSlot) -> Option<Vec<String>> {
        cache::read_slot(self.slot(slot))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Set reads and by-id slot writes against the card store.
#[async_trait]
pub trait StudyItemStore: Send + Sync {
    /// Items of a set in stable id order.
    async fn items_in_set(&self, set_id: i64) -> Result<Vec<StudyItem>, StoreError>;

    /// Returns `false` when the item no longer exists.
    async fn write_slot(&self, item_id: i64, slot: CacheSlot, encoded: &str) -> Result<bool, StoreError>;
}

pub struct PgStudyItemStore {
    proxy: Arc<DatabaseProxy>,
}

impl PgStudyItemStore {
    pub fn new(proxy: Arc<DatabaseProxy>) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl StudyItemStore for PgStudyItemStore {
    async fn items_in_set(&self, set_id: i64) -> Result<Vec<StudyItem>, StoreError> {
        Ok(study_items::find_by_set(&self.proxy, set_id).await?)
    }

    async fn write_slot(&self, item_id: i64, slot: CacheSlot, encoded: &str) -> Result<bool, StoreError> {
        let updated = study_items::update_cache_slot(&self.proxy, item_id, slot, encoded).await?;
        Ok(updated > 0)
    }
}
