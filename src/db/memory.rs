use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::cache::CacheSlot;
use crate::db::store::{StoreError, StudyItem, StudyItemStore};

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStudyItemStore {
    items: RwLock<BTreeMap<i64, StudyItem>>,
}

impl MemoryStudyItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = StudyItem>) -> Self {
        let store = Self::new();
        for item in items {
            store.insert(item);
        }
        store
    }

    pub fn insert(&self, item: StudyItem) {
        self.items.write().insert(item.id, item);
    }

    pub fn remove(&self, item_id: i64) -> Option<StudyItem> {
        self.items.write().remove(&item_id)
    }

    pub fn get(&self, item_id: i64) -> Option<StudyItem> {
        self.items.read().get(&item_id).cloned()
    }
}

#[async_trait]
impl StudyItemStore for MemoryStudyItemStore {
    async fn items_in_set(&self, set_id: i64) -> Result<Vec<StudyItem>, StoreError> {
        Ok(self
            .items
            .read()
            .values()
            .filter(|item| item.set_id == set_id)
            .cloned()
            .collect())
    }

    async fn write_slot(&self, item_id: i64, slot: CacheSlot, encoded: &str) -> Result<bool, StoreError> {
        let mut items = self.items.write();
        let Some(item) = items.get_mut(&item_id) else {
            return Ok(false);
        };
        let value = Some(encoded.to_string());
        match slot {
            CacheSlot::McqOptions => item.mcq_options = value,
            CacheSlot::SentenceOptions => item.sentence_options = value,
        }
        Ok(true)
    }
}
