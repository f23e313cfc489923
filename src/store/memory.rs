use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChartPage, ChartPatch, ChartRecord, ChartStore, ListOptions, SortField, StoreError};

/// In-memory chart store. Single-process only; the trait is the seam a real
/// document store driver would plug into.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, ChartRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_search(record: &ChartRecord, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record.title.to_lowercase().contains(&needle)
        || record
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false)
        || record.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

#[async_trait]
impl ChartStore for MemoryStore {
    async fn list(&self, options: &ListOptions) -> Result<ChartPage, StoreError> {
        let records = self.records.read().await;

        let mut matched: Vec<ChartRecord> = records
            .values()
            .filter(|r| match &options.search {
                Some(needle) => matches_search(r, needle),
                None => true,
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match options.sort {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            };
            if options.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let total_count = matched.len() as u64;
        let offset = options.page.saturating_sub(1).saturating_mul(options.limit) as usize;
        let items = matched
            .into_iter()
            .skip(offset)
            .take(options.limit as usize)
            .collect();

        Ok(ChartPage { items, total_count })
    }

    async fn get(&self, id: Uuid) -> Result<ChartRecord, StoreError> {
        let records = self.records.read().await;
        records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn insert(&self, record: ChartRecord) -> Result<ChartRecord, StoreError> {
        let mut records = self.records.write().await;

        if records.values().any(|r| r.title == record.title) {
            return Err(StoreError::Duplicate("title".to_string()));
        }

        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: ChartPatch) -> Result<ChartRecord, StoreError> {
        let mut records = self.records.write().await;

        if let Some(title) = &patch.title {
            if records.values().any(|r| r.id != id && r.title == *title) {
                return Err(StoreError::Duplicate("title".to_string()));
            }
        }

        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(title) = patch.title {
            record.title = title;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if let Some(payload) = patch.payload {
            record.payload = payload;
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.remove(&id).map(|_| ()).ok_or(StoreError::NotFound(id))
    }
}
