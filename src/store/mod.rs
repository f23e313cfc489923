//! Persistence seam for chart records.
//!
//! The API treats the document store as an external collaborator behind the
//! [`ChartStore`] trait: find with pagination and text search, get, insert,
//! update, delete by key. [`memory::MemoryStore`] backs the demo binary and
//! the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("chart not found: {0}")]
    NotFound(Uuid),

    #[error("duplicate value for unique field: {0}")]
    Duplicate(String),
}

/// Stored chart. The payload is an opaque Plotly figure object; the store
/// never inspects it beyond carrying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub payload: Value,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Field updates applied by `update`. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ChartPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
    pub sort: SortField,
    pub descending: bool,
    /// Case-insensitive substring match over title, description and tags.
    pub search: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: SortField::CreatedAt,
            descending: true,
            search: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartPage {
    pub items: Vec<ChartRecord>,
    pub total_count: u64,
}

#[async_trait]
pub trait ChartStore: Send + Sync {
    async fn list(&self, options: &ListOptions) -> Result<ChartPage, StoreError>;
    async fn get(&self, id: Uuid) -> Result<ChartRecord, StoreError>;
    async fn insert(&self, record: ChartRecord) -> Result<ChartRecord, StoreError>;
    async fn update(&self, id: Uuid, patch: ChartPatch) -> Result<ChartRecord, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
