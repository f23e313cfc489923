use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::middleware::{ApiResponse, ApiResult, Pagination};
use crate::state::AppState;
use crate::store::{ChartPatch, ChartRecord, ListOptions, SortField};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_TAGS: usize = 10;
const MAX_TAG_LEN: usize = 50;
const MAX_LIMIT: u64 = 100;
const DEFAULT_LIMIT: u64 = 10;
const DEFAULT_TITLE: &str = "Untitled Chart";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// Creation body. `data`/`layout` form the opaque Plotly payload;
/// `chartTitle` is the explicit title override.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChartRequest {
    pub data: Option<Value>,
    pub layout: Option<Value>,
    pub chart_title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChartRequest {
    pub data: Option<Value>,
    pub layout: Option<Value>,
    pub chart_title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// List item: metadata only, the figure payload is omitted.
#[derive(Debug, Serialize)]
pub struct ChartSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&ChartRecord> for ChartSummary {
    fn from(record: &ChartRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn parse_chart_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::InvalidId(id.to_string()))
}

fn parse_sort(sort: Option<&str>) -> (SortField, bool) {
    let raw = sort.unwrap_or("-createdAt");
    let (descending, name) = match raw.strip_prefix('-') {
        Some(name) => (true, name),
        None => (false, raw),
    };

    match name {
        "createdAt" => (SortField::CreatedAt, descending),
        "updatedAt" => (SortField::UpdatedAt, descending),
        "title" => (SortField::Title, descending),
        // Unknown keys fall back to newest-first rather than erroring.
        _ => (SortField::CreatedAt, true),
    }
}

/// Minimal structural predicate over the Plotly payload: a figure is
/// anything with a top-level data sequence or a layout object. No schema
/// validation beyond that.
fn validate_payload_shape(data: &Option<Value>, layout: &Option<Value>) -> Result<(), ApiError> {
    if let Some(data) = data {
        if !data.is_array() {
            return Err(ApiError::validation("'data' must be an array of traces"));
        }
    }
    if let Some(layout) = layout {
        if !layout.is_object() {
            return Err(ApiError::validation("'layout' must be an object"));
        }
    }

    let has_data = data.as_ref().map(|d| d.is_array()).unwrap_or(false);
    let has_layout = layout.as_ref().map(|l| l.is_object()).unwrap_or(false);
    if !has_data && !has_layout {
        return Err(ApiError::validation(
            "Chart payload must include a 'data' array or a 'layout' object",
        ));
    }

    Ok(())
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.len() > MAX_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

/// Tags are an order-insensitive, size-bounded set: validated, then
/// de-duplicated preserving first occurrence.
fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, ApiError> {
    if tags.len() > MAX_TAGS {
        return Err(ApiError::validation(format!(
            "At most {} tags are allowed",
            MAX_TAGS
        )));
    }

    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if tag.is_empty() {
            continue;
        }
        if tag.len() > MAX_TAG_LEN {
            return Err(ApiError::validation(format!(
                "Tags must be at most {} characters",
                MAX_TAG_LEN
            )));
        }
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }

    Ok(normalized)
}

/// Title precedence at creation: explicit title, then the payload's nested
/// `layout.title` (plain string or `{text}` object), then the fixed default.
/// Derivation happens once; reads and updates never recompute it.
fn derive_title(explicit: Option<&str>, layout: Option<&Value>) -> String {
    if let Some(title) = explicit {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    if let Some(layout) = layout {
        let nested = match &layout["title"] {
            Value::String(text) => Some(text.clone()),
            Value::Object(_) => layout["title"]["text"].as_str().map(|s| s.to_string()),
            _ => None,
        };
        if let Some(text) = nested {
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    DEFAULT_TITLE.to_string()
}

/// GET /api/charts - Paginated listing with search and sort
pub async fn list_charts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<ChartSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let (sort, descending) = parse_sort(query.sort.as_deref());
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let result = state
        .store
        .list(&ListOptions {
            page,
            limit,
            sort,
            descending,
            search,
        })
        .await?;

    let items: Vec<ChartSummary> = result.items.iter().map(ChartSummary::from).collect();
    let pagination = Pagination::new(page, limit, result.total_count);

    Ok(ApiResponse::paginated(items, pagination))
}

/// POST /api/charts - Create a chart from a Plotly figure payload
pub async fn create_chart(
    State(state): State<AppState>,
    Json(payload): Json<CreateChartRequest>,
) -> ApiResult<ChartRecord> {
    validate_payload_shape(&payload.data, &payload.layout)?;

    if let Some(title) = payload.chart_title.as_deref() {
        validate_title(title)?;
    }
    if let Some(description) = payload.description.as_deref() {
        validate_description(description)?;
    }

    let title = derive_title(payload.chart_title.as_deref(), payload.layout.as_ref());
    let tags = normalize_tags(payload.tags.unwrap_or_default())?;
    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let figure = json!({
        "data": payload.data.unwrap_or_else(|| json!([])),
        "layout": payload.layout.unwrap_or_else(|| json!({})),
    });

    let now = Utc::now();
    let record = ChartRecord {
        id: Uuid::new_v4(),
        title,
        description,
        tags,
        payload: figure,
        created_at: now,
        updated_at: now,
    };

    let created = state.store.insert(record).await?;
    tracing::info!(id = %created.id, title = %created.title, "chart created");

    Ok(ApiResponse::created(created))
}

/// GET /api/charts/:id - Full chart record, payload included
pub async fn get_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ChartRecord> {
    let id = parse_chart_id(&id)?;
    let record = state.store.get(id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/charts/:id - Update metadata and/or payload
///
/// The title is never re-derived from the payload here; only an explicit
/// `chartTitle` changes it.
pub async fn update_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateChartRequest>,
) -> ApiResult<ChartRecord> {
    let id = parse_chart_id(&id)?;
    let existing = state.store.get(id).await?;

    let mut patch = ChartPatch::default();

    if let Some(title) = payload.chart_title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::validation("Title cannot be empty"));
        }
        validate_title(&title)?;
        patch.title = Some(title);
    }

    if let Some(description) = payload.description {
        validate_description(&description)?;
        let description = description.trim().to_string();
        patch.description = Some(if description.is_empty() {
            None
        } else {
            Some(description)
        });
    }

    if let Some(tags) = payload.tags {
        patch.tags = Some(normalize_tags(tags)?);
    }

    if payload.data.is_some() || payload.layout.is_some() {
        validate_payload_shape(&payload.data, &payload.layout)?;
        let figure = json!({
            "data": payload.data.unwrap_or_else(|| existing.payload["data"].clone()),
            "layout": payload.layout.unwrap_or_else(|| existing.payload["layout"].clone()),
        });
        patch.payload = Some(figure);
    }

    let updated = state.store.update(id, patch).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/charts/:id
pub async fn delete_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_chart_id(&id)?;
    state.store.delete(id).await?;
    tracing::info!(%id, "chart deleted");
    Ok(ApiResponse::success(json!({ "message": "Chart deleted" })))
}

/// GET /api/charts/:id/stats - Derived read over the stored payload
pub async fn chart_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_chart_id(&id)?;
    let record = state.store.get(id).await?;

    let traces = record.payload["data"].as_array().cloned().unwrap_or_default();
    let data_point_count: usize = traces
        .iter()
        .map(|trace| {
            let xs = trace["x"].as_array().map(|a| a.len()).unwrap_or(0);
            let ys = trace["y"].as_array().map(|a| a.len()).unwrap_or(0);
            xs.max(ys)
        })
        .sum();
    let size_bytes = serde_json::to_vec(&record.payload)
        .map(|b| b.len())
        .unwrap_or(0);

    Ok(ApiResponse::success(json!({
        "id": record.id,
        "title": record.title,
        "traceCount": traces.len(),
        "dataPointCount": data_point_count,
        "tagCount": record.tags.len(),
        "sizeBytes": size_bytes,
        "createdAt": record.created_at,
        "updatedAt": record.updated_at,
    })))
}

/// POST /api/charts/:id/duplicate - Copy a chart under a new id
pub async fn duplicate_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ChartRecord> {
    let id = parse_chart_id(&id)?;
    let source = state.store.get(id).await?;

    let now = Utc::now();
    let copy = ChartRecord {
        id: Uuid::new_v4(),
        title: format!("Copy of {}", source.title),
        description: source.description.clone(),
        tags: source.tags.clone(),
        payload: source.payload.clone(),
        created_at: now,
        updated_at: now,
    };

    let created = state.store.insert(copy).await?;
    Ok(ApiResponse::created(created))
}
