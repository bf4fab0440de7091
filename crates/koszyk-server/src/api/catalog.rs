use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use koszyk_catalog::{CatalogOrigin, CatalogView, StoreSummary};
use koszyk_core::ProductRecord;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CatalogData {
    records: Vec<ProductRecord>,
    cached: bool,
    total: usize,
    origin: CatalogOrigin,
    captured_at: DateTime<Utc>,
}

impl From<CatalogView> for CatalogData {
    fn from(view: CatalogView) -> Self {
        Self {
            total: view.snapshot.records.len(),
            records: view.snapshot.records.clone(),
            cached: view.cached,
            origin: view.snapshot.origin,
            captured_at: view.snapshot.captured_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    query: String,
    records: Vec<ProductRecord>,
    total: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
}

pub(super) async fn get_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<CatalogData>> {
    let view = state.catalog.get_products().await;
    ApiResponse::new(view.into(), req_id)
}

pub(super) async fn refresh_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<CatalogData>> {
    let view = state.catalog.refresh().await;
    ApiResponse::new(view.into(), req_id)
}

pub(super) async fn search_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "query parameter 'q' is required",
            )
        })?
        .to_string();

    let records = state.catalog.search(&term).await;
    Ok(ApiResponse::new(
        SearchData {
            total: records.len(),
            query: term,
            records,
        },
        req_id,
    ))
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<String>>> {
    ApiResponse::new(state.catalog.categories().await, req_id)
}

pub(super) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<StoreSummary>>> {
    ApiResponse::new(state.catalog.stores().await, req_id)
}
