use axum::{body::Bytes, extract::State, Extension, Json};
use koszyk_catalog::ScrapeStatus;
use koszyk_scraper::{ScrapeReport, ScrapeRequest};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_scrape_error, ApiError, ApiResponse, AppState};

/// Body of `POST /scrape/run`. Every field is optional; camelCase
/// `realScraping` is accepted alongside `real_scraping`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct RunBody {
    stores: Option<Vec<String>>,
    categories: Option<Vec<String>>,
    #[serde(alias = "realScraping")]
    real_scraping: Option<bool>,
}

impl RunBody {
    pub(super) fn into_request(self, all_stores: Vec<String>) -> ScrapeRequest {
        ScrapeRequest {
            stores: self.stores.unwrap_or(all_stores),
            categories: self.categories.unwrap_or_else(|| vec!["all".to_string()]),
            real_scraping: self.real_scraping.unwrap_or(false),
        }
    }
}

pub(super) fn parse_run_body(body: &[u8]) -> Result<RunBody, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunBody::default());
    }
    serde_json::from_slice(body)
}

pub(super) async fn run_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<ScrapeReport>>, ApiError> {
    let body = parse_run_body(&body).map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid request body: {e}"),
        )
    })?;

    let request = body.into_request(state.catalog.orchestrator().registry().ids());
    let run = state
        .catalog
        .run_scrape(&request)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(run.report, req_id))
}

pub(super) async fn scrape_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ScrapeStatus>> {
    ApiResponse::new(state.catalog.status().await, req_id)
}
