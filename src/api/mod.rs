//! HTTP API.
//!
//! Three read-only endpoints over the file store:
//! - `GET /documents` lists documents that can be classified, one page at a time.
//! - `GET /status` counts supported and classified documents.
//! - `GET /report` renders a markdown or JSON classification report.

mod error;

pub use error::ApiError;

use crate::analysis::summarize;
use crate::config::Config;
use crate::drive::{self, search_all, FileStore, SearchRequest};
use crate::models::{DocumentList, ReportFormat, ReportResponse, StatusResponse};
use crate::report::{generate_json_report, generate_markdown_report};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Fields requested when listing documents.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, createdTime, modifiedTime, owners, size)";

/// Fields requested when only counting documents.
const COUNT_FIELDS: &str = "nextPageToken, files(id)";

/// Fields requested for report generation.
const REPORT_FIELDS: &str = "nextPageToken, files(id, name, properties)";

/// Largest page size the Drive API accepts.
const MAX_PAGE_SIZE: u32 = 1000;

const DEFAULT_PAGE_SIZE: u32 = 50;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FileStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn FileStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/documents", get(list_documents))
        .route("/status", get(get_status))
        .route("/report", get(get_report))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ListParams {
    folder_id: Option<String>,
    page_token: Option<String>,
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default)]
    include_processed: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

async fn list_documents(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<DocumentList>, ApiError> {
    let Query(params) = params?;
    debug!("List documents: {:?}", params);

    if !(1..=MAX_PAGE_SIZE).contains(&params.page_size) {
        return Err(ApiError::BadRequest(format!(
            "page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    let page_size = params
        .page_size
        .min(state.config.drive.max_results_per_page);

    let mut query = drive::Query::new();
    if let Some(folder_id) = non_empty(&params.folder_id) {
        query = query.in_folder(folder_id);
    }
    query = query.mime_types(&state.config.drive.supported_mime_types);
    if !params.include_processed {
        query = query.not_classified();
    }

    let request = SearchRequest::new(LIST_FIELDS)
        .with_query(query.build())
        .with_page_token(non_empty(&params.page_token).map(String::from))
        .with_page_size(page_size);

    let page = state.store.search(&request).await?;
    info!(
        "Listed {} documents (more pages: {})",
        page.files.len(),
        page.next_page_token.is_some()
    );

    Ok(Json(DocumentList {
        total_count: page.files.len(),
        documents: page.files,
        next_page_token: page.next_page_token,
    }))
}

async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let total_request = SearchRequest::new(COUNT_FIELDS)
        .with_query(
            drive::Query::new()
                .mime_types(&state.config.drive.supported_mime_types)
                .build(),
        )
        .with_page_size(MAX_PAGE_SIZE);
    let total = search_all(state.store.as_ref(), &total_request).await?.len();

    let classified_request = SearchRequest::new(COUNT_FIELDS)
        .with_query(drive::Query::new().classified().build())
        .with_page_size(MAX_PAGE_SIZE);
    let classified = search_all(state.store.as_ref(), &classified_request)
        .await?
        .len();

    info!("Status: {} total, {} classified", total, classified);

    Ok(Json(StatusResponse {
        total_documents: total,
        classified_count: classified,
        pending_count: total.saturating_sub(classified),
        last_update: Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
struct ReportParams {
    #[serde(default)]
    format: ReportFormat,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn get_report(
    State(state): State<AppState>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Query(params) = params?;
    debug!("Report: {:?}", params);

    let mut query = drive::Query::new().classified();
    if let Some(start) = non_empty(&params.start_date) {
        query = query.modified_since(validate_date("start_date", start)?);
    }
    if let Some(end) = non_empty(&params.end_date) {
        query = query.modified_until(validate_date("end_date", end)?);
    }

    let request = SearchRequest::new(REPORT_FIELDS)
        .with_query(query.build())
        .with_page_size(MAX_PAGE_SIZE);
    let records = search_all(state.store.as_ref(), &request).await?;

    let generated_at = Utc::now().trunc_subsecs(3);
    let report_content = match params.format {
        ReportFormat::Markdown => {
            let summary = summarize(&records, generated_at);
            debug!(
                "Tallied {} category labels across {} categories",
                summary.categories.total(),
                summary.categories.len()
            );
            generate_markdown_report(&summary)
        }
        ReportFormat::Json => {
            generate_json_report(&records).map_err(|e| ApiError::Internal(e.to_string()))?
        }
    };

    info!(
        "Generated {} report over {} documents",
        params.format,
        records.len()
    );

    Ok(Json(ReportResponse {
        report_content,
        generated_at,
        format: params.format,
    }))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accept RFC 3339 timestamps or plain `YYYY-MM-DD` dates.
fn validate_date<'a>(name: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let valid = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();

    if valid {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!(
            "{} must be an RFC 3339 timestamp or YYYY-MM-DD date, got '{}'",
            name, value
        )))
    }
}
