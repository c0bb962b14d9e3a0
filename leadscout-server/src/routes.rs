use crate::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use leadscout_common::{Lead, SearchRequest, SearchResponse, StatusCheck, StatusCheckCreate};
use leadscout_search::{LeadSort, MarkerCollection, markers_for, to_csv_string};
use leadscout_store::DEFAULT_LIST_LIMIT;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

pub const CSV_FILENAME: &str = "leads.csv";

#[derive(Debug, Default, Deserialize)]
pub struct SortParams {
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl SortParams {
    /// `None` keeps stored (oldest first) order.
    fn to_sort(&self) -> Result<Option<LeadSort>, ApiError> {
        if self.sort.is_none() && self.order.is_none() {
            return Ok(None);
        }
        let key = self.sort.as_deref().unwrap_or("name");
        Ok(Some(LeadSort::parse(key, self.order.as_deref())?))
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rej| ApiError::Unprocessable(rej.body_text()))
}

async fn sorted_leads(state: &AppState, params: &SortParams) -> Result<Vec<Lead>, ApiError> {
    let sort = params.to_sort()?;
    let mut leads = state.store.list_leads(DEFAULT_LIST_LIMIT).await?;
    if let Some(sort) = sort {
        sort.apply(&mut leads);
    }
    Ok(leads)
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Google Maps Scraper API" }))
}

pub async fn create_status(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StatusCheckCreate>, JsonRejection>,
) -> Result<Json<StatusCheck>, ApiError> {
    let check: StatusCheck = body(payload)?.into();
    state.store.insert_status(&check).await?;
    Ok(Json(check))
}

pub async fn list_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StatusCheck>>, ApiError> {
    Ok(Json(state.store.list_status(DEFAULT_LIST_LIMIT).await?))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let req = body(payload)?;
    Ok(Json(state.search.run(&req).await?))
}

pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SortParams>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    Ok(Json(sorted_leads(&state, &params).await?))
}

pub async fn clear_leads(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let deleted = state.store.clear_leads().await?;
    Ok(Json(json!({ "deleted_count": deleted })))
}

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SortParams>,
) -> Result<Response, ApiError> {
    let leads = sorted_leads(&state, &params).await?;
    let csv = to_csv_string(&leads)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILENAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn markers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SortParams>,
) -> Result<Json<MarkerCollection>, ApiError> {
    let leads = sorted_leads(&state, &params).await?;
    Ok(Json(markers_for(&leads, None)))
}
