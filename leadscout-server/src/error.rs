use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leadscout_search::{ExportError, SearchError, SortError};
use leadscout_store::StoreError;
use serde_json::json;

/// Errors surfaced to API clients as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "server", status = status.as_u16(), error = %self, "server.error");
        } else {
            tracing::info!(target: "server", status = status.as_u16(), error = %self, "server.rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::LocationNotFound(_) => ApiError::BadRequest("Location not found".into()),
            SearchError::InvalidRequest(m) => ApiError::Unprocessable(m),
            other => ApiError::Internal(format!("Search failed: {other}")),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<SortError> for ApiError {
    fn from(e: SortError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
