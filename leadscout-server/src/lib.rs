//! HTTP API for lead searches.
//!
//! All routes live under `/api`. CORS is open to any origin so a browser
//! front-end served elsewhere can call it directly.

pub mod error;
pub mod routes;

pub use error::ApiError;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use leadscout_places::PlacesProvider;
use leadscout_search::LeadSearch;
use leadscout_store::LeadStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub search: LeadSearch<dyn PlacesProvider>,
    pub store: LeadStore,
}

impl AppState {
    pub fn new(search: LeadSearch<dyn PlacesProvider>, store: LeadStore) -> Self {
        Self { search, store }
    }
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let resp = next.run(req).await;
    tracing::info!(
        target: "server",
        method = %method,
        path = %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "server.request"
    );
    resp
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(routes::root))
        .route("/api/", get(routes::root))
        .route("/api/status", post(routes::create_status).get(routes::list_status))
        .route("/api/search", post(routes::search))
        .route("/api/leads", get(routes::list_leads).delete(routes::clear_leads))
        .route("/api/leads/export.csv", get(routes::export_csv))
        .route("/api/leads/markers", get(routes::markers))
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(target: "server", %addr, "server.listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!(target: "server", "server.stopped");
    Ok(())
}
