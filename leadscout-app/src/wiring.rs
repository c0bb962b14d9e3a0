use anyhow::{Context, Result};
use leadscout_config::LeadscoutConfig;
use leadscout_places::{GoogleMapsClient, PlacesProvider};
use leadscout_search::LeadSearch;
use leadscout_server::AppState;
use leadscout_store::LeadStore;
use std::sync::Arc;

pub async fn open_store(cfg: &LeadscoutConfig) -> Result<LeadStore> {
    LeadStore::connect(&cfg.database.url, cfg.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", cfg.database.url))
}

pub fn places_client(cfg: &LeadscoutConfig) -> Result<Arc<dyn PlacesProvider>> {
    let key = cfg.require_api_key()?;
    let client = GoogleMapsClient::with_endpoint(key, &cfg.google.endpoint)?
        .with_timeout(cfg.google.timeout())
        .with_retries(cfg.google.retries);
    Ok(Arc::new(client))
}

pub fn lead_search(
    cfg: &LeadscoutConfig,
    provider: Arc<dyn PlacesProvider>,
    store: &LeadStore,
) -> LeadSearch<dyn PlacesProvider> {
    LeadSearch::new(provider, Arc::new(store.clone()))
        .with_details_concurrency(cfg.search.details_concurrency)
}

pub async fn build_state(cfg: &LeadscoutConfig) -> Result<AppState> {
    let provider = places_client(cfg)?;
    let store = open_store(cfg).await?;
    let search = lead_search(cfg, provider, &store);
    Ok(AppState::new(search, store))
}
