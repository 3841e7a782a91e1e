//! Configuration endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub config: AppConfig,
    pub cache: CacheStatusResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusResponse {
    pub has_snapshot: bool,
    pub age_secs: Option<u64>,
    pub refreshing: bool,
}

/// GET /api/config - Effective settings and cache state
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let status = state.cache.status();

    Json(ConfigResponse {
        config: state.config.as_ref().clone(),
        cache: CacheStatusResponse {
            has_snapshot: status.has_snapshot,
            age_secs: status.age.map(|age| age.as_secs()),
            refreshing: status.refreshing,
        },
    })
}
