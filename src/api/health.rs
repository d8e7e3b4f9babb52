use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub price_cache: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let price_cache = state
        .aggregator
        .normalizer()
        .prices()
        .cache_backend()
        .to_string();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        price_cache,
    })
}
