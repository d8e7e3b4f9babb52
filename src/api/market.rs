use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::{
    error::Result,
    integrations::coingecko::MarketEntry,
    models::PriceQuote,
    services::market_data::ChartResponse,
};

#[derive(Debug, Deserialize)]
pub struct MarketListQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub days: Option<u32>,
}

/// GET /market/price/{symbol}
pub async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceQuote>> {
    Ok(Json(state.market.search_price(&symbol).await?))
}

/// GET /market/list?page=n
pub async fn list_markets(
    State(state): State<AppState>,
    Query(query): Query<MarketListQuery>,
) -> Result<Json<Vec<MarketEntry>>> {
    Ok(Json(state.market.list(query.page.unwrap_or(1)).await?))
}

/// GET /market/chart/{symbol}?days=n
pub async fn get_chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartResponse>> {
    let days = query.days.unwrap_or(30);
    Ok(Json(state.market.chart(&symbol, days).await?))
}
