use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AppState;
use crate::{
    error::{AppError, Result},
    integrations::NameScheme,
    models::{Asset, AssetKind, AssetListResponse, Chain},
    utils::split_list,
};

#[derive(Debug, Deserialize)]
pub struct PortfolioQuery {
    pub chains: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub chains: BTreeMap<String, Vec<Asset>>,
}

/// Which name service owns a wallet input, if it is a name at all.
/// Cardano `$handle`s are left to the Cardano adapter.
pub fn name_scheme_for(input: &str) -> Option<NameScheme> {
    let lowered = input.trim().to_ascii_lowercase();
    // ADA Handles may contain dots (`$john.doe`)
    if lowered.starts_with('$') || lowered.starts_with("0x") || !lowered.contains('.') {
        return None;
    }
    if lowered.ends_with(".eth") {
        Some(NameScheme::Ens)
    } else if lowered.ends_with(".sol") {
        Some(NameScheme::Sns)
    } else {
        Some(NameScheme::Unstoppable)
    }
}

// Internal helper that supports `wallet_address` operations.
async fn wallet_address(state: &AppState, input: &str) -> Result<String> {
    match name_scheme_for(input) {
        Some(scheme) => state.names.resolve(scheme, input).await,
        None => Ok(input.trim().to_string()),
    }
}

fn parse_kind(raw: &str) -> Result<AssetKind> {
    raw.parse().map_err(AppError::BadRequest)
}

fn parse_chain(raw: &str) -> Result<Chain> {
    raw.parse().map_err(AppError::BadRequest)
}

/// GET /assets/{kind}/{chain}/{address}
pub async fn list_assets(
    State(state): State<AppState>,
    Path((kind, chain, address)): Path<(String, String, String)>,
) -> Result<Json<AssetListResponse>> {
    let kind = parse_kind(&kind)?;
    let chain = parse_chain(&chain)?;
    let address = wallet_address(&state, &address).await?;

    let assets = state.aggregator.list_assets(chain, &address, kind).await?;
    tracing::debug!("{} {:?} for {}: {} assets", chain, kind, address, assets.len());
    Ok(Json(AssetListResponse { nfts: assets }))
}

/// GET /portfolio/{address}?chains=a,b&kind=tokens
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<PortfolioResponse>> {
    let kind = match query.kind.as_deref() {
        Some(raw) => parse_kind(raw)?,
        None => AssetKind::Tokens,
    };
    let chains = match query.chains.as_deref() {
        Some(raw) => split_list(raw)
            .iter()
            .map(|name| parse_chain(name))
            .collect::<Result<Vec<Chain>>>()?,
        None => Chain::ALL.to_vec(),
    };
    if chains.is_empty() {
        return Err(AppError::BadRequest("No chains requested".into()));
    }

    let address = wallet_address(&state, &address).await?;
    let chains = state.aggregator.portfolio(&address, &chains, kind).await;
    Ok(Json(PortfolioResponse { chains }))
}
