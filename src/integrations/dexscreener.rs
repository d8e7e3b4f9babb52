use reqwest::Client;
use serde::Deserialize;

use super::fetch_json;
use crate::{config::Config, error::Result, utils::sanitize_price};

#[derive(Clone, Debug)]
pub struct DexScreenerClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenPairsResponse {
    #[serde(default)]
    pairs: Option<Vec<DexPair>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DexPair {
    #[serde(rename = "chainId", default)]
    pub chain_id: Option<String>,
    #[serde(rename = "priceUsd", default)]
    pub price_usd: Option<String>,
}

impl DexPair {
    fn price(&self) -> f64 {
        self.price_usd
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .map(sanitize_price)
            .unwrap_or(0.0)
    }
}

impl DexScreenerClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            base_url: config.dexscreener_api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Every trading pair the aggregator lists for `address`, across chains.
    pub async fn token_pairs(&self, address: &str) -> Result<Vec<DexPair>> {
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, address.trim());
        let body: TokenPairsResponse = fetch_json(self.client.get(url)).await?;
        Ok(body.pairs.unwrap_or_default())
    }
}

/// Prefers the first pair on `chain_id`; otherwise the first pair returned.
pub fn select_pair_price(pairs: &[DexPair], chain_id: Option<&str>) -> f64 {
    let matched = chain_id.and_then(|wanted| {
        pairs.iter().find(|pair| {
            pair.chain_id
                .as_deref()
                .is_some_and(|id| id.eq_ignore_ascii_case(wanted))
        })
    });
    matched
        .or_else(|| pairs.first())
        .map(DexPair::price)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(chain: &str, price: &str) -> DexPair {
        DexPair {
            chain_id: Some(chain.to_string()),
            price_usd: Some(price.to_string()),
        }
    }

    #[test]
    fn select_pair_price_prefers_matching_chain() {
        let pairs = vec![pair("ethereum", "1.01"), pair("base", "0.99")];
        assert_eq!(select_pair_price(&pairs, Some("base")), 0.99);
    }

    #[test]
    fn select_pair_price_falls_back_to_first_pair() {
        // Memastikan pair pertama dipakai bila chain tidak cocok
        let pairs = vec![pair("ethereum", "1.01"), pair("base", "0.99")];
        assert_eq!(select_pair_price(&pairs, Some("monad")), 1.01);
        assert_eq!(select_pair_price(&[], Some("base")), 0.0);
    }

    #[test]
    fn unparsable_price_is_zero() {
        let pairs = vec![pair("base", "n/a")];
        assert_eq!(select_pair_price(&pairs, Some("base")), 0.0);
    }
}
