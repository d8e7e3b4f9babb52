use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::{fetch_json, fetch_json_with_backoff, url_with_query};
use crate::{config::Config, error::Result, models::market::Candle, utils::json_as_f64};

#[derive(Clone, Debug)]
pub struct CoinGeckoClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEntry {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    market_cap_rank: Option<u32>,
}

impl CoinGeckoClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            base_url: config.coingecko_api_url.clone(),
            api_key: config.coingecko_api_key.clone(),
            client,
        }
    }

    // Internal helper that attaches the demo key header when configured.
    fn get(&self, url: String) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.api_key {
            Some(key) => request.header("x-cg-demo-api-key", key),
            None => request,
        }
    }

    fn key_header(&self) -> Vec<(&str, &str)> {
        match &self.api_key {
            Some(key) => vec![("x-cg-demo-api-key", key.as_str())],
            None => Vec::new(),
        }
    }

    /// `simple/price` for one quote id. `Ok(None)` when the id has no USD quote.
    pub async fn simple_price(&self, id: &str) -> Result<Option<f64>> {
        let url = url_with_query(
            &self.base_url,
            "/simple/price",
            &[("ids", id), ("vs_currencies", "usd")],
        )?;
        let body: HashMap<String, Value> = fetch_json(self.get(url)).await?;
        Ok(body
            .get(id)
            .and_then(|entry| entry.get("usd"))
            .and_then(json_as_f64))
    }

    /// `simple/token_price/{platform}` for one contract address.
    pub async fn token_price(&self, platform: &str, address: &str) -> Result<Option<f64>> {
        let address = address.to_ascii_lowercase();
        let url = url_with_query(
            &self.base_url,
            &format!("/simple/token_price/{}", platform),
            &[("contract_addresses", address.as_str()), ("vs_currencies", "usd")],
        )?;
        let body: HashMap<String, Value> = fetch_json(self.get(url)).await?;
        Ok(body
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&address))
            .and_then(|(_, entry)| entry.get("usd"))
            .and_then(json_as_f64))
    }

    /// Best-ranked coin id whose symbol matches exactly.
    pub async fn search_coin_id(&self, symbol: &str) -> Result<Option<String>> {
        let url = url_with_query(&self.base_url, "/search", &[("query", symbol)])?;
        let body: SearchResponse =
            fetch_json_with_backoff(&self.client, &url, &self.key_header()).await?;
        let mut matches: Vec<SearchCoin> = body
            .coins
            .into_iter()
            .filter(|coin| coin.symbol.eq_ignore_ascii_case(symbol))
            .collect();
        matches.sort_by_key(|coin| coin.market_cap_rank.unwrap_or(u32::MAX));
        Ok(matches.into_iter().next().map(|coin| coin.id))
    }

    pub async fn markets(&self, page: u32) -> Result<Vec<MarketEntry>> {
        let page = page.max(1).to_string();
        let url = url_with_query(
            &self.base_url,
            "/coins/markets",
            &[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", "100"),
                ("page", page.as_str()),
            ],
        )?;
        fetch_json_with_backoff(&self.client, &url, &self.key_header()).await
    }

    /// `coins/{id}/ohlc` rows are `[ms, open, high, low, close]`.
    pub async fn ohlc(&self, id: &str, days: u32) -> Result<Vec<Candle>> {
        let days = days.to_string();
        let url = url_with_query(
            &self.base_url,
            &format!("/coins/{}/ohlc", id),
            &[("vs_currency", "usd"), ("days", days.as_str())],
        )?;
        let rows: Vec<Vec<Value>> =
            fetch_json_with_backoff(&self.client, &url, &self.key_header()).await?;
        Ok(rows
            .iter()
            .filter_map(|row| Candle::from_row(row, 1))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CoinGeckoClient {
        let config = Config {
            coingecko_api_url: server.uri(),
            ..Config::default()
        };
        CoinGeckoClient::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn simple_price_reads_usd_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "ethereum"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ethereum": { "usd": 3120.5 } })),
            )
            .mount(&server)
            .await;

        let price = client_for(&server).simple_price("ethereum").await.unwrap();
        assert_eq!(price, Some(3120.5));
    }

    #[tokio::test]
    async fn search_prefers_best_ranked_exact_symbol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "coins": [
                    { "id": "fake-eth", "symbol": "ETH", "market_cap_rank": 900 },
                    { "id": "ethereum", "symbol": "ETH", "market_cap_rank": 2 },
                    { "id": "ethena", "symbol": "ENA", "market_cap_rank": 50 }
                ]
            })))
            .mount(&server)
            .await;

        let id = client_for(&server).search_coin_id("eth").await.unwrap();
        assert_eq!(id.as_deref(), Some("ethereum"));
    }
}
