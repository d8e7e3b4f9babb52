use std::future::Future;
use std::sync::Arc;

use crate::{
    constants::{QUOTE_IDS, STABLECOIN_TICKERS},
    error::Result,
    integrations::{dexscreener::select_pair_price, CoinGeckoClient, DexScreenerClient},
    models::{chain_spec, Chain, ChainFamily},
    services::price_cache::PriceCache,
    utils::{is_null_address, sanitize_price},
};

/// Quote-table id for a native or well-known ticker.
pub fn quote_id_for(symbol: &str) -> Option<&'static str> {
    let symbol = symbol.trim();
    QUOTE_IDS
        .iter()
        .find(|(ticker, _)| ticker.eq_ignore_ascii_case(symbol))
        .map(|(_, id)| *id)
}

/// Ticker contains "USD" or is a listed stablecoin.
pub fn is_stablecoin_ticker(symbol: &str) -> bool {
    let upper = symbol.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return false;
    }
    upper.contains("USD") || STABLECOIN_TICKERS.contains(&upper.as_str())
}

/// USD unit prices. Every path is cache-first and degrades to 0 on failure.
pub struct PriceResolver {
    cache: Arc<dyn PriceCache>,
    coingecko: CoinGeckoClient,
    dexscreener: DexScreenerClient,
}

impl PriceResolver {
    pub fn new(
        cache: Arc<dyn PriceCache>,
        coingecko: CoinGeckoClient,
        dexscreener: DexScreenerClient,
    ) -> Self {
        Self {
            cache,
            coingecko,
            dexscreener,
        }
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    pub async fn native_price(&self, chain: Chain) -> f64 {
        self.symbol_price(chain_spec(chain).native_symbol).await
    }

    /// Symbols outside the quote table resolve to 0 without a network call.
    pub async fn symbol_price(&self, symbol: &str) -> f64 {
        let Some(id) = quote_id_for(symbol) else {
            return 0.0;
        };
        self.cached(&format!("coingecko:{}", id), || {
            self.coingecko.simple_price(id)
        })
        .await
    }

    /// Quote-table price, else 1.0 for stablecoin tickers, else 0.
    pub async fn ticker_price(&self, symbol: &str) -> f64 {
        let price = self.symbol_price(symbol).await;
        if price > 0.0 {
            return price;
        }
        if is_stablecoin_ticker(symbol) {
            return 1.0;
        }
        0.0
    }

    /// Contract/mint price: DexScreener, then CoinGecko by platform, then the
    /// stablecoin heuristic on `symbol`.
    pub async fn token_price(&self, chain: Chain, address: &str, symbol: Option<&str>) -> f64 {
        if is_null_address(address) {
            return 0.0;
        }
        let spec = chain_spec(chain);
        // Solana mints are case-sensitive; EVM addresses are not.
        let address = match chain.family() {
            ChainFamily::Solana | ChainFamily::Cardano => address.trim().to_string(),
            _ => address.trim().to_ascii_lowercase(),
        };

        let dex_key = format!(
            "dexscreener:{}:{}",
            spec.dexscreener_id.unwrap_or(chain.as_str()),
            address
        );
        let dex_price = self
            .cached(&dex_key, || async {
                let pairs = self.dexscreener.token_pairs(&address).await?;
                Ok(Some(select_pair_price(&pairs, spec.dexscreener_id)))
            })
            .await;
        if dex_price > 0.0 {
            return dex_price;
        }

        if let Some(platform) = spec.coingecko_platform {
            let key = format!("coingecko:{}:{}", platform, address);
            let price = self
                .cached(&key, || self.coingecko.token_price(platform, &address))
                .await;
            if price > 0.0 {
                return price;
            }
        }

        if symbol.is_some_and(is_stablecoin_ticker) {
            return 1.0;
        }
        0.0
    }

    // Internal helper that supports `cached` operations.
    async fn cached<F, Fut>(&self, key: &str, fetch: F) -> f64
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<f64>>>,
    {
        if let Some(price) = self.cache.get(key).await {
            return price;
        }
        match fetch().await {
            Ok(price) => {
                let price = sanitize_price(price.unwrap_or(0.0));
                self.cache.set(key, price).await;
                price
            }
            Err(e) => {
                tracing::warn!("price lookup {} failed: {}", key, e);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::price_cache::MemoryPriceCache;
    use reqwest::Client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> PriceResolver {
        let config = Config {
            coingecko_api_url: server.uri(),
            dexscreener_api_url: server.uri(),
            ..Config::default()
        };
        let client = Client::new();
        PriceResolver::new(
            Arc::new(MemoryPriceCache::new(Duration::from_secs(90))),
            CoinGeckoClient::new(client.clone(), &config),
            DexScreenerClient::new(client, &config),
        )
    }

    #[test]
    fn stablecoin_heuristic() {
        assert!(is_stablecoin_ticker("USDC"));
        assert!(is_stablecoin_ticker("iusd"));
        assert!(is_stablecoin_ticker("DJED"));
        assert!(!is_stablecoin_ticker("SNEK"));
        assert!(!is_stablecoin_ticker(""));
    }

    #[tokio::test]
    async fn symbol_price_is_idempotent_within_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "ethereum"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ethereum": { "usd": 3000.0 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        let first = resolver.native_price(Chain::Ethereum).await;
        let second = resolver.symbol_price("eth").await;
        assert_eq!(first, 3000.0);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn zero_address_makes_no_network_calls() {
        // Memastikan alamat nol langsung bernilai 0 tanpa request keluar
        let server = MockServer::start().await;
        Mock::given(path_regex(".*"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        let price = resolver
            .token_price(
                Chain::Ethereum,
                "0x0000000000000000000000000000000000000000",
                Some("USDC"),
            )
            .await;
        assert_eq!(price, 0.0);
        assert_eq!(resolver.symbol_price("NOTAREALCOIN").await, 0.0);
    }

    #[tokio::test]
    async fn token_price_prefers_chain_matched_pair() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/dex/tokens/0xabc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pairs": [
                    { "chainId": "ethereum", "priceUsd": "2.00" },
                    { "chainId": "base", "priceUsd": "1.50" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        assert_eq!(resolver.token_price(Chain::Base, "0xABC", None).await, 1.5);
        assert_eq!(resolver.token_price(Chain::Base, "0xabc", None).await, 1.5);
    }

    #[tokio::test]
    async fn failed_lookups_fall_back_to_stablecoin_peg() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server);
        assert_eq!(
            resolver.token_price(Chain::Ethereum, "0xdef", Some("USDT")).await,
            1.0
        );
        assert_eq!(resolver.token_price(Chain::Ethereum, "0xdef", Some("PEPE")).await, 0.0);
    }
}
