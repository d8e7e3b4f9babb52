use serde::Serialize;

use crate::{
    config::Config,
    error::{AppError, Result},
    integrations::{coingecko::MarketEntry, CoinGeckoClient, MarketFeeds},
    models::{Candle, PriceQuote},
    services::{price_cache::TtlCache, price_resolver::quote_id_for, provider_chain::ProviderChain},
};

const MAX_CHART_DAYS: u32 = 365;

#[derive(Debug, Clone, Serialize)]
pub struct ChartResponse {
    pub symbol: String,
    pub days: u32,
    pub source: String,
    pub candles: Vec<Candle>,
}

/// Price search, top-coin listing, and daily charts, each cached for the market TTL.
pub struct MarketData {
    coingecko: CoinGeckoClient,
    feeds: MarketFeeds,
    quotes: TtlCache<PriceQuote>,
    lists: TtlCache<Vec<MarketEntry>>,
    charts: TtlCache<ChartResponse>,
}

/// Upper-cased ticker; anything but 1-15 ASCII alphanumerics is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() || symbol.len() > 15 || !symbol.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(AppError::BadRequest(format!("Invalid symbol: {}", raw)));
    }
    Ok(symbol)
}

impl MarketData {
    pub fn new(coingecko: CoinGeckoClient, feeds: MarketFeeds, config: &Config) -> Self {
        let ttl = config.market_cache_ttl();
        Self {
            coingecko,
            feeds,
            quotes: TtlCache::new(ttl),
            lists: TtlCache::new(ttl),
            charts: TtlCache::new(ttl),
        }
    }

    // Internal helper that supports `coin_id` operations.
    async fn coin_id(&self, symbol: &str) -> Result<Option<String>> {
        if let Some(id) = quote_id_for(symbol) {
            return Ok(Some(id.to_string()));
        }
        self.coingecko.search_coin_id(symbol).await
    }

    /// DIA quotation, then CoinGecko search + simple price.
    pub async fn search_price(&self, raw_symbol: &str) -> Result<PriceQuote> {
        let symbol = normalize_symbol(raw_symbol)?;
        if let Some(quote) = self.quotes.get(&symbol).await {
            return Ok(quote);
        }

        let (source, price) = ProviderChain::new("price search")
            .then("dia", self.feeds.dia_price(&symbol))
            .then("coingecko", async {
                match self.coin_id(&symbol).await? {
                    Some(id) => self.coingecko.simple_price(&id).await,
                    None => Ok(None),
                }
            })
            .first_success()
            .await?;

        let quote = PriceQuote {
            symbol: symbol.clone(),
            price: price.unwrap_or(0.0),
            source: source.to_string(),
        };
        self.quotes.insert(&symbol, quote.clone()).await;
        Ok(quote)
    }

    pub async fn list(&self, page: u32) -> Result<Vec<MarketEntry>> {
        let page = page.max(1);
        let key = page.to_string();
        if let Some(entries) = self.lists.get(&key).await {
            return Ok(entries);
        }
        let entries = self.coingecko.markets(page).await?;
        self.lists.insert(&key, entries.clone()).await;
        Ok(entries)
    }

    /// Daily candles: Binance, Kraken, Gemini, then CoinGecko.
    pub async fn chart(&self, raw_symbol: &str, days: u32) -> Result<ChartResponse> {
        let symbol = normalize_symbol(raw_symbol)?;
        let days = days.clamp(1, MAX_CHART_DAYS);
        let key = format!("{}:{}", symbol, days);
        if let Some(chart) = self.charts.get(&key).await {
            return Ok(chart);
        }

        let (source, candles) = ProviderChain::new("chart")
            .then("binance", self.feeds.binance_daily(&symbol, days))
            .then("kraken", self.feeds.kraken_daily(&symbol, days))
            .then("gemini", self.feeds.gemini_daily(&symbol, days))
            .then("coingecko", async {
                match self.coin_id(&symbol).await? {
                    Some(id) => self.coingecko.ohlc(&id, days).await,
                    None => Ok(Vec::new()),
                }
            })
            .first_success()
            .await?;

        let chart = ChartResponse {
            symbol,
            days,
            source: source.to_string(),
            candles,
        };
        self.charts.insert(&key, chart.clone()).await;
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn market_for(server: &MockServer) -> MarketData {
        let config = Config {
            coingecko_api_url: server.uri(),
            dia_api_url: server.uri(),
            binance_api_url: server.uri(),
            kraken_api_url: server.uri(),
            gemini_api_url: server.uri(),
            ..Config::default()
        };
        let client = Client::new();
        MarketData::new(
            CoinGeckoClient::new(client.clone(), &config),
            MarketFeeds::new(client, &config),
            &config,
        )
    }

    #[test]
    fn symbols_are_validated() {
        assert_eq!(normalize_symbol(" eth ").unwrap(), "ETH");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("../etc").is_err());
    }

    #[tokio::test]
    async fn price_search_falls_back_to_coingecko_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotation/SOL"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "solana": { "usd": 151.2 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let market = market_for(&server);
        let first = market.search_price("sol").await.unwrap();
        let second = market.search_price("SOL").await.unwrap();
        assert_eq!(first.source, "coingecko");
        assert_eq!(first.price, 151.2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn chart_uses_next_exchange_when_binance_is_rate_limited() {
        // Memastikan 429 di-retry lalu berpindah ke provider berikutnya
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/0/public/OHLC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": [],
                "result": { "XETHZUSD": [[1700000000, "2000", "2100", "1900", "2050", "2000", "1", 1]], "last": 1700000000 }
            })))
            .mount(&server)
            .await;

        let chart = market_for(&server).chart("eth", 7).await.unwrap();
        assert_eq!(chart.source, "kraken");
        assert_eq!(chart.candles.len(), 1);
        assert_eq!(chart.candles[0].time, 1_700_000_000_000);
    }
}
