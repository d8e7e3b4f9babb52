use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{fetch_json_with_backoff, url_with_query};
use crate::{
    config::Config,
    error::{AppError, Result},
    models::market::Candle,
    utils::sanitize_price,
};

/// Exchange and oracle feeds used by the market endpoints (DIA, Binance, Kraken, Gemini).
#[derive(Clone, Debug)]
pub struct MarketFeeds {
    dia_url: String,
    binance_url: String,
    kraken_url: String,
    gemini_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct DiaQuotation {
    #[serde(rename = "Price", default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: serde_json::Map<String, Value>,
}

impl MarketFeeds {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            dia_url: config.dia_api_url.clone(),
            binance_url: config.binance_api_url.clone(),
            kraken_url: config.kraken_api_url.clone(),
            gemini_url: config.gemini_api_url.clone(),
            client,
        }
    }

    /// Oracle spot quote. `Ok(None)` when the feed has no positive price.
    pub async fn dia_price(&self, symbol: &str) -> Result<Option<f64>> {
        let url = url_with_query(
            &self.dia_url,
            &format!("/quotation/{}", symbol.to_ascii_uppercase()),
            &[],
        )?;
        let body: DiaQuotation = fetch_json_with_backoff(&self.client, &url, &[]).await?;
        Ok(body.price.map(sanitize_price).filter(|p| *p > 0.0))
    }

    /// Daily klines against USDT; open time is already in milliseconds.
    pub async fn binance_daily(&self, symbol: &str, days: u32) -> Result<Vec<Candle>> {
        let pair = format!("{}USDT", symbol.to_ascii_uppercase());
        let limit = days.clamp(1, 1000).to_string();
        let url = url_with_query(
            &self.binance_url,
            "/api/v3/klines",
            &[("symbol", pair.as_str()), ("interval", "1d"), ("limit", limit.as_str())],
        )?;
        let rows: Vec<Vec<Value>> = fetch_json_with_backoff(&self.client, &url, &[]).await?;
        Ok(rows.iter().filter_map(|row| Candle::from_row(row, 1)).collect())
    }

    /// Daily OHLC against USD; Kraken reports seconds and keys the rows by its own pair name.
    pub async fn kraken_daily(&self, symbol: &str, days: u32) -> Result<Vec<Candle>> {
        let pair = format!("{}USD", kraken_asset_code(symbol));
        let url = url_with_query(
            &self.kraken_url,
            "/0/public/OHLC",
            &[("pair", pair.as_str()), ("interval", "1440")],
        )?;
        let body: KrakenResponse = fetch_json_with_backoff(&self.client, &url, &[]).await?;
        if !body.error.is_empty() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Kraken OHLC failed: {}",
                body.error.join(", ")
            )));
        }

        let rows = body
            .result
            .iter()
            .filter(|(key, _)| key.as_str() != "last")
            .find_map(|(_, value)| value.as_array())
            .cloned()
            .unwrap_or_default();
        let candles: Vec<Candle> = rows
            .iter()
            .filter_map(|row| row.as_array().and_then(|r| Candle::from_row(r, 1000)))
            .collect();
        Ok(keep_last(candles, days))
    }

    /// Daily candles against USD; Gemini returns newest first.
    pub async fn gemini_daily(&self, symbol: &str, days: u32) -> Result<Vec<Candle>> {
        let url = url_with_query(
            &self.gemini_url,
            &format!("/v2/candles/{}usd/1day", symbol.to_ascii_lowercase()),
            &[],
        )?;
        let rows: Vec<Vec<Value>> = fetch_json_with_backoff(&self.client, &url, &[]).await?;
        let mut candles: Vec<Candle> = rows
            .iter()
            .filter_map(|row| Candle::from_row(row, 1))
            .collect();
        candles.sort_by_key(|candle| candle.time);
        Ok(keep_last(candles, days))
    }
}

// Kraken still lists bitcoin as XBT.
fn kraken_asset_code(symbol: &str) -> String {
    match symbol.to_ascii_uppercase().as_str() {
        "BTC" => "XBT".to_string(),
        other => other.to_string(),
    }
}

// Internal helper that supports `keep_last` operations.
fn keep_last(mut candles: Vec<Candle>, days: u32) -> Vec<Candle> {
    let days = days.max(1) as usize;
    if candles.len() > days {
        candles.drain(..candles.len() - days);
    }
    candles
}
