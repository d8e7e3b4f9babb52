pub mod alchemy;
pub mod blockfrost;
pub mod coingecko;
pub mod dexscreener;
pub mod evm_rpc;
pub mod helius;
pub mod market_feeds;
pub mod naming;

pub use alchemy::AlchemyClient;
pub use blockfrost::BlockfrostClient;
pub use coingecko::CoinGeckoClient;
pub use dexscreener::DexScreenerClient;
pub use evm_rpc::RpcFanout;
pub use helius::HeliusClient;
pub use market_feeds::MarketFeeds;
pub use naming::{NameScheme, NameService};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use crate::{
    config::Config,
    constants::{MARKET_RETRY_ATTEMPTS, MARKET_RETRY_BASE_MS},
    error::{AppError, Result},
};

/// One client for every upstream; the timeout bounds each call.
pub fn build_http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .user_agent(concat!("wallet-aggregator/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Appends query pairs to `base` + `path`.
pub fn url_with_query(base: &str, path: &str, params: &[(&str, &str)]) -> Result<String> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let mut url = url::Url::parse(&raw)
        .map_err(|e| AppError::Internal(format!("Invalid upstream URL {}: {}", raw, e)))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url.into())
}

/// Sends the request and decodes a 2xx JSON body; anything else is upstream failure.
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::UpstreamUnavailable(format!(
            "{} returned {}",
            response.url().path(),
            status
        )));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed upstream JSON: {}", e)))
}

/// Like `fetch_json`, but a 404 becomes `Ok(None)`.
pub async fn fetch_json_optional<T: DeserializeOwned>(request: RequestBuilder) -> Result<Option<T>> {
    let response = request.send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(AppError::UpstreamUnavailable(format!(
            "{} returned {}",
            response.url().path(),
            status
        )));
    }
    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed upstream JSON: {}", e)))
}

/// GET with exponential backoff on HTTP 429 only. Used by the market paths.
pub async fn fetch_json_with_backoff<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<T> {
    let mut attempt = 0;
    loop {
        let mut request = client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt + 1 < MARKET_RETRY_ATTEMPTS {
            let backoff = backoff_duration(attempt);
            tracing::debug!("{} rate limited; retrying in {}ms", url, backoff.as_millis());
            tokio::time::sleep(backoff).await;
            attempt += 1;
            continue;
        }
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "{} returned {}",
                response.url().path(),
                status
            )));
        }
        return response
            .json::<T>()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed upstream JSON: {}", e)));
    }
}

// Internal helper that supports `backoff_duration` operations.
fn backoff_duration(attempt: u32) -> Duration {
    Duration::from_millis(MARKET_RETRY_BASE_MS.saturating_mul(1_u64 << attempt.min(6)))
}

/// Posts a JSON-RPC 2.0 request and returns `result`; an `error` member fails the call.
pub async fn json_rpc(client: &Client, url: &str, method: &str, params: Value) -> Result<Value> {
    let payload = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    let body: Value = fetch_json(client.post(url).json(&payload)).await?;
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        return Err(AppError::UpstreamUnavailable(format!(
            "{} failed: {}",
            method, error
        )));
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| AppError::UpstreamUnavailable(format!("{} returned no result", method)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_with_query_encodes_pairs() {
        let url = url_with_query(
            "https://api.example.com/v3/",
            "/simple/price",
            &[("ids", "ethereum,solana"), ("vs_currencies", "usd")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://api.example.com/v3/simple/price?ids=ethereum%2Csolana&vs_currencies=usd"
        );
    }

    #[test]
    fn backoff_grows_exponentially() {
        assert_eq!(backoff_duration(0), Duration::from_millis(250));
        assert_eq!(backoff_duration(2), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn json_rpc_surfaces_error_member() {
        use wiremock::matchers::{body_partial_json, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_call" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "error": { "code": -32000, "message": "execution reverted" }
            })))
            .mount(&server)
            .await;

        let client = Client::new();
        let result = json_rpc(&client, &server.uri(), "eth_call", json!([])).await;
        assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));
    }
}
