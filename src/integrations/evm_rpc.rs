use ethers::abi::{self, ParamType, Token};
use ethers::types::U256;
use reqwest::Client;
use serde_json::{json, Value};

use super::json_rpc;
use crate::{
    constants::SELECTOR_BALANCE_OF,
    error::{AppError, Result},
    utils::parse_hex_u256,
};

/// Raw JSON-RPC over an ordered endpoint list. A call fails only after
/// every endpoint has failed.
#[derive(Clone, Debug)]
pub struct RpcFanout {
    urls: Vec<String>,
    client: Client,
}

impl RpcFanout {
    pub fn new(client: Client, urls: Vec<String>) -> Self {
        Self { urls, client }
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let mut last_error =
            AppError::UpstreamUnavailable(format!("No RPC endpoints configured for {}", method));
        for url in &self.urls {
            match json_rpc(&self.client, url, method, params.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::debug!("{} via {} failed: {}", method, url, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    pub async fn block_number(&self) -> Result<u64> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        result
            .as_str()
            .and_then(parse_hex_u256)
            .map(|n| n.low_u64())
            .ok_or_else(|| AppError::UpstreamUnavailable("eth_blockNumber returned non-hex".into()))
    }

    pub async fn native_balance(&self, address: &str) -> Result<U256> {
        let result = self
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        result
            .as_str()
            .and_then(parse_hex_u256)
            .ok_or_else(|| AppError::UpstreamUnavailable("eth_getBalance returned non-hex".into()))
    }

    /// `eth_call` at `latest`, returning the raw hex result.
    pub async fn eth_call(&self, to: &str, data: &str) -> Result<String> {
        let result = self
            .call("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::UpstreamUnavailable("eth_call returned non-string".into()))
    }

    /// Distinct contract addresses that emitted a Transfer to `wallet` since `from_block`.
    pub async fn transfer_log_contracts(
        &self,
        wallet: &str,
        topic: &str,
        from_block: u64,
    ) -> Result<Vec<String>> {
        let filter = json!([{
            "fromBlock": format!("0x{:x}", from_block),
            "toBlock": "latest",
            "topics": [topic, Value::Null, pad_address_topic(wallet)],
        }]);
        let logs = self.call("eth_getLogs", filter).await?;
        let mut contracts: Vec<String> = Vec::new();
        for log in logs.as_array().map(Vec::as_slice).unwrap_or_default() {
            if let Some(address) = log.get("address").and_then(Value::as_str) {
                let address = address.to_ascii_lowercase();
                if !contracts.contains(&address) {
                    contracts.push(address);
                }
            }
        }
        Ok(contracts)
    }
}

/// Left-pads a 20-byte address into a 32-byte log topic.
pub fn pad_address_topic(address: &str) -> String {
    let digits = address
        .trim()
        .trim_start_matches("0x")
        .to_ascii_lowercase();
    format!("0x{:0>64}", digits)
}

/// `balanceOf(owner)` calldata.
pub fn encode_balance_of(owner: &str) -> String {
    let padded = pad_address_topic(owner);
    format!("{}{}", SELECTOR_BALANCE_OF, padded.trim_start_matches("0x"))
}

pub fn decode_uint(raw: &str) -> Option<U256> {
    let digits = raw.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return None;
    }
    parse_hex_u256(digits)
}

/// Decodes a `string` return value, falling back to a `bytes32` symbol.
pub fn decode_abi_string(raw: &str) -> Option<String> {
    let bytes = hex::decode(raw.trim().trim_start_matches("0x")).ok()?;
    if bytes.is_empty() {
        return None;
    }

    if let Ok(tokens) = abi::decode(&[ParamType::String], &bytes) {
        if let Some(Token::String(text)) = tokens.into_iter().next() {
            let text = text.trim_matches(char::from(0)).trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    // bytes32
    let word = bytes.get(..32).unwrap_or(&bytes);
    let end = word.iter().position(|b| *b == 0).unwrap_or(word.len());
    let text = std::str::from_utf8(&word[..end]).ok()?.trim().to_string();
    if text.is_empty() || text.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(text)
}
