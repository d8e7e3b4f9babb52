use ethers::types::U256;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{fetch_json, json_rpc, url_with_query};
use crate::{
    config::Config,
    error::{AppError, Result},
    utils::parse_hex_u256,
};

/// EVM indexing provider: owned NFTs, native balance, ERC20 balances and metadata.
#[derive(Clone, Debug)]
pub struct AlchemyClient {
    config: Config,
    client: Client,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTokenBalance {
    pub contract_address: String,
    pub raw_balance: U256,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenBalancesResult {
    #[serde(rename = "tokenBalances", default)]
    token_balances: Vec<RawTokenBalance>,
}

#[derive(Debug, Deserialize)]
struct RawTokenBalance {
    #[serde(rename = "contractAddress")]
    contract_address: String,
    #[serde(rename = "tokenBalance", default)]
    token_balance: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OwnedNftsResponse {
    #[serde(rename = "ownedNfts", default)]
    owned_nfts: Vec<AlchemyNft>,
}

/// Partial NFT schema; every field the adapter reads is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AlchemyNft {
    #[serde(default)]
    pub contract: NftContract,
    #[serde(rename = "tokenId", default)]
    pub token_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<NftImage>,
    #[serde(default)]
    pub raw: Option<NftRaw>,
    #[serde(default)]
    pub collection: Option<NftCollection>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NftContract {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NftImage {
    #[serde(rename = "cachedUrl", default)]
    pub cached_url: Option<String>,
    #[serde(rename = "thumbnailUrl", default)]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "originalUrl", default)]
    pub original_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NftRaw {
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NftCollection {
    #[serde(default)]
    pub name: Option<String>,
}

impl AlchemyClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            config: config.clone(),
            client,
        }
    }

    // Internal helper that supports `api_key` operations.
    fn api_key(&self) -> Result<&str> {
        self.config
            .alchemy_api_key
            .as_deref()
            .ok_or_else(|| AppError::UpstreamUnavailable("ALCHEMY_API_KEY not configured".into()))
    }

    fn rpc_url(&self, network: &str) -> Result<String> {
        Ok(format!(
            "{}/v2/{}",
            self.config.alchemy_base_url(network),
            self.api_key()?
        ))
    }

    pub async fn native_balance(&self, network: &str, address: &str) -> Result<U256> {
        let url = self.rpc_url(network)?;
        let result = json_rpc(
            &self.client,
            &url,
            "eth_getBalance",
            json!([address, "latest"]),
        )
        .await?;
        result
            .as_str()
            .and_then(parse_hex_u256)
            .ok_or_else(|| AppError::UpstreamUnavailable("eth_getBalance returned non-hex".into()))
    }

    /// Non-errored ERC20 balances as reported by the indexer (zero entries included).
    pub async fn token_balances(
        &self,
        network: &str,
        address: &str,
    ) -> Result<Vec<IndexedTokenBalance>> {
        let url = self.rpc_url(network)?;
        let result = json_rpc(
            &self.client,
            &url,
            "alchemy_getTokenBalances",
            json!([address, "erc20"]),
        )
        .await?;
        let parsed: TokenBalancesResult = serde_json::from_value(result).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Malformed token balance list: {}", e))
        })?;

        Ok(parsed
            .token_balances
            .into_iter()
            .filter(|entry| entry.error.as_ref().map_or(true, Value::is_null))
            .filter_map(|entry| {
                let raw_balance = entry.token_balance.as_deref().and_then(parse_hex_u256)?;
                Some(IndexedTokenBalance {
                    contract_address: entry.contract_address.to_ascii_lowercase(),
                    raw_balance,
                })
            })
            .collect())
    }

    pub async fn token_metadata(&self, network: &str, contract: &str) -> Result<TokenMetadata> {
        let url = self.rpc_url(network)?;
        let result = json_rpc(
            &self.client,
            &url,
            "alchemy_getTokenMetadata",
            json!([contract]),
        )
        .await?;
        serde_json::from_value(result)
            .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed token metadata: {}", e)))
    }

    pub async fn nfts_for_owner(&self, network: &str, owner: &str) -> Result<Vec<AlchemyNft>> {
        let base = format!(
            "{}/nft/v3/{}",
            self.config.alchemy_base_url(network),
            self.api_key()?
        );
        let url = url_with_query(
            &base,
            "/getNFTsForOwner",
            &[("owner", owner), ("withMetadata", "true"), ("pageSize", "100")],
        )?;
        let body: OwnedNftsResponse = fetch_json(self.client.get(url)).await?;
        Ok(body.owned_nfts)
    }
}
