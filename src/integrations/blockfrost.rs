use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use super::{fetch_json, fetch_json_optional};
use crate::{
    config::Config,
    error::{AppError, Result},
};

/// Cardano chain index. Every call carries the `project_id` header.
#[derive(Clone, Debug)]
pub struct BlockfrostClient {
    base_url: String,
    project_id: Option<String>,
    client: Client,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInfo {
    #[serde(default)]
    pub stake_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub controlled_amount: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AssetHolding {
    pub unit: String,
    pub quantity: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AssetInfo {
    #[serde(default)]
    pub policy_id: String,
    #[serde(default)]
    pub onchain_metadata: Option<Value>,
    #[serde(default)]
    pub metadata: Option<RegistryMetadata>,
}

/// Off-chain token registry entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RegistryMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    /// Base64 PNG, not a URL.
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetAddress {
    pub address: String,
}

impl BlockfrostClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            base_url: config.blockfrost_api_url.trim_end_matches('/').to_string(),
            project_id: config.blockfrost_project_id.clone(),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
    }

    // Internal helper that supports `get` operations.
    fn get(&self, path: &str) -> Result<RequestBuilder> {
        let project_id = self.project_id.as_deref().ok_or_else(|| {
            AppError::UpstreamUnavailable("BLOCKFROST_PROJECT_ID not configured".into())
        })?;
        Ok(self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("project_id", project_id))
    }

    /// `None` when the address has never appeared on chain.
    pub async fn address(&self, address: &str) -> Result<Option<AddressInfo>> {
        fetch_json_optional(self.get(&format!("/addresses/{}", address))?).await
    }

    pub async fn account(&self, stake_address: &str) -> Result<Option<AccountInfo>> {
        fetch_json_optional(self.get(&format!("/accounts/{}", stake_address))?).await
    }

    /// Every native asset held across the account's addresses. Unknown accounts hold nothing.
    pub async fn account_assets(&self, stake_address: &str) -> Result<Vec<AssetHolding>> {
        let holdings: Option<Vec<AssetHolding>> = fetch_json_optional(
            self.get(&format!("/accounts/{}/addresses/assets", stake_address))?,
        )
        .await?;
        Ok(holdings.unwrap_or_default())
    }

    pub async fn asset(&self, unit: &str) -> Result<AssetInfo> {
        fetch_json(self.get(&format!("/assets/{}", unit))?).await
    }

    /// Addresses currently holding `unit`; empty when the asset does not exist.
    pub async fn asset_addresses(&self, unit: &str) -> Result<Vec<AssetAddress>> {
        let holders: Option<Vec<AssetAddress>> =
            fetch_json_optional(self.get(&format!("/assets/{}/addresses", unit))?).await?;
        Ok(holders.unwrap_or_default())
    }
}
