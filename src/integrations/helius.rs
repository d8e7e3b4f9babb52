use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{json_rpc, url_with_query};
use crate::{
    config::Config,
    error::{AppError, Result},
};

/// Helius DAS (`searchAssets`, `getAsset`) plus plain Solana RPC on the same endpoint.
#[derive(Clone, Debug)]
pub struct HeliusClient {
    config: Config,
    client: Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DasTokenType {
    Fungible,
    NonFungible,
}

impl DasTokenType {
    fn as_str(&self) -> &'static str {
        match self {
            DasTokenType::Fungible => "fungible",
            DasTokenType::NonFungible => "nonFungible",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchAssetsPage {
    #[serde(default)]
    pub items: Vec<DasAsset>,
    #[serde(rename = "nativeBalance", default)]
    pub native_balance: Option<NativeBalance>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NativeBalance {
    #[serde(default)]
    pub lamports: u64,
}

/// Partial DAS asset; only the fields the Solana adapter reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasAsset {
    pub id: String,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub content: Option<DasContent>,
    #[serde(default)]
    pub grouping: Vec<DasGroup>,
    #[serde(default)]
    pub token_info: Option<DasTokenInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasContent {
    #[serde(default)]
    pub metadata: DasMetadata,
    #[serde(default)]
    pub links: Option<DasLinks>,
    #[serde(default)]
    pub files: Vec<DasFile>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasLinks {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasFile {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub cdn_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasGroup {
    #[serde(default)]
    pub group_key: String,
    #[serde(default)]
    pub group_value: String,
    #[serde(default)]
    pub collection_metadata: Option<DasCollectionMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasCollectionMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasTokenInfo {
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub price_info: Option<DasPriceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DasPriceInfo {
    #[serde(default)]
    pub price_per_token: Option<f64>,
}

impl DasAsset {
    /// Collection name, else the collection address, else empty.
    pub fn collection_label(&self) -> String {
        self.grouping
            .iter()
            .find(|group| group.group_key == "collection")
            .map(|group| {
                group
                    .collection_metadata
                    .as_ref()
                    .and_then(|meta| meta.name.clone())
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| group.group_value.clone())
            })
            .unwrap_or_default()
    }

    /// `links.image`, else the first file's CDN or raw URI.
    pub fn image_source(&self) -> Option<String> {
        let content = self.content.as_ref()?;
        let linked = content
            .links
            .as_ref()
            .and_then(|links| links.image.clone())
            .filter(|image| !image.trim().is_empty());
        linked.or_else(|| {
            content
                .files
                .iter()
                .find_map(|file| file.cdn_uri.clone().or_else(|| file.uri.clone()))
                .filter(|image| !image.trim().is_empty())
        })
    }
}

/// One SPL / Token-2022 account from `getTokenAccountsByOwner` (jsonParsed).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTokenAccount {
    pub mint: String,
    pub raw_amount: String,
    pub decimals: u32,
}

#[derive(Debug, Deserialize)]
struct TokenAccountsResult {
    #[serde(default)]
    value: Vec<TokenAccountEntry>,
}

#[derive(Debug, Deserialize)]
struct TokenAccountEntry {
    account: TokenAccountBody,
}

#[derive(Debug, Deserialize)]
struct TokenAccountBody {
    data: TokenAccountData,
}

#[derive(Debug, Deserialize)]
struct TokenAccountData {
    parsed: ParsedData,
}

#[derive(Debug, Deserialize)]
struct ParsedData {
    info: ParsedInfo,
}

#[derive(Debug, Deserialize)]
struct ParsedInfo {
    mint: String,
    #[serde(rename = "tokenAmount")]
    token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    amount: String,
    decimals: u32,
}

impl HeliusClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            config: config.clone(),
            client,
        }
    }

    // Internal helper that supports `rpc_url` operations.
    fn rpc_url(&self) -> Result<String> {
        let key = self
            .config
            .helius_api_key
            .as_deref()
            .ok_or_else(|| AppError::UpstreamUnavailable("HELIUS_API_KEY not configured".into()))?;
        url_with_query(&self.config.helius_rpc_url, "/", &[("api-key", key)])
    }

    pub async fn search_assets(
        &self,
        owner: &str,
        token_type: DasTokenType,
    ) -> Result<SearchAssetsPage> {
        let url = self.rpc_url()?;
        let params = json!({
            "ownerAddress": owner,
            "tokenType": token_type.as_str(),
            "page": 1,
            "limit": 1000,
            "displayOptions": { "showNativeBalance": token_type == DasTokenType::Fungible },
        });
        let result = json_rpc(&self.client, &url, "searchAssets", params).await?;
        serde_json::from_value(result)
            .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed searchAssets page: {}", e)))
    }

    pub async fn get_asset(&self, id: &str) -> Result<DasAsset> {
        let url = self.rpc_url()?;
        let result = json_rpc(&self.client, &url, "getAsset", json!({ "id": id })).await?;
        serde_json::from_value(result)
            .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed getAsset result: {}", e)))
    }

    /// Token accounts owned by `owner` under one token program.
    pub async fn token_accounts_by_owner(
        &self,
        owner: &str,
        program_id: &str,
    ) -> Result<Vec<ParsedTokenAccount>> {
        let url = self.rpc_url()?;
        let params = json!([
            owner,
            { "programId": program_id },
            { "encoding": "jsonParsed" }
        ]);
        let result = json_rpc(&self.client, &url, "getTokenAccountsByOwner", params).await?;
        let parsed: TokenAccountsResult = serde_json::from_value(result).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Malformed token account list: {}", e))
        })?;

        Ok(parsed
            .value
            .into_iter()
            .map(|entry| {
                let info = entry.account.data.parsed.info;
                ParsedTokenAccount {
                    mint: info.mint,
                    raw_amount: info.token_amount.amount,
                    decimals: info.token_amount.decimals,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HeliusClient {
        let config = Config {
            helius_api_key: Some("key".to_string()),
            helius_rpc_url: server.uri(),
            ..Config::default()
        };
        HeliusClient::new(Client::new(), &config)
    }

    #[test]
    fn collection_label_prefers_metadata_name() {
        let asset: DasAsset = serde_json::from_value(json!({
            "id": "mint1",
            "grouping": [{
                "group_key": "collection",
                "group_value": "CoLLeCtIoN",
                "collection_metadata": { "name": "Mad Lads" }
            }]
        }))
        .unwrap();
        assert_eq!(asset.collection_label(), "Mad Lads");

        let bare: DasAsset = serde_json::from_value(json!({
            "id": "mint2",
            "grouping": [{ "group_key": "collection", "group_value": "CoLLeCtIoN" }]
        }))
        .unwrap();
        assert_eq!(bare.collection_label(), "CoLLeCtIoN");
    }

    #[test]
    fn image_source_falls_back_to_files() {
        let asset: DasAsset = serde_json::from_value(json!({
            "id": "mint1",
            "content": {
                "metadata": { "name": "Lad #1" },
                "links": { "image": "" },
                "files": [{ "uri": "https://arweave.net/x.png", "cdn_uri": "https://cdn.helius/x.png" }]
            }
        }))
        .unwrap();
        assert_eq!(asset.image_source().as_deref(), Some("https://cdn.helius/x.png"));
    }

    #[tokio::test]
    async fn token_accounts_are_flattened() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("api-key", "key"))
            .and(body_partial_json(json!({ "method": "getTokenAccountsByOwner" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": { "context": { "slot": 1 }, "value": [{
                    "pubkey": "acct1",
                    "account": { "data": { "program": "spl-token", "parsed": { "info": {
                        "mint": "MintA",
                        "owner": "Owner",
                        "tokenAmount": { "amount": "2500000", "decimals": 6, "uiAmount": 2.5 }
                    }}}}
                }]}
            })))
            .mount(&server)
            .await;

        let accounts = client_for(&server)
            .token_accounts_by_owner("Owner", crate::constants::SPL_TOKEN_PROGRAM_ID)
            .await
            .unwrap();
        assert_eq!(
            accounts,
            vec![ParsedTokenAccount {
                mint: "MintA".to_string(),
                raw_amount: "2500000".to_string(),
                decimals: 6,
            }]
        );
    }
}
