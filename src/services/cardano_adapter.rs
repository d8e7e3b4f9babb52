use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;

use crate::{
    constants::{
        LOVELACE_DECIMALS, MAX_CARDANO_METADATA_LOOKUPS, UNKNOWN_SYMBOL, UNKNOWN_TOKEN_NAME,
        UNNAMED_NFT,
    },
    error::{AppError, Result},
    integrations::{
        blockfrost::{AssetHolding, AssetInfo, BlockfrostClient},
        NameService,
    },
    models::{AssetDraft, AssetKind, Chain, NftDetails, NftMetadata, PriceHint, Trait},
    services::aggregator::ChainAdapter,
    utils::{decode_hex_utf8, first_non_empty, json_as_u32, resolve_image_url, scale_decimal_str},
};

const POLICY_ID_HEX_LEN: usize = 56;
const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Blockfrost listings aggregated over the wallet's stake account.
pub struct CardanoAdapter {
    blockfrost: BlockfrostClient,
    names: NameService,
    ipfs_gateway: String,
}

/// Quantity of exactly 1 is treated as an NFT. Supply-1 fungible tokens are
/// misclassified; there is no protocol-level marker to tell them apart.
pub fn is_nft_quantity(quantity: &str) -> bool {
    quantity.trim() == "1"
}

impl CardanoAdapter {
    pub fn new(blockfrost: BlockfrostClient, names: NameService, ipfs_gateway: impl Into<String>) -> Self {
        Self {
            blockfrost,
            names,
            ipfs_gateway: ipfs_gateway.into(),
        }
    }

    /// `$handle` inputs are resolved first; an unresolvable handle is `NotFound`.
    pub async fn list_assets(&self, address: &str, want_tokens: bool) -> Result<Vec<AssetDraft>> {
        let address = self.resolve_input(address).await?;
        let Some(stake) = self.stake_account(&address).await? else {
            tracing::debug!("{} has no stake association", address);
            return Ok(Vec::new());
        };

        if want_tokens {
            self.list_tokens(&stake).await
        } else {
            let holdings = self.blockfrost.account_assets(&stake).await?;
            let nfts: Vec<AssetHolding> = holdings
                .into_iter()
                .filter(|holding| is_nft_quantity(&holding.quantity))
                .collect();
            Ok(self.describe(nfts, false).await)
        }
    }

    async fn resolve_input(&self, address: &str) -> Result<String> {
        let address = address.trim();
        if !address.starts_with('$') {
            return Ok(address.to_string());
        }
        self.names.resolve_handle(address).await.map_err(|e| {
            tracing::debug!("handle {} did not resolve: {}", address, e);
            AppError::NotFound(format!("{} does not resolve", address))
        })
    }

    // Internal helper that supports `stake_account` operations.
    async fn stake_account(&self, address: &str) -> Result<Option<String>> {
        if address.starts_with("stake") {
            return Ok(Some(address.to_string()));
        }
        Ok(self
            .blockfrost
            .address(address)
            .await?
            .and_then(|info| info.stake_address)
            .filter(|stake| !stake.is_empty()))
    }

    /// ADA balance and the account's asset list are combined, so both must succeed.
    async fn list_tokens(&self, stake: &str) -> Result<Vec<AssetDraft>> {
        let (account, holdings) = tokio::join!(
            self.blockfrost.account(stake),
            self.blockfrost.account_assets(stake)
        );
        let account = account?;
        let holdings = holdings?;

        let lovelace = account
            .map(|info| info.controlled_amount)
            .unwrap_or_default();
        let mut drafts = vec![AssetDraft::native(
            Chain::Cardano,
            scale_decimal_str(&lovelace, LOVELACE_DECIMALS),
        )];

        let fungible: Vec<AssetHolding> = holdings
            .into_iter()
            .filter(|holding| !is_nft_quantity(&holding.quantity))
            .collect();
        drafts.extend(self.describe(fungible, true).await);
        Ok(drafts)
    }

    /// Metadata for the first holdings; the rest are listed from the unit alone.
    async fn describe(&self, holdings: Vec<AssetHolding>, fungible: bool) -> Vec<AssetDraft> {
        let lookups = holdings.into_iter().enumerate().map(|(index, holding)| async move {
            let info = if index < MAX_CARDANO_METADATA_LOOKUPS {
                match self.blockfrost.asset(&holding.unit).await {
                    Ok(info) => Some(info),
                    Err(e) => {
                        tracing::debug!("asset metadata for {} failed: {}", holding.unit, e);
                        None
                    }
                }
            } else {
                None
            };
            if fungible {
                token_draft(&holding, info.as_ref(), &self.ipfs_gateway)
            } else {
                nft_draft(&holding, info.as_ref(), &self.ipfs_gateway)
            }
        });
        join_all(lookups).await
    }
}

#[async_trait]
impl ChainAdapter for CardanoAdapter {
    async fn list(&self, _chain: Chain, address: &str, kind: AssetKind) -> Result<Vec<AssetDraft>> {
        self.list_assets(address, kind.wants_tokens()).await
    }
}

// Internal helper that supports `onchain_text` operations.
fn onchain_text(info: Option<&AssetInfo>, field: &str) -> Option<String> {
    let value = info?.onchain_metadata.as_ref()?.get(field)?;
    let text = match value {
        Value::String(text) => text.clone(),
        // CIP-25 splits long strings into 64-byte chunks
        Value::Array(parts) => parts.iter().filter_map(Value::as_str).collect::<String>(),
        _ => return None,
    };
    Some(text).filter(|text| !text.trim().is_empty())
}

fn decoded_asset_name(unit: &str) -> Option<String> {
    unit.get(POLICY_ID_HEX_LEN..).and_then(decode_hex_utf8)
}

/// On-chain image/logo/icon, then the registry logo (base64 PNG), then a registry URL that points at an image.
fn image_for(info: Option<&AssetInfo>, gateway: &str) -> String {
    let onchain = ["image", "logo", "icon"]
        .iter()
        .find_map(|field| onchain_text(info, field));
    if let Some(raw) = onchain {
        return resolve_image_url(&raw, gateway);
    }

    let registry = info.and_then(|i| i.metadata.as_ref());
    if let Some(logo) = registry.and_then(|m| m.logo.as_deref()).filter(|l| !l.is_empty()) {
        if logo.starts_with("data:") || logo.starts_with("http") || logo.starts_with("ipfs") {
            return resolve_image_url(logo, gateway);
        }
        return format!("data:image/png;base64,{}", logo);
    }
    registry
        .and_then(|m| m.url.as_deref())
        .filter(|url| {
            let lower = url.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .map(|url| resolve_image_url(url, gateway))
        .unwrap_or_default()
}

pub fn token_draft(holding: &AssetHolding, info: Option<&AssetInfo>, gateway: &str) -> AssetDraft {
    let registry = info.and_then(|i| i.metadata.as_ref());
    let decoded = decoded_asset_name(&holding.unit);

    let name = first_non_empty([
        onchain_text(info, "name").as_deref(),
        registry.and_then(|m| m.name.as_deref()),
        decoded.as_deref(),
    ])
    .unwrap_or_else(|| UNKNOWN_TOKEN_NAME.to_string());
    let symbol = first_non_empty([
        registry.and_then(|m| m.ticker.as_deref()),
        onchain_text(info, "ticker").as_deref(),
        decoded.as_deref(),
    ])
    .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());
    let decimals = registry
        .and_then(|m| m.decimals)
        .or_else(|| {
            info.and_then(|i| i.onchain_metadata.as_ref())
                .and_then(|meta| meta.get("decimals"))
                .and_then(json_as_u32)
        })
        .unwrap_or(0);

    AssetDraft::token(
        Chain::Cardano,
        holding.unit.clone(),
        name,
        symbol,
        image_for(info, gateway),
        scale_decimal_str(&holding.quantity, decimals),
        PriceHint::Ticker,
    )
}

pub fn nft_draft(holding: &AssetHolding, info: Option<&AssetInfo>, gateway: &str) -> AssetDraft {
    let decoded = decoded_asset_name(&holding.unit);
    let name = first_non_empty([onchain_text(info, "name").as_deref(), decoded.as_deref()])
        .unwrap_or_else(|| UNNAMED_NFT.to_string());

    let onchain = info.and_then(|i| i.onchain_metadata.as_ref());
    let traits = onchain
        .and_then(|meta| meta.get("attributes").or_else(|| meta.get("traits")))
        .map(Trait::list_from_json)
        .unwrap_or_default();
    let description = first_non_empty([
        onchain_text(info, "description").as_deref(),
        info.and_then(|i| i.metadata.as_ref())
            .and_then(|m| m.description.as_deref()),
    ])
    .unwrap_or_default();
    let collection = first_non_empty([
        onchain_text(info, "collection").as_deref(),
        info.map(|i| i.policy_id.as_str()),
        holding.unit.get(..POLICY_ID_HEX_LEN),
    ])
    .unwrap_or_default();

    AssetDraft::nft(
        Chain::Cardano,
        holding.unit.clone(),
        name,
        image_for(info, gateway),
        NftDetails {
            collection,
            metadata: NftMetadata {
                traits,
                description,
            },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::DraftBody;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GATEWAY: &str = "https://ipfs.io/ipfs/";
    const POLICY: &str = "d5e6bf0500378d4f0da4e8dde6becec7621cd8cbf5cbb9b87013d4cc";

    fn adapter_for(server: &MockServer) -> CardanoAdapter {
        let config = Config {
            blockfrost_api_url: server.uri(),
            blockfrost_project_id: Some("mainnetKEY".to_string()),
            handle_api_url: server.uri(),
            ..Config::default()
        };
        let client = Client::new();
        let blockfrost = BlockfrostClient::new(client.clone(), &config);
        let names = NameService::new(client, &config, blockfrost.clone());
        CardanoAdapter::new(blockfrost, names, GATEWAY)
    }

    fn holding(unit: &str, quantity: &str) -> AssetHolding {
        AssetHolding {
            unit: unit.to_string(),
            quantity: quantity.to_string(),
        }
    }

    #[test]
    fn token_uses_registry_ticker_decimals_and_logo() {
        let unit = format!("{}{}", POLICY, hex::encode("SNEK"));
        let info: AssetInfo = serde_json::from_value(json!({
            "asset": unit,
            "policy_id": POLICY,
            "asset_name": hex::encode("SNEK"),
            "metadata": { "name": "Snek", "ticker": "SNEK", "decimals": 0, "logo": "iVBORw0KGgo=" }
        }))
        .unwrap();

        let draft = token_draft(&holding(&unit, "1500"), Some(&info), GATEWAY);
        assert_eq!(draft.name, "Snek");
        assert_eq!(draft.image, "data:image/png;base64,iVBORw0KGgo=");
        match draft.body {
            DraftBody::Fungible(token) => {
                assert_eq!(token.symbol, "SNEK");
                assert_eq!(token.amount, 1500.0);
                assert_eq!(token.price, PriceHint::Ticker);
            }
            other => panic!("expected a token, got {:?}", other),
        }
    }

    #[test]
    fn token_without_metadata_decodes_asset_name() {
        // Memastikan nama aset hex tetap terbaca tanpa metadata
        let unit = format!("{}{}", POLICY, hex::encode("HOSKY"));
        let draft = token_draft(&holding(&unit, "10"), None, GATEWAY);
        assert_eq!(draft.name, "HOSKY");
        assert_eq!(draft.image, "");
    }

    #[test]
    fn nft_joins_chunked_image_and_reads_traits() {
        let unit = format!("{}{}", POLICY, hex::encode("Clay1"));
        let info: AssetInfo = serde_json::from_value(json!({
            "asset": unit,
            "policy_id": POLICY,
            "onchain_metadata": {
                "name": "Clay Nation #1",
                "image": ["ipfs://QmNiy4bvr5hURmsS8gHxy5LSWaHaS1S", "sg4u3qxEwXd7dMfy6"],
                "attributes": { "Body": "Clay" }
            }
        }))
        .unwrap();

        let draft = nft_draft(&holding(&unit, "1"), Some(&info), GATEWAY);
        assert_eq!(draft.name, "Clay Nation #1");
        assert_eq!(
            draft.image,
            "https://ipfs.io/ipfs/QmNiy4bvr5hURmsS8gHxy5LSWaHaS1Ssg4u3qxEwXd7dMfy6"
        );
        match draft.body {
            DraftBody::NonFungible(details) => {
                assert_eq!(details.collection, POLICY);
                assert_eq!(details.metadata.traits[0].trait_type, "Body");
            }
            other => panic!("expected an NFT, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn nft_listing_keeps_only_single_quantity_assets() {
        let server = MockServer::start().await;
        let nft_unit = format!("{}{}", POLICY, hex::encode("Pixel7"));
        let token_unit = format!("{}{}", POLICY, hex::encode("MIN"));
        Mock::given(method("GET"))
            .and(path("/addresses/addr1qwallet"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "stake_address": "stake1uwallet" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/accounts/stake1uwallet/addresses/assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "unit": nft_unit, "quantity": "1" },
                { "unit": token_unit, "quantity": "500" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/assets/{}", nft_unit)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "asset": nft_unit,
                "policy_id": POLICY,
                "onchain_metadata": { "name": "Pixel #7" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let drafts = adapter_for(&server)
            .list_assets("addr1qwallet", false)
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, nft_unit);
        assert_eq!(drafts[0].name, "Pixel #7");
        assert!(!drafts[0].is_fungible());
    }

    #[tokio::test]
    async fn address_without_stake_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/addresses/addr1qlonely"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stake_address": null })))
            .mount(&server)
            .await;

        let drafts = adapter_for(&server)
            .list_assets("addr1qlonely", true)
            .await
            .unwrap();
        assert!(drafts.is_empty());
    }

    #[tokio::test]
    async fn unresolved_handle_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = adapter_for(&server)
            .list_assets("$nobody", true)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
