use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::HashSet;

use crate::{
    constants::{
        MAX_SOLANA_METADATA_LOOKUPS, MAX_SOLANA_NEW_TOKEN_ACCOUNTS, SOLANA_FUNGIBLE_INTERFACES,
        SPL_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID, UNDECODED_SYMBOL, UNKNOWN_SYMBOL,
        UNKNOWN_TOKEN_NAME, UNNAMED_NFT,
    },
    error::Result,
    integrations::helius::{DasAsset, DasTokenType, HeliusClient, ParsedTokenAccount},
    models::{
        chain_spec, AssetDraft, AssetKind, Chain, NftDetails, NftMetadata, PriceHint, Trait,
    },
    services::aggregator::ChainAdapter,
    utils::{first_non_empty, json_as_f64, resolve_image_url, scale_decimal_str},
};

pub fn is_fungible_interface(interface: Option<&str>) -> bool {
    interface.is_some_and(|tag| SOLANA_FUNGIBLE_INTERFACES.contains(&tag))
}

/// Helius DAS listings with a direct token-account pass for fresh mints.
pub struct SolanaAdapter {
    helius: HeliusClient,
    ipfs_gateway: String,
}

impl SolanaAdapter {
    pub fn new(helius: HeliusClient, ipfs_gateway: impl Into<String>) -> Self {
        Self {
            helius,
            ipfs_gateway: ipfs_gateway.into(),
        }
    }

    pub async fn list_assets(&self, address: &str, want_tokens: bool) -> Result<Vec<AssetDraft>> {
        if want_tokens {
            self.list_tokens(address).await
        } else {
            self.list_nfts(address).await
        }
    }

    async fn list_nfts(&self, address: &str) -> Result<Vec<AssetDraft>> {
        let page = self
            .helius
            .search_assets(address, DasTokenType::NonFungible)
            .await?;
        Ok(page
            .items
            .iter()
            .filter(|asset| !is_fungible_interface(asset.interface.as_deref()))
            .map(|asset| self.nft_draft(asset))
            .collect())
    }

    async fn list_tokens(&self, address: &str) -> Result<Vec<AssetDraft>> {
        let page = self
            .helius
            .search_assets(address, DasTokenType::Fungible)
            .await?;

        let mut drafts = Vec::new();
        if let Some(native) = &page.native_balance {
            let decimals = chain_spec(Chain::Solana).native_decimals;
            drafts.push(AssetDraft::native(
                Chain::Solana,
                native.lamports as f64 / 10_f64.powi(decimals as i32),
            ));
        }

        let mut seen: HashSet<String> = HashSet::new();
        for asset in page
            .items
            .iter()
            .filter(|asset| is_fungible_interface(asset.interface.as_deref()))
        {
            seen.insert(asset.id.clone());
            drafts.push(self.token_draft(asset));
        }

        drafts.extend(self.fresh_mints(address, &seen).await);
        Ok(drafts)
    }

    /// Token accounts the indexer has not reported yet. Best effort: any
    /// failure here only shortens the list.
    async fn fresh_mints(&self, address: &str, seen: &HashSet<String>) -> Vec<AssetDraft> {
        let (spl, token_2022) = tokio::join!(
            self.helius.token_accounts_by_owner(address, SPL_TOKEN_PROGRAM_ID),
            self.helius.token_accounts_by_owner(address, TOKEN_2022_PROGRAM_ID)
        );
        let mut accounts: Vec<ParsedTokenAccount> = Vec::new();
        for result in [spl, token_2022] {
            match result {
                Ok(found) => accounts.extend(found),
                Err(e) => tracing::debug!("token account scan for {} failed: {}", address, e),
            }
        }

        let mut picked: HashSet<String> = HashSet::new();
        let fresh: Vec<ParsedTokenAccount> = accounts
            .into_iter()
            .filter(|account| account.raw_amount.trim() != "0")
            // single-unit, zero-decimal accounts are NFTs
            .filter(|account| !(account.decimals == 0 && account.raw_amount.trim() == "1"))
            .filter(|account| !seen.contains(&account.mint))
            .filter(|account| picked.insert(account.mint.clone()))
            .take(MAX_SOLANA_NEW_TOKEN_ACCOUNTS)
            .collect();

        let lookups = fresh.into_iter().enumerate().map(|(index, account)| async move {
            let metadata = if index < MAX_SOLANA_METADATA_LOOKUPS {
                match self.helius.get_asset(&account.mint).await {
                    Ok(asset) => Some(asset),
                    Err(e) => {
                        tracing::debug!("getAsset for {} failed: {}", account.mint, e);
                        None
                    }
                }
            } else {
                None
            };
            self.fresh_mint_draft(account, metadata.as_ref())
        });
        join_all(lookups).await
    }

    fn token_draft(&self, asset: &DasAsset) -> AssetDraft {
        let metadata = asset.content.as_ref().map(|content| &content.metadata);
        let token_info = asset.token_info.as_ref();

        let symbol = first_non_empty([
            token_info.and_then(|info| info.symbol.as_deref()),
            metadata.and_then(|meta| meta.symbol.as_deref()),
        ])
        .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());
        let name = first_non_empty([metadata.and_then(|meta| meta.name.as_deref())])
            .unwrap_or_else(|| UNKNOWN_TOKEN_NAME.to_string());
        let decimals = token_info.and_then(|info| info.decimals).unwrap_or(0);
        let amount = token_info
            .and_then(|info| info.balance.as_ref())
            .and_then(json_as_f64)
            .map(|raw| raw / 10_f64.powi(decimals as i32))
            .unwrap_or(0.0);
        let price = token_info
            .and_then(|info| info.price_info.as_ref())
            .and_then(|price| price.price_per_token)
            .map(PriceHint::Quoted)
            .unwrap_or(PriceHint::Unpriced);
        let image = asset
            .image_source()
            .map(|raw| resolve_image_url(&raw, &self.ipfs_gateway))
            .unwrap_or_default();

        AssetDraft::token(Chain::Solana, asset.id.clone(), name, symbol, image, amount, price)
    }

    fn fresh_mint_draft(&self, account: ParsedTokenAccount, metadata: Option<&DasAsset>) -> AssetDraft {
        let meta = metadata
            .and_then(|asset| asset.content.as_ref())
            .map(|content| &content.metadata);
        let symbol = first_non_empty([
            metadata
                .and_then(|asset| asset.token_info.as_ref())
                .and_then(|info| info.symbol.as_deref()),
            meta.and_then(|m| m.symbol.as_deref()),
        ])
        .unwrap_or_else(|| UNDECODED_SYMBOL.to_string());
        let name = first_non_empty([meta.and_then(|m| m.name.as_deref())])
            .unwrap_or_else(|| symbol.clone());
        let image = metadata
            .and_then(DasAsset::image_source)
            .map(|raw| resolve_image_url(&raw, &self.ipfs_gateway))
            .unwrap_or_default();

        AssetDraft::token(
            Chain::Solana,
            account.mint.clone(),
            name,
            symbol,
            image,
            scale_decimal_str(&account.raw_amount, account.decimals),
            PriceHint::Contract(account.mint),
        )
    }

    fn nft_draft(&self, asset: &DasAsset) -> AssetDraft {
        let metadata = asset.content.as_ref().map(|content| &content.metadata);
        let name = first_non_empty([metadata.and_then(|meta| meta.name.as_deref())])
            .unwrap_or_else(|| UNNAMED_NFT.to_string());
        let image = asset
            .image_source()
            .map(|raw| resolve_image_url(&raw, &self.ipfs_gateway))
            .unwrap_or_default();
        let traits = metadata
            .and_then(|meta| meta.attributes.as_ref())
            .map(|attributes| Trait::list_from_json(&serde_json::Value::Array(attributes.clone())))
            .unwrap_or_default();
        let description = metadata
            .and_then(|meta| meta.description.clone())
            .unwrap_or_default();

        AssetDraft::nft(
            Chain::Solana,
            asset.id.clone(),
            name,
            image,
            NftDetails {
                collection: asset.collection_label(),
                metadata: NftMetadata {
                    traits,
                    description,
                },
            },
        )
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    async fn list(&self, _chain: Chain, address: &str, kind: AssetKind) -> Result<Vec<AssetDraft>> {
        self.list_assets(address, kind.wants_tokens()).await
    }
}
