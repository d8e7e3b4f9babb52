use async_trait::async_trait;
use futures_util::future::join_all;

use crate::{
    constants::{MAX_ERC20_METADATA_LOOKUPS, UNKNOWN_SYMBOL, UNKNOWN_TOKEN_NAME, UNNAMED_NFT},
    error::{AppError, Result},
    integrations::alchemy::{AlchemyClient, AlchemyNft, IndexedTokenBalance},
    models::{chain_spec, AssetDraft, AssetKind, Chain, NftDetails, NftMetadata, PriceHint, Trait},
    services::aggregator::ChainAdapter,
    utils::{first_non_empty, resolve_image_url, scale_units},
};

/// Alchemy-backed listings for every EVM chain in the chain table.
pub struct EvmAdapter {
    alchemy: AlchemyClient,
    ipfs_gateway: String,
}

impl EvmAdapter {
    pub fn new(alchemy: AlchemyClient, ipfs_gateway: impl Into<String>) -> Self {
        Self {
            alchemy,
            ipfs_gateway: ipfs_gateway.into(),
        }
    }

    fn network(chain: Chain) -> Result<&'static str> {
        chain_spec(chain)
            .alchemy_network
            .ok_or_else(|| AppError::BadRequest(format!("{} has no EVM indexer", chain)))
    }

    pub async fn list_nfts(&self, chain: Chain, address: &str) -> Result<Vec<AssetDraft>> {
        let network = Self::network(chain)?;
        let owned = self.alchemy.nfts_for_owner(network, address).await?;
        Ok(owned
            .iter()
            .map(|nft| nft_draft(chain, nft, &self.ipfs_gateway))
            .collect())
    }

    /// Native balance and indexed ERC20 balances, fetched together. Either
    /// call failing fails the listing.
    pub async fn list_tokens(&self, chain: Chain, address: &str) -> Result<Vec<AssetDraft>> {
        let network = Self::network(chain)?;
        let (native, balances) = tokio::join!(
            self.alchemy.native_balance(network, address),
            self.alchemy.token_balances(network, address)
        );
        let native = native?;
        let balances = balances?;

        let mut drafts = vec![AssetDraft::native(
            chain,
            scale_units(native, chain_spec(chain).native_decimals),
        )];
        drafts.extend(
            indexed_token_drafts(&self.alchemy, network, chain, balances, &self.ipfs_gateway).await,
        );
        Ok(drafts)
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    async fn list(&self, chain: Chain, address: &str, kind: AssetKind) -> Result<Vec<AssetDraft>> {
        match kind {
            AssetKind::Tokens => self.list_tokens(chain, address).await,
            AssetKind::Nfts => self.list_nfts(chain, address).await,
        }
    }
}

/// Metadata lookups for the first non-zero balances, run concurrently. A
/// failed lookup drops only that token.
pub async fn indexed_token_drafts(
    alchemy: &AlchemyClient,
    network: &str,
    chain: Chain,
    balances: Vec<IndexedTokenBalance>,
    gateway: &str,
) -> Vec<AssetDraft> {
    let candidates = balances
        .into_iter()
        .filter(|balance| !balance.raw_balance.is_zero())
        .take(MAX_ERC20_METADATA_LOOKUPS);

    let lookups = candidates.map(|balance| async move {
        match alchemy.token_metadata(network, &balance.contract_address).await {
            Ok(meta) => {
                let decimals = meta.decimals.unwrap_or(18);
                let name = first_non_empty([meta.name.as_deref()])
                    .unwrap_or_else(|| UNKNOWN_TOKEN_NAME.to_string());
                let symbol = first_non_empty([meta.symbol.as_deref()])
                    .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());
                let image = resolve_image_url(meta.logo.as_deref().unwrap_or_default(), gateway);
                Some(AssetDraft::token(
                    chain,
                    balance.contract_address.clone(),
                    name,
                    symbol,
                    image,
                    scale_units(balance.raw_balance, decimals),
                    PriceHint::Contract(balance.contract_address),
                ))
            }
            Err(e) => {
                tracing::debug!(
                    "metadata lookup for {} on {} failed: {}",
                    balance.contract_address,
                    chain,
                    e
                );
                None
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}

/// Maps one indexed NFT. Name, image, and traits each come from the first
/// populated source.
pub fn nft_draft(chain: Chain, nft: &AlchemyNft, gateway: &str) -> AssetDraft {
    let raw_metadata = nft.raw.as_ref().and_then(|raw| raw.metadata.as_ref());
    let raw_field = |field: &str| {
        raw_metadata
            .and_then(|meta| meta.get(field))
            .and_then(|value| value.as_str())
    };

    let name = first_non_empty([nft.name.as_deref(), nft.title.as_deref(), raw_field("name")])
        .unwrap_or_else(|| UNNAMED_NFT.to_string());

    let image_source = nft.image.as_ref().and_then(|image| {
        first_non_empty([
            image.cached_url.as_deref(),
            image.thumbnail_url.as_deref(),
            image.original_url.as_deref(),
        ])
    });
    let image = image_source
        .or_else(|| first_non_empty([raw_field("image"), raw_field("image_url")]))
        .map(|raw| resolve_image_url(&raw, gateway))
        .unwrap_or_default();

    let collection = first_non_empty([
        nft.collection.as_ref().and_then(|c| c.name.as_deref()),
        nft.contract.name.as_deref(),
    ])
    .unwrap_or_default();

    let traits = raw_metadata
        .and_then(|meta| meta.get("attributes").or_else(|| meta.get("traits")))
        .map(Trait::list_from_json)
        .unwrap_or_default();

    let description = first_non_empty([nft.description.as_deref(), raw_field("description")])
        .unwrap_or_default();

    AssetDraft::nft(
        chain,
        format!("{}:{}", nft.contract.address.to_ascii_lowercase(), nft.token_id),
        name,
        image,
        NftDetails {
            collection,
            metadata: NftMetadata {
                traits,
                description,
            },
        },
    )
}
