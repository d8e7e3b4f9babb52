use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, Result},
    models::{Asset, AssetDraft, AssetKind, Chain, ChainFamily},
    services::normalizer::Normalizer,
};

/// One provider family's listing logic. Drafts are priced by the normalizer.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    async fn list(&self, chain: Chain, address: &str, kind: AssetKind) -> Result<Vec<AssetDraft>>;
}

/// Shape check before any upstream call; names must be resolved beforehand
/// (except Cardano `$handle`s, which the Cardano adapter resolves itself).
pub fn validate_address(chain: Chain, address: &str) -> Result<()> {
    let address = address.trim();
    let valid = match chain.family() {
        ChainFamily::Evm | ChainFamily::Monad => {
            address.len() == 42
                && address.starts_with("0x")
                && address[2..].chars().all(|c| c.is_ascii_hexdigit())
        }
        ChainFamily::Solana => bs58::decode(address)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false),
        ChainFamily::Cardano => {
            (address.starts_with('$') && address.len() > 1)
                || address.starts_with("addr1")
                || address.starts_with("stake1")
                || address.starts_with("addr_test1")
                || address.starts_with("stake_test1")
        }
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "{} is not a valid {} address",
            address, chain
        )))
    }
}

/// Routes each chain to its adapter, bounds it with a deadline, and degrades
/// upstream failure to an empty list.
pub struct Aggregator {
    evm: Arc<dyn ChainAdapter>,
    monad: Arc<dyn ChainAdapter>,
    solana: Arc<dyn ChainAdapter>,
    cardano: Arc<dyn ChainAdapter>,
    normalizer: Arc<Normalizer>,
    chain_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        evm: Arc<dyn ChainAdapter>,
        monad: Arc<dyn ChainAdapter>,
        solana: Arc<dyn ChainAdapter>,
        cardano: Arc<dyn ChainAdapter>,
        normalizer: Arc<Normalizer>,
        chain_timeout: Duration,
    ) -> Self {
        Self {
            evm,
            monad,
            solana,
            cardano,
            normalizer,
            chain_timeout,
        }
    }

    pub fn normalizer(&self) -> &Arc<Normalizer> {
        &self.normalizer
    }

    fn adapter_for(&self, chain: Chain) -> &dyn ChainAdapter {
        match chain.family() {
            ChainFamily::Evm => self.evm.as_ref(),
            ChainFamily::Monad => self.monad.as_ref(),
            ChainFamily::Solana => self.solana.as_ref(),
            ChainFamily::Cardano => self.cardano.as_ref(),
        }
    }

    /// Only `NotFound` (an unresolvable Cardano handle) and a malformed address
    /// surface as errors; everything else yields an empty list.
    pub async fn list_assets(&self, chain: Chain, address: &str, kind: AssetKind) -> Result<Vec<Asset>> {
        validate_address(chain, address)?;
        let address = address.trim();

        let listing = tokio::time::timeout(
            self.chain_timeout,
            self.adapter_for(chain).list(chain, address, kind),
        )
        .await;
        let drafts = match listing {
            Ok(Ok(drafts)) => drafts,
            Ok(Err(e)) if e.is_not_found() => return Err(e),
            Ok(Err(e)) => {
                tracing::warn!("{} {:?} listing for {} degraded: {}", chain, kind, address, e);
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    "{} {:?} listing for {} timed out after {:?}",
                    chain,
                    kind,
                    address,
                    self.chain_timeout
                );
                Vec::new()
            }
        };

        let wanted: Vec<AssetDraft> = drafts
            .into_iter()
            .filter(|draft| draft.is_fungible() == kind.wants_tokens())
            .collect();
        Ok(self.normalizer.normalize(wanted).await)
    }

    /// Concurrent listing across chains. Each chain fails on its own, into an empty list.
    pub async fn portfolio(
        &self,
        address: &str,
        chains: &[Chain],
        kind: AssetKind,
    ) -> BTreeMap<String, Vec<Asset>> {
        let listings = chains.iter().map(|chain| async move {
            let assets = match self.list_assets(*chain, address, kind).await {
                Ok(assets) => assets,
                Err(e) => {
                    tracing::debug!("{} dropped from portfolio: {}", chain, e);
                    Vec::new()
                }
            };
            (chain.to_string(), assets)
        });
        join_all(listings).await.into_iter().collect()
    }
}
