use async_trait::async_trait;
use std::collections::HashSet;

use crate::{
    constants::MAX_LOG_DISCOVERED_CONTRACTS,
    error::{AppError, Result},
    integrations::AlchemyClient,
    models::{chain_spec, AssetDraft, AssetKind, Chain, PriceHint},
    services::{
        aggregator::ChainAdapter,
        evm_adapter::{indexed_token_drafts, EvmAdapter},
        rpc_scanner::{ProbedToken, RpcScanner},
    },
    utils::scale_units,
};

/// Indexer listing for Monad, topped up by direct contract probes.
pub struct MonadAdapter {
    alchemy: AlchemyClient,
    nfts: EvmAdapter,
    scanner: RpcScanner,
    known_tokens: Vec<String>,
    ipfs_gateway: String,
}

impl MonadAdapter {
    pub fn new(
        alchemy: AlchemyClient,
        scanner: RpcScanner,
        known_tokens: Vec<String>,
        ipfs_gateway: impl Into<String>,
    ) -> Self {
        let ipfs_gateway = ipfs_gateway.into();
        Self {
            nfts: EvmAdapter::new(alchemy.clone(), ipfs_gateway.clone()),
            alchemy,
            scanner,
            known_tokens: known_tokens
                .into_iter()
                .map(|address| address.trim().to_ascii_lowercase())
                .collect(),
            ipfs_gateway,
        }
    }

    /// Native and indexed balances must both succeed; either failing fails
    /// the whole listing. Known contracts, then Transfer-log senders, are
    /// probed for anything the indexer missed.
    pub async fn list_tokens(&self, address: &str) -> Result<Vec<AssetDraft>> {
        let chain = Chain::Monad;
        let spec = chain_spec(chain);
        let network = spec
            .alchemy_network
            .ok_or_else(|| AppError::Internal("Monad has no indexer network".into()))?;

        let (native, balances) = tokio::join!(
            self.alchemy.native_balance(network, address),
            self.alchemy.token_balances(network, address)
        );
        let native = native?;
        let balances = balances?;

        let mut seen: HashSet<String> = balances
            .iter()
            .map(|balance| balance.contract_address.to_ascii_lowercase())
            .collect();

        let mut drafts = vec![AssetDraft::native(
            chain,
            scale_units(native, spec.native_decimals),
        )];
        drafts.extend(
            indexed_token_drafts(&self.alchemy, network, chain, balances, &self.ipfs_gateway).await,
        );

        let known: Vec<String> = self
            .known_tokens
            .iter()
            .filter(|contract| !seen.contains(*contract))
            .cloned()
            .collect();
        seen.extend(known.iter().cloned());
        let probed = self.scanner.probe_all(&known, address).await;
        if !probed.is_empty() {
            tracing::debug!("{} known Monad tokens found by direct probe", probed.len());
        }
        drafts.extend(probed.into_iter().map(probed_draft));

        let discovered: Vec<String> = self
            .scanner
            .transfer_senders(address)
            .await
            .into_iter()
            .filter(|contract| !seen.contains(contract))
            .take(MAX_LOG_DISCOVERED_CONTRACTS)
            .collect();
        if !discovered.is_empty() {
            let probed = self.scanner.probe_all(&discovered, address).await;
            drafts.extend(probed.into_iter().map(probed_draft));
        }

        Ok(drafts)
    }
}

#[async_trait]
impl ChainAdapter for MonadAdapter {
    async fn list(&self, chain: Chain, address: &str, kind: AssetKind) -> Result<Vec<AssetDraft>> {
        match kind {
            AssetKind::Tokens => self.list_tokens(address).await,
            AssetKind::Nfts => self.nfts.list_nfts(chain, address).await,
        }
    }
}

// Internal helper that supports `probed_draft` operations.
fn probed_draft(token: ProbedToken) -> AssetDraft {
    AssetDraft::token(
        Chain::Monad,
        token.contract.clone(),
        token.name,
        token.symbol,
        String::new(),
        scale_units(token.raw_balance, token.decimals),
        PriceHint::Contract(token.contract),
    )
}
