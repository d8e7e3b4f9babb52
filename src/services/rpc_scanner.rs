use ethers::types::U256;
use futures_util::future::join_all;

use crate::{
    constants::{
        LOG_SCAN_BLOCK_RANGE, SELECTOR_DECIMALS, SELECTOR_NAME, SELECTOR_SYMBOL,
        TRANSFER_EVENT_TOPIC, UNDECODED_SYMBOL,
    },
    integrations::evm_rpc::{decode_abi_string, decode_uint, encode_balance_of, RpcFanout},
};

/// ERC20 holding read straight from contract calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedToken {
    pub contract: String,
    pub raw_balance: U256,
    pub decimals: u32,
    pub symbol: String,
    pub name: String,
}

/// On-chain discovery for tokens an indexer has not picked up yet.
#[derive(Clone, Debug)]
pub struct RpcScanner {
    rpc: RpcFanout,
}

impl RpcScanner {
    pub fn new(rpc: RpcFanout) -> Self {
        Self { rpc }
    }

    /// `balanceOf` first; a zero or failed balance ends the probe. Decimals
    /// default to 18 and an undecodable symbol becomes "UNKNOWN".
    pub async fn probe(&self, contract: &str, owner: &str) -> Option<ProbedToken> {
        let raw = match self.rpc.eth_call(contract, &encode_balance_of(owner)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("balanceOf probe on {} failed: {}", contract, e);
                return None;
            }
        };
        let raw_balance = decode_uint(&raw)?;
        if raw_balance.is_zero() {
            return None;
        }

        let (decimals, symbol, name) = tokio::join!(
            self.rpc.eth_call(contract, SELECTOR_DECIMALS),
            self.rpc.eth_call(contract, SELECTOR_SYMBOL),
            self.rpc.eth_call(contract, SELECTOR_NAME)
        );
        let decimals = decimals
            .ok()
            .and_then(|raw| decode_uint(&raw))
            .filter(|d| *d <= U256::from(77u8))
            .map(|d| d.as_u32())
            .unwrap_or(18);
        let symbol = symbol
            .ok()
            .and_then(|raw| decode_abi_string(&raw))
            .unwrap_or_else(|| UNDECODED_SYMBOL.to_string());
        let name = name
            .ok()
            .and_then(|raw| decode_abi_string(&raw))
            .unwrap_or_else(|| symbol.clone());

        Some(ProbedToken {
            contract: contract.to_ascii_lowercase(),
            raw_balance,
            decimals,
            symbol,
            name,
        })
    }

    pub async fn probe_all(&self, contracts: &[String], owner: &str) -> Vec<ProbedToken> {
        join_all(contracts.iter().map(|contract| self.probe(contract, owner)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Contracts that sent the wallet a Transfer within the scan window. Any
    /// failure yields an empty list.
    pub async fn transfer_senders(&self, owner: &str) -> Vec<String> {
        let head = match self.rpc.block_number().await {
            Ok(head) => head,
            Err(e) => {
                tracing::debug!("block number lookup failed: {}", e);
                return Vec::new();
            }
        };
        let from_block = head.saturating_sub(LOG_SCAN_BLOCK_RANGE);
        match self
            .rpc
            .transfer_log_contracts(owner, TRANSFER_EVENT_TOPIC, from_block)
            .await
        {
            Ok(contracts) => contracts,
            Err(e) => {
                tracing::debug!("transfer log scan for {} failed: {}", owner, e);
                Vec::new()
            }
        }
    }
}
