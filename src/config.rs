use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::constants::{
    CHAIN_TIMEOUT_SECS, DEFAULT_DUST_THRESHOLD, DEFAULT_IPFS_GATEWAY, MARKET_CACHE_TTL_SECS,
    MONAD_DEFAULT_RPC_URLS, MONAD_KNOWN_TOKENS, PRICE_CACHE_TTL_SECS, UPSTREAM_TIMEOUT_SECS,
};
use crate::models::validate_chain_table;
use crate::utils::split_list;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: String,

    // EVM indexer (Alchemy); `{network}` is replaced per chain
    pub alchemy_api_key: Option<String>,
    pub alchemy_url_template: String,

    // Solana (Helius DAS + RPC)
    pub helius_api_key: Option<String>,
    pub helius_rpc_url: String,

    // Cardano (Blockfrost)
    pub blockfrost_project_id: Option<String>,
    pub blockfrost_api_url: String,

    // Quote sources
    pub coingecko_api_key: Option<String>,
    pub coingecko_api_url: String,
    pub dexscreener_api_url: String,
    pub dia_api_url: String,
    pub binance_api_url: String,
    pub kraken_api_url: String,
    pub gemini_api_url: String,

    // Name resolution
    pub eth_rpc_url: String,
    pub unstoppable_api_key: Option<String>,
    pub unstoppable_api_url: String,
    pub handle_api_url: String,
    pub sns_proxy_url: String,

    // Monad raw RPC fallback
    pub monad_rpc_urls: Vec<String>,
    pub monad_known_tokens: Vec<String>,

    // Caching
    pub redis_url: Option<String>,
    pub price_cache_ttl_secs: u64,
    pub market_cache_ttl_secs: u64,

    // Listing behaviour
    pub ipfs_gateway: String,
    pub dust_threshold: f64,
    pub upstream_timeout_secs: u64,
    pub chain_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_allowed_origins: "*".to_string(),
            alchemy_api_key: None,
            alchemy_url_template: "https://{network}.g.alchemy.com".to_string(),
            helius_api_key: None,
            helius_rpc_url: "https://mainnet.helius-rpc.com".to_string(),
            blockfrost_project_id: None,
            blockfrost_api_url: "https://cardano-mainnet.blockfrost.io/api/v0".to_string(),
            coingecko_api_key: None,
            coingecko_api_url: "https://api.coingecko.com/api/v3".to_string(),
            dexscreener_api_url: "https://api.dexscreener.com".to_string(),
            dia_api_url: "https://api.diadata.org/v1".to_string(),
            binance_api_url: "https://api.binance.com".to_string(),
            kraken_api_url: "https://api.kraken.com".to_string(),
            gemini_api_url: "https://api.gemini.com".to_string(),
            eth_rpc_url: "https://eth.llamarpc.com".to_string(),
            unstoppable_api_key: None,
            unstoppable_api_url: "https://api.unstoppabledomains.com".to_string(),
            handle_api_url: "https://api.handle.me".to_string(),
            sns_proxy_url: "https://sns-sdk-proxy.bonfida.workers.dev".to_string(),
            monad_rpc_urls: MONAD_DEFAULT_RPC_URLS.iter().map(|s| s.to_string()).collect(),
            monad_known_tokens: MONAD_KNOWN_TOKENS.iter().map(|s| s.to_string()).collect(),
            redis_url: None,
            price_cache_ttl_secs: PRICE_CACHE_TTL_SECS,
            market_cache_ttl_secs: MARKET_CACHE_TTL_SECS,
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            dust_threshold: DEFAULT_DUST_THRESHOLD,
            upstream_timeout_secs: UPSTREAM_TIMEOUT_SECS,
            chain_timeout_secs: CHAIN_TIMEOUT_SECS,
        }
    }
}

// Internal helper that reads an optional, non-blank env value.
fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Internal helper that reads an env value or keeps the default.
fn env_or(key: &str, default: String) -> String {
    env_opt(key).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        Ok(Config {
            host: env_or("HOST", defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,
            cors_allowed_origins: env_or("CORS_ALLOWED_ORIGINS", defaults.cors_allowed_origins),

            alchemy_api_key: env_opt("ALCHEMY_API_KEY"),
            alchemy_url_template: env_or("ALCHEMY_URL_TEMPLATE", defaults.alchemy_url_template),

            helius_api_key: env_opt("HELIUS_API_KEY"),
            helius_rpc_url: env_or("HELIUS_RPC_URL", defaults.helius_rpc_url),

            blockfrost_project_id: env_opt("BLOCKFROST_PROJECT_ID"),
            blockfrost_api_url: env_or("BLOCKFROST_API_URL", defaults.blockfrost_api_url),

            coingecko_api_key: env_opt("COINGECKO_API_KEY"),
            coingecko_api_url: env_or("COINGECKO_API_URL", defaults.coingecko_api_url),
            dexscreener_api_url: env_or("DEXSCREENER_API_URL", defaults.dexscreener_api_url),
            dia_api_url: env_or("DIA_API_URL", defaults.dia_api_url),
            binance_api_url: env_or("BINANCE_API_URL", defaults.binance_api_url),
            kraken_api_url: env_or("KRAKEN_API_URL", defaults.kraken_api_url),
            gemini_api_url: env_or("GEMINI_API_URL", defaults.gemini_api_url),

            eth_rpc_url: env_or("ETH_RPC_URL", defaults.eth_rpc_url),
            unstoppable_api_key: env_opt("UNSTOPPABLE_API_KEY"),
            unstoppable_api_url: env_or("UNSTOPPABLE_API_URL", defaults.unstoppable_api_url),
            handle_api_url: env_or("HANDLE_API_URL", defaults.handle_api_url),
            sns_proxy_url: env_or("SNS_PROXY_URL", defaults.sns_proxy_url),

            monad_rpc_urls: env_opt("MONAD_RPC_URLS")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.monad_rpc_urls),
            monad_known_tokens: env_opt("MONAD_KNOWN_TOKENS")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.monad_known_tokens),

            redis_url: env_opt("REDIS_URL"),
            price_cache_ttl_secs: env::var("PRICE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| defaults.price_cache_ttl_secs.to_string())
                .parse()?,
            market_cache_ttl_secs: env::var("MARKET_CACHE_TTL_SECS")
                .unwrap_or_else(|_| defaults.market_cache_ttl_secs.to_string())
                .parse()?,

            ipfs_gateway: env_or("IPFS_GATEWAY", defaults.ipfs_gateway),
            dust_threshold: env::var("DUST_THRESHOLD")
                .unwrap_or_else(|_| defaults.dust_threshold.to_string())
                .parse()?,
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.upstream_timeout_secs.to_string())
                .parse()?,
            chain_timeout_secs: env::var("CHAIN_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.chain_timeout_secs.to_string())
                .parse()?,
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.price_cache_ttl_secs == 0 || self.market_cache_ttl_secs == 0 {
            anyhow::bail!("Cache TTLs must be > 0");
        }
        if !self.dust_threshold.is_finite() || self.dust_threshold <= 0.0 {
            anyhow::bail!("DUST_THRESHOLD must be a positive number");
        }
        if self.upstream_timeout_secs == 0 || self.chain_timeout_secs == 0 {
            anyhow::bail!("Timeouts must be > 0");
        }
        if self.monad_rpc_urls.is_empty() {
            anyhow::bail!("MONAD_RPC_URLS is empty");
        }
        if let Err(problems) = validate_chain_table() {
            anyhow::bail!("Chain table invalid: {}", problems.join("; "));
        }

        if self.alchemy_api_key.is_none() {
            tracing::warn!("ALCHEMY_API_KEY missing; EVM and Monad listings will be empty");
        }
        if self.helius_api_key.is_none() {
            tracing::warn!("HELIUS_API_KEY missing; Solana listings will be empty");
        }
        if self.blockfrost_project_id.is_none() {
            tracing::warn!("BLOCKFROST_PROJECT_ID missing; Cardano listings will be empty");
        }
        if self.unstoppable_api_key.is_none() {
            tracing::warn!("UNSTOPPABLE_API_KEY missing; Unstoppable lookups will fail");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn price_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.price_cache_ttl_secs)
    }

    pub fn market_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.market_cache_ttl_secs)
    }

    pub fn chain_timeout(&self) -> Duration {
        Duration::from_secs(self.chain_timeout_secs)
    }

    /// Base URL of the Alchemy host serving `network`.
    pub fn alchemy_base_url(&self, network: &str) -> String {
        self.alchemy_url_template
            .replace("{network}", network)
            .trim_end_matches('/')
            .to_string()
    }
}
