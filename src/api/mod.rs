// src/api/mod.rs

pub mod assets;
pub mod health;
pub mod market;
pub mod resolve;

use std::sync::Arc;

use crate::{
    config::Config,
    error::Result,
    integrations::{
        build_http_client, AlchemyClient, BlockfrostClient, CoinGeckoClient, DexScreenerClient,
        HeliusClient, MarketFeeds, NameService, RpcFanout,
    },
    services::{
        build_price_cache, Aggregator, CardanoAdapter, ChainAdapter, EvmAdapter, MarketData,
        MonadAdapter, Normalizer, PriceResolver, RpcScanner, SolanaAdapter,
    },
};

// AppState definition
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub aggregator: Arc<Aggregator>,
    pub names: Arc<NameService>,
    pub market: Arc<MarketData>,
}

impl AppState {
    /// Wires every upstream client onto one shared HTTP client and price cache.
    pub async fn build(config: Config) -> Result<Self> {
        let client = build_http_client(&config)?;
        let cache = build_price_cache(&config).await;

        let coingecko = CoinGeckoClient::new(client.clone(), &config);
        let resolver = Arc::new(PriceResolver::new(
            cache,
            coingecko.clone(),
            DexScreenerClient::new(client.clone(), &config),
        ));
        let normalizer = Arc::new(Normalizer::new(resolver, config.dust_threshold));

        let alchemy = AlchemyClient::new(client.clone(), &config);
        let blockfrost = BlockfrostClient::new(client.clone(), &config);
        let names = NameService::new(client.clone(), &config, blockfrost.clone());
        let scanner = RpcScanner::new(RpcFanout::new(client.clone(), config.monad_rpc_urls.clone()));

        let evm: Arc<dyn ChainAdapter> =
            Arc::new(EvmAdapter::new(alchemy.clone(), config.ipfs_gateway.clone()));
        let monad: Arc<dyn ChainAdapter> = Arc::new(MonadAdapter::new(
            alchemy,
            scanner,
            config.monad_known_tokens.clone(),
            config.ipfs_gateway.clone(),
        ));
        let solana: Arc<dyn ChainAdapter> = Arc::new(SolanaAdapter::new(
            HeliusClient::new(client.clone(), &config),
            config.ipfs_gateway.clone(),
        ));
        let cardano: Arc<dyn ChainAdapter> = Arc::new(CardanoAdapter::new(
            blockfrost,
            names.clone(),
            config.ipfs_gateway.clone(),
        ));

        let aggregator = Aggregator::new(
            evm,
            monad,
            solana,
            cardano,
            normalizer,
            config.chain_timeout(),
        );
        let market = MarketData::new(coingecko, MarketFeeds::new(client, &config), &config);

        Ok(Self {
            config,
            aggregator: Arc::new(aggregator),
            names: Arc::new(names),
            market: Arc::new(market),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppState;
    use crate::config::Config;
    use wiremock::MockServer;

    /// State whose every upstream points at `server`; no provider keys are set.
    pub async fn state_for(server: &MockServer) -> AppState {
        let uri = server.uri();
        let config = Config {
            alchemy_url_template: uri.clone(),
            helius_rpc_url: uri.clone(),
            blockfrost_api_url: uri.clone(),
            coingecko_api_url: uri.clone(),
            dexscreener_api_url: uri.clone(),
            dia_api_url: uri.clone(),
            binance_api_url: uri.clone(),
            kraken_api_url: uri.clone(),
            gemini_api_url: uri.clone(),
            eth_rpc_url: uri.clone(),
            unstoppable_api_url: uri.clone(),
            handle_api_url: uri.clone(),
            sns_proxy_url: uri.clone(),
            monad_rpc_urls: vec![uri],
            ..Config::default()
        };
        AppState::build(config).await.unwrap()
    }
}
