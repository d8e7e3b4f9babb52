// All service modules
pub mod aggregator;
pub mod cardano_adapter;
pub mod evm_adapter;
pub mod market_data;
pub mod monad_adapter;
pub mod normalizer;
pub mod price_cache;
pub mod price_resolver;
pub mod provider_chain;
pub mod rpc_scanner;
pub mod solana_adapter;

// Re-export for convenience
pub use aggregator::{Aggregator, ChainAdapter};
pub use cardano_adapter::CardanoAdapter;
pub use evm_adapter::EvmAdapter;
pub use market_data::MarketData;
pub use monad_adapter::MonadAdapter;
pub use normalizer::Normalizer;
pub use price_cache::{build_price_cache, PriceCache};
pub use price_resolver::PriceResolver;
pub use rpc_scanner::RpcScanner;
pub use solana_adapter::SolanaAdapter;
