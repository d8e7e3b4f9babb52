// src/models/mod.rs
pub mod asset;
pub mod chain;
pub mod market;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use asset::{
    Asset, AssetDetails, AssetDraft, AssetKind, AssetListResponse, DraftBody, FungibleDetails,
    NftDetails, NftMetadata, PriceHint, TokenDraft, Trait,
};
pub use market::{Candle, PriceQuote};
pub use chain::{chain_spec, validate_chain_table, Chain, ChainFamily, ChainSpec};
