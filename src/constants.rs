/// Application constants

// Price cache
pub const PRICE_CACHE_TTL_SECS: u64 = 90;
pub const MARKET_CACHE_TTL_SECS: u64 = 600;

// Asset filtering
pub const DEFAULT_DUST_THRESHOLD: f64 = 0.000001;

// Fan-out bounds
pub const MAX_ERC20_METADATA_LOOKUPS: usize = 15;
pub const MAX_CARDANO_METADATA_LOOKUPS: usize = 40;
pub const MAX_SOLANA_NEW_TOKEN_ACCOUNTS: usize = 50;
pub const MAX_SOLANA_METADATA_LOOKUPS: usize = 15;
pub const MAX_LOG_DISCOVERED_CONTRACTS: usize = 15;
pub const LOG_SCAN_BLOCK_RANGE: u64 = 500_000;

// Timeouts
pub const UPSTREAM_TIMEOUT_SECS: u64 = 8;
pub const CHAIN_TIMEOUT_SECS: u64 = 12;

// Market data backoff (HTTP 429 only)
pub const MARKET_RETRY_ATTEMPTS: u32 = 3;
pub const MARKET_RETRY_BASE_MS: u64 = 250;

// Display defaults
pub const NATIVE_ASSET_ID: &str = "native";
pub const UNNAMED_NFT: &str = "Unnamed NFT";
pub const UNKNOWN_TOKEN_NAME: &str = "Unknown Token";
pub const UNKNOWN_SYMBOL: &str = "???";
pub const UNDECODED_SYMBOL: &str = "UNKNOWN";
pub const ZERO_NATIVE_PRICE: &str = "0.0000";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

// ERC20 ABI selectors
pub const SELECTOR_BALANCE_OF: &str = "0x70a08231";
pub const SELECTOR_DECIMALS: &str = "0x313ce567";
pub const SELECTOR_SYMBOL: &str = "0x95d89b41";
pub const SELECTOR_NAME: &str = "0x06fdde03";
/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_EVENT_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

// Solana
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const SOLANA_SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const SOLANA_FUNGIBLE_INTERFACES: [&str; 2] = ["FungibleToken", "FungibleAsset"];

// Cardano
pub const ADA_HANDLE_POLICY_ID: &str = "f0ff48bbb7bbe9d59a40f1ce90e9e9d0ff5002ec48f232b49ca0fb9a";
pub const LOVELACE_DECIMALS: u32 = 6;

/// Symbol/ticker -> CoinGecko id. Unknown symbols never hit the network.
pub const QUOTE_IDS: &[(&str, &str)] = &[
    // native currencies
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("ADA", "cardano"),
    ("MON", "monad"),
    ("POL", "polygon-ecosystem-token"),
    ("MATIC", "matic-network"),
    ("AVAX", "avalanche-2"),
    ("APE", "apecoin"),
    ("RON", "ronin"),
    ("XDAI", "xdai"),
    ("HYPE", "hyperliquid"),
    ("BTC", "bitcoin"),
    // cardano native tokens with a feed
    ("SNEK", "snek"),
    ("MIN", "minswap"),
    ("HOSKY", "hosky"),
    ("WMT", "world-mobile-token"),
    ("INDY", "indigo-protocol"),
    ("IAG", "iagon"),
    ("AGIX", "singularitynet"),
    ("COPI", "cornucopias"),
    ("DJED", "djed"),
];

pub const STABLECOIN_TICKERS: [&str; 8] =
    ["USDT", "USDC", "DAI", "DJED", "USDM", "IUSD", "USDA", "PYUSD"];

/// Popular Monad contracts probed directly when the indexer under-reports.
pub const MONAD_KNOWN_TOKENS: [&str; 5] = [
    "0x3bd359c1119da7da1d913d1c4d2b7c461115433a",
    "0x754704bc059f8c67012fed69bc8a327a5aafb603",
    "0xe7cd86e13ac4309349f30b3435a9d337750fc82d",
    "0xee8c0e9f1bffb4eb878d8f15f368a02a35481242",
    "0x0555e30da8f98308edb960aa94c0db47230d2b9c",
];

pub const MONAD_DEFAULT_RPC_URLS: [&str; 2] =
    ["https://rpc.monad.xyz", "https://rpc1.monadinfra.com"];

