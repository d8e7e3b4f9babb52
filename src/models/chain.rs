use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Base,
    Polygon,
    Avalanche,
    Optimism,
    Arbitrum,
    Blast,
    Zora,
    Abstract,
    Apechain,
    Soneium,
    Ronin,
    Worldchain,
    Gnosis,
    Hyperevm,
    Monad,
    Solana,
    Cardano,
}

/// Which adapter owns a chain's listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    Evm,
    Monad,
    Solana,
    Cardano,
}

impl Chain {
    pub const ALL: [Chain; 18] = [
        Chain::Ethereum,
        Chain::Base,
        Chain::Polygon,
        Chain::Avalanche,
        Chain::Optimism,
        Chain::Arbitrum,
        Chain::Blast,
        Chain::Zora,
        Chain::Abstract,
        Chain::Apechain,
        Chain::Soneium,
        Chain::Ronin,
        Chain::Worldchain,
        Chain::Gnosis,
        Chain::Hyperevm,
        Chain::Monad,
        Chain::Solana,
        Chain::Cardano,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Base => "base",
            Chain::Polygon => "polygon",
            Chain::Avalanche => "avalanche",
            Chain::Optimism => "optimism",
            Chain::Arbitrum => "arbitrum",
            Chain::Blast => "blast",
            Chain::Zora => "zora",
            Chain::Abstract => "abstract",
            Chain::Apechain => "apechain",
            Chain::Soneium => "soneium",
            Chain::Ronin => "ronin",
            Chain::Worldchain => "worldchain",
            Chain::Gnosis => "gnosis",
            Chain::Hyperevm => "hyperevm",
            Chain::Monad => "monad",
            Chain::Solana => "solana",
            Chain::Cardano => "cardano",
        }
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            Chain::Monad => ChainFamily::Monad,
            Chain::Solana => ChainFamily::Solana,
            Chain::Cardano => ChainFamily::Cardano,
            _ => ChainFamily::Evm,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let chain = match normalized.as_str() {
            "eth" | "mainnet" => Chain::Ethereum,
            "matic" => Chain::Polygon,
            "avax" => Chain::Avalanche,
            "op" => Chain::Optimism,
            "arb" => Chain::Arbitrum,
            "ape" => Chain::Apechain,
            "world" => Chain::Worldchain,
            "xdai" => Chain::Gnosis,
            "hyperliquid" => Chain::Hyperevm,
            "sol" => Chain::Solana,
            "ada" => Chain::Cardano,
            other => Chain::ALL
                .iter()
                .copied()
                .find(|chain| chain.as_str() == other)
                .ok_or_else(|| format!("Unsupported chain: {}", value))?,
        };
        Ok(chain)
    }
}

/// Static per-chain facts: native currency display data and provider ids.
#[derive(Debug, Clone)]
pub struct ChainSpec {
    pub chain: Chain,
    pub native_symbol: &'static str,
    pub native_name: &'static str,
    pub native_logo: &'static str,
    pub native_decimals: u32,
    pub alchemy_network: Option<&'static str>,
    pub dexscreener_id: Option<&'static str>,
    pub coingecko_platform: Option<&'static str>,
}

macro_rules! logo {
    ($folder:literal) => {
        concat!(
            "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/",
            $folder,
            "/info/logo.png"
        )
    };
}

pub const CHAIN_TABLE: &[ChainSpec] = &[
    ChainSpec {
        chain: Chain::Ethereum,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("eth-mainnet"),
        dexscreener_id: Some("ethereum"),
        coingecko_platform: Some("ethereum"),
    },
    ChainSpec {
        chain: Chain::Base,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("base-mainnet"),
        dexscreener_id: Some("base"),
        coingecko_platform: Some("base"),
    },
    ChainSpec {
        chain: Chain::Polygon,
        native_symbol: "POL",
        native_name: "Polygon",
        native_logo: logo!("polygon"),
        native_decimals: 18,
        alchemy_network: Some("polygon-mainnet"),
        dexscreener_id: Some("polygon"),
        coingecko_platform: Some("polygon-pos"),
    },
    ChainSpec {
        chain: Chain::Avalanche,
        native_symbol: "AVAX",
        native_name: "Avalanche",
        native_logo: logo!("avalanchec"),
        native_decimals: 18,
        alchemy_network: Some("avax-mainnet"),
        dexscreener_id: Some("avalanche"),
        coingecko_platform: Some("avalanche"),
    },
    ChainSpec {
        chain: Chain::Optimism,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("opt-mainnet"),
        dexscreener_id: Some("optimism"),
        coingecko_platform: Some("optimistic-ethereum"),
    },
    ChainSpec {
        chain: Chain::Arbitrum,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("arb-mainnet"),
        dexscreener_id: Some("arbitrum"),
        coingecko_platform: Some("arbitrum-one"),
    },
    ChainSpec {
        chain: Chain::Blast,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("blast-mainnet"),
        dexscreener_id: Some("blast"),
        coingecko_platform: Some("blast"),
    },
    ChainSpec {
        chain: Chain::Zora,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("zora-mainnet"),
        dexscreener_id: Some("zora"),
        coingecko_platform: Some("zora-network"),
    },
    ChainSpec {
        chain: Chain::Abstract,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("abstract-mainnet"),
        dexscreener_id: Some("abstract"),
        coingecko_platform: Some("abstract"),
    },
    ChainSpec {
        chain: Chain::Apechain,
        native_symbol: "APE",
        native_name: "ApeCoin",
        native_logo: logo!("apechain"),
        native_decimals: 18,
        alchemy_network: Some("apechain-mainnet"),
        dexscreener_id: Some("apechain"),
        coingecko_platform: Some("apechain"),
    },
    ChainSpec {
        chain: Chain::Soneium,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("soneium-mainnet"),
        dexscreener_id: Some("soneium"),
        coingecko_platform: Some("soneium"),
    },
    ChainSpec {
        chain: Chain::Ronin,
        native_symbol: "RON",
        native_name: "Ronin",
        native_logo: logo!("ronin"),
        native_decimals: 18,
        alchemy_network: Some("ronin-mainnet"),
        dexscreener_id: Some("ronin"),
        coingecko_platform: Some("ronin"),
    },
    ChainSpec {
        chain: Chain::Worldchain,
        native_symbol: "ETH",
        native_name: "Ethereum",
        native_logo: logo!("ethereum"),
        native_decimals: 18,
        alchemy_network: Some("worldchain-mainnet"),
        dexscreener_id: Some("worldchain"),
        coingecko_platform: Some("world-chain"),
    },
    ChainSpec {
        chain: Chain::Gnosis,
        native_symbol: "XDAI",
        native_name: "xDAI",
        native_logo: logo!("xdai"),
        native_decimals: 18,
        alchemy_network: Some("gnosis-mainnet"),
        dexscreener_id: Some("gnosischain"),
        coingecko_platform: Some("xdai"),
    },
    ChainSpec {
        chain: Chain::Hyperevm,
        native_symbol: "HYPE",
        native_name: "Hyperliquid",
        native_logo: logo!("hyperliquid"),
        native_decimals: 18,
        alchemy_network: Some("hyperliquid-mainnet"),
        dexscreener_id: Some("hyperevm"),
        coingecko_platform: Some("hyperevm"),
    },
    ChainSpec {
        chain: Chain::Monad,
        native_symbol: "MON",
        native_name: "Monad",
        native_logo: logo!("monad"),
        native_decimals: 18,
        alchemy_network: Some("monad-mainnet"),
        dexscreener_id: Some("monad"),
        coingecko_platform: Some("monad"),
    },
    ChainSpec {
        chain: Chain::Solana,
        native_symbol: "SOL",
        native_name: "Solana",
        native_logo: logo!("solana"),
        native_decimals: 9,
        alchemy_network: None,
        dexscreener_id: Some("solana"),
        coingecko_platform: Some("solana"),
    },
    ChainSpec {
        chain: Chain::Cardano,
        native_symbol: "ADA",
        native_name: "Cardano",
        native_logo: logo!("cardano"),
        native_decimals: 6,
        alchemy_network: None,
        dexscreener_id: None,
        coingecko_platform: None,
    },
];

/// Looks up a chain's row; chains without one fall back to the Ethereum row.
pub fn chain_spec(chain: Chain) -> &'static ChainSpec {
    CHAIN_TABLE
        .iter()
        .find(|spec| spec.chain == chain)
        .unwrap_or(&CHAIN_TABLE[0])
}

/// Startup check over the static table. Returns every problem found.
pub fn validate_chain_table() -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for spec in CHAIN_TABLE {
        if !seen.insert(spec.chain) {
            problems.push(format!("duplicate chain row: {}", spec.chain));
        }
        if spec.native_symbol.trim().is_empty() {
            problems.push(format!("{} has an empty native symbol", spec.chain));
        }
        if spec.native_decimals == 0 {
            problems.push(format!("{} has zero native decimals", spec.chain));
        }
        if !spec.native_logo.starts_with("https://") {
            problems.push(format!("{} has a non-https native logo", spec.chain));
        }
        if spec.chain.family() != ChainFamily::Solana
            && spec.chain.family() != ChainFamily::Cardano
            && spec.alchemy_network.is_none()
        {
            problems.push(format!("{} is EVM but has no indexer network", spec.chain));
        }
    }

    for chain in Chain::ALL {
        if !seen.contains(&chain) {
            problems.push(format!("missing chain row: {}", chain));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_table_is_complete_and_valid() {
        // Memastikan setiap chain punya satu baris konfigurasi yang valid
        assert_eq!(validate_chain_table(), Ok(()));
    }

    #[test]
    fn parse_chain_accepts_aliases_and_case() {
        assert_eq!("Base".parse::<Chain>(), Ok(Chain::Base));
        assert_eq!("avax".parse::<Chain>(), Ok(Chain::Avalanche));
        assert_eq!("sol".parse::<Chain>(), Ok(Chain::Solana));
        assert!("dogechain".parse::<Chain>().is_err());
    }

    #[test]
    fn chain_family_routes_special_chains() {
        assert_eq!(Chain::Monad.family(), ChainFamily::Monad);
        assert_eq!(Chain::Cardano.family(), ChainFamily::Cardano);
        assert_eq!(Chain::Zora.family(), ChainFamily::Evm);
        assert_eq!(chain_spec(Chain::Polygon).native_symbol, "POL");
    }
}
