use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::chain::{chain_spec, Chain};
use crate::constants::NATIVE_ASSET_ID;

/// Canonical record returned to the client: one fungible holding or one NFT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: String,
    pub chain: Chain,
    pub name: String,
    pub image: String,
    #[serde(flatten)]
    pub details: AssetDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetDetails {
    Fungible(FungibleDetails),
    NonFungible(NftDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FungibleDetails {
    pub symbol: String,
    pub balance: String,
    pub usd_price: f64,
    pub native_price: String,
    pub total_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NftDetails {
    pub collection: String,
    pub metadata: NftMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NftMetadata {
    pub traits: Vec<Trait>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trait {
    pub trait_type: String,
    pub value: serde_json::Value,
}

impl Trait {
    /// Reads provider attribute lists: `[{trait_type, value}]` arrays (also
    /// `type`/`key`/`name` spellings) or flat `{name: value}` objects.
    pub fn list_from_json(raw: &serde_json::Value) -> Vec<Trait> {
        match raw {
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| {
                    let label = ["trait_type", "type", "key", "name"]
                        .iter()
                        .find_map(|field| item.get(*field).and_then(|v| v.as_str()))?;
                    Some(Trait {
                        trait_type: label.to_string(),
                        value: item.get("value").cloned().unwrap_or(serde_json::Value::Null),
                    })
                })
                .collect(),
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(label, value)| Trait {
                    trait_type: label.clone(),
                    value: value.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Asset {
    pub fn fungible(&self) -> Option<&FungibleDetails> {
        match &self.details {
            AssetDetails::Fungible(details) => Some(details),
            AssetDetails::NonFungible(_) => None,
        }
    }

    pub fn is_fungible(&self) -> bool {
        self.fungible().is_some()
    }
}

/// Adapter output before pricing. The normalizer turns these into `Asset`s.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDraft {
    pub id: String,
    pub chain: Chain,
    pub name: String,
    pub image: String,
    pub body: DraftBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftBody {
    Fungible(TokenDraft),
    NonFungible(NftDetails),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenDraft {
    pub symbol: String,
    /// Balance in human units (raw / 10^decimals).
    pub amount: f64,
    pub price: PriceHint,
}

/// Where the normalizer should get the unit USD price from.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceHint {
    /// The chain's native currency.
    Native,
    /// Contract or mint address on the asset's chain.
    Contract(String),
    /// Provider already embedded a unit price.
    Quoted(f64),
    /// Only the ticker is known (quote-id table, then stablecoin heuristic).
    Ticker,
    Unpriced,
}

impl AssetDraft {
    pub fn native(chain: Chain, amount: f64) -> Self {
        let spec = chain_spec(chain);
        Self {
            id: NATIVE_ASSET_ID.to_string(),
            chain,
            name: spec.native_name.to_string(),
            image: spec.native_logo.to_string(),
            body: DraftBody::Fungible(TokenDraft {
                symbol: spec.native_symbol.to_string(),
                amount,
                price: PriceHint::Native,
            }),
        }
    }

    pub fn token(
        chain: Chain,
        id: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        image: impl Into<String>,
        amount: f64,
        price: PriceHint,
    ) -> Self {
        Self {
            id: id.into(),
            chain,
            name: name.into(),
            image: image.into(),
            body: DraftBody::Fungible(TokenDraft {
                symbol: symbol.into(),
                amount,
                price,
            }),
        }
    }

    pub fn nft(
        chain: Chain,
        id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
        details: NftDetails,
    ) -> Self {
        Self {
            id: id.into(),
            chain,
            name: name.into(),
            image: image.into(),
            body: DraftBody::NonFungible(details),
        }
    }

    pub fn is_fungible(&self) -> bool {
        matches!(self.body, DraftBody::Fungible(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Nfts,
    Tokens,
}

impl AssetKind {
    pub fn wants_tokens(&self) -> bool {
        matches!(self, AssetKind::Tokens)
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nfts" | "nft" => Ok(AssetKind::Nfts),
            "tokens" | "token" => Ok(AssetKind::Tokens),
            other => Err(format!("Unsupported asset kind: {}", other)),
        }
    }
}

/// `{ "nfts": [...] }`; the field holds whichever kind was requested.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssetListResponse {
    pub nfts: Vec<Asset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fungible_asset_serializes_flat_with_kind_tag() {
        let asset = Asset {
            id: "native".to_string(),
            chain: Chain::Base,
            name: "Ethereum".to_string(),
            image: String::new(),
            details: AssetDetails::Fungible(FungibleDetails {
                symbol: "ETH".to_string(),
                balance: "2.5000".to_string(),
                usd_price: 3000.0,
                native_price: "1.0000".to_string(),
                total_value: "7500.00".to_string(),
            }),
        };

        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["kind"], "fungible");
        assert_eq!(json["chain"], "base");
        assert_eq!(json["usdPrice"], 3000.0);
        assert_eq!(json["totalValue"], "7500.00");
        assert_eq!(json["nativePrice"], "1.0000");
    }

    #[test]
    fn nft_asset_serializes_traits_under_metadata() {
        let asset = Asset {
            id: "0xabc:1".to_string(),
            chain: Chain::Ethereum,
            name: "Punk".to_string(),
            image: String::new(),
            details: AssetDetails::NonFungible(NftDetails {
                collection: "Punks".to_string(),
                metadata: NftMetadata {
                    traits: vec![Trait {
                        trait_type: "Hat".to_string(),
                        value: serde_json::json!("Cap"),
                    }],
                    description: "A punk".to_string(),
                },
            }),
        };

        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["kind"], "non_fungible");
        assert_eq!(json["metadata"]["traits"][0]["trait_type"], "Hat");
        assert_eq!(json["collection"], "Punks");
    }

    #[test]
    fn traits_accept_arrays_and_objects() {
        let listed = Trait::list_from_json(&serde_json::json!([
            { "trait_type": "Background", "value": "Blue" },
            { "type": "Level", "value": 3 },
            { "value": "orphan" }
        ]));
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].trait_type, "Level");
        assert_eq!(listed[1].value, serde_json::json!(3));

        let flat = Trait::list_from_json(&serde_json::json!({ "Eyes": "Laser" }));
        assert_eq!(flat[0].trait_type, "Eyes");
        assert!(Trait::list_from_json(&serde_json::json!("none")).is_empty());
    }

    #[test]
    fn asset_kind_parses_route_segment() {
        assert_eq!("nfts".parse::<AssetKind>(), Ok(AssetKind::Nfts));
        assert_eq!("Tokens".parse::<AssetKind>(), Ok(AssetKind::Tokens));
        assert!("coins".parse::<AssetKind>().is_err());
    }
}
