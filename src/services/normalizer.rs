use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    models::{Asset, AssetDetails, AssetDraft, Chain, DraftBody, FungibleDetails, PriceHint, TokenDraft},
    services::price_resolver::PriceResolver,
    utils::{format_amount, format_usd_value, native_price_string, sanitize_price},
};

/// Turns adapter drafts into priced, display-ready `Asset`s.
pub struct Normalizer {
    prices: Arc<PriceResolver>,
    dust_threshold: f64,
}

impl Normalizer {
    pub fn new(prices: Arc<PriceResolver>, dust_threshold: f64) -> Self {
        Self {
            prices,
            dust_threshold,
        }
    }

    pub fn prices(&self) -> &Arc<PriceResolver> {
        &self.prices
    }

    /// Dedups, drops dust, prices every fungible entry concurrently. Input order is kept.
    pub async fn normalize(&self, drafts: Vec<AssetDraft>) -> Vec<Asset> {
        let drafts = retain_listable(drafts, self.dust_threshold);

        let chains: HashSet<Chain> = drafts
            .iter()
            .filter(|draft| draft.is_fungible())
            .map(|draft| draft.chain)
            .collect();
        let native_quotes = join_all(chains.into_iter().map(|chain| async move {
            (chain, self.prices.native_price(chain).await)
        }))
        .await;
        let native_quotes: HashMap<Chain, f64> = native_quotes.into_iter().collect();

        join_all(drafts.into_iter().map(|draft| {
            let native_usd = native_quotes.get(&draft.chain).copied().unwrap_or(0.0);
            async move { self.finish(draft, native_usd).await }
        }))
        .await
    }

    // Internal helper that supports `finish` operations.
    async fn finish(&self, draft: AssetDraft, native_usd: f64) -> Asset {
        let details = match draft.body {
            DraftBody::NonFungible(nft) => AssetDetails::NonFungible(nft),
            DraftBody::Fungible(token) => {
                let usd_price = match &token.price {
                    PriceHint::Native => native_usd,
                    _ => self.unit_price(draft.chain, &token).await,
                };
                AssetDetails::Fungible(fungible_details(&token, usd_price, native_usd))
            }
        };

        Asset {
            id: draft.id,
            chain: draft.chain,
            name: draft.name,
            image: draft.image,
            details,
        }
    }

    async fn unit_price(&self, chain: Chain, token: &TokenDraft) -> f64 {
        let price = match &token.price {
            PriceHint::Native => self.prices.native_price(chain).await,
            PriceHint::Contract(address) => {
                self.prices
                    .token_price(chain, address, Some(token.symbol.as_str()))
                    .await
            }
            PriceHint::Quoted(price) => *price,
            PriceHint::Ticker => self.prices.ticker_price(&token.symbol).await,
            PriceHint::Unpriced => 0.0,
        };
        sanitize_price(price)
    }
}

/// Display fields for one priced holding. `totalValue` is computed from the
/// displayed balance so the two strings always agree.
pub fn fungible_details(token: &TokenDraft, usd_price: f64, native_usd: f64) -> FungibleDetails {
    let usd_price = sanitize_price(usd_price);
    let balance = format_amount(token.amount);
    let shown = balance.parse::<f64>().unwrap_or(0.0);
    FungibleDetails {
        symbol: token.symbol.clone(),
        total_value: format_usd_value(shown * usd_price),
        native_price: native_price_string(usd_price, native_usd),
        usd_price,
        balance,
    }
}

/// First occurrence wins per `(chain, id)`; fungible entries whose displayed
/// balance is at or below the dust threshold are dropped.
pub fn retain_listable(drafts: Vec<AssetDraft>, dust_threshold: f64) -> Vec<AssetDraft> {
    let mut seen: HashSet<(Chain, String)> = HashSet::new();
    drafts
        .into_iter()
        .filter(|draft| match &draft.body {
            DraftBody::Fungible(token) => {
                let shown = format_amount(token.amount).parse::<f64>().unwrap_or(0.0);
                token.amount.is_finite() && shown > 0.0 && shown > dust_threshold
            }
            DraftBody::NonFungible(_) => true,
        })
        .filter(|draft| seen.insert((draft.chain, draft.id.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::integrations::{CoinGeckoClient, DexScreenerClient};
    use crate::models::NftDetails;
    use crate::services::price_cache::MemoryPriceCache;
    use reqwest::Client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn normalizer_for(server: &MockServer) -> Normalizer {
        let config = Config {
            coingecko_api_url: server.uri(),
            dexscreener_api_url: server.uri(),
            ..Config::default()
        };
        let client = Client::new();
        let resolver = PriceResolver::new(
            Arc::new(MemoryPriceCache::new(Duration::from_secs(90))),
            CoinGeckoClient::new(client.clone(), &config),
            DexScreenerClient::new(client, &config),
        );
        Normalizer::new(Arc::new(resolver), config.dust_threshold)
    }

    #[test]
    fn dust_and_duplicates_are_removed() {
        let drafts = vec![
            AssetDraft::native(Chain::Base, 0.0000001),
            AssetDraft::token(Chain::Base, "0xa", "A", "A", "", 5.0, PriceHint::Unpriced),
            AssetDraft::token(Chain::Base, "0xa", "A dup", "A", "", 7.0, PriceHint::Unpriced),
            AssetDraft::token(Chain::Base, "0xb", "B", "B", "", 0.0, PriceHint::Unpriced),
            AssetDraft::nft(Chain::Base, "0xc:1", "C", "", NftDetails::default()),
        ];
        let kept = retain_listable(drafts, 0.000001);
        let ids: Vec<&str> = kept.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["0xa", "0xc:1"]);
        assert_eq!(kept[0].name, "A");
    }

    #[test]
    fn dust_check_uses_the_displayed_balance() {
        // 0.0000010000004 is displayed as "0.00000100", which is not above 1e-6
        let drafts = vec![
            AssetDraft::token(Chain::Base, "0xd", "D", "D", "", 1.0000004e-6, PriceHint::Unpriced),
            AssetDraft::token(Chain::Base, "0xe", "E", "E", "", 1.02e-6, PriceHint::Unpriced),
        ];
        let kept = retain_listable(drafts, 0.000001);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "0xe");

        let DraftBody::Fungible(token) = &kept[0].body else {
            panic!("expected a fungible draft");
        };
        let details = fungible_details(token, 0.0, 0.0);
        assert!(details.balance.parse::<f64>().unwrap() > 0.000001);
    }

    #[test]
    fn total_value_matches_displayed_balance() {
        // Memastikan totalValue konsisten dengan balance yang ditampilkan
        let token = TokenDraft {
            symbol: "USDC".to_string(),
            amount: 1.0,
            price: PriceHint::Quoted(1.0),
        };
        let details = fungible_details(&token, 1.0, 2000.0);
        assert_eq!(details.balance, "1.0000");
        assert_eq!(details.total_value, "1.00");
        assert_eq!(details.native_price, "0.0005");

        let unpriced = fungible_details(&token, f64::NAN, 0.0);
        assert_eq!(unpriced.usd_price, 0.0);
        assert_eq!(unpriced.native_price, "0.0000");
        assert_eq!(unpriced.total_value, "0.00");
    }

    #[tokio::test]
    async fn native_and_quoted_entries_are_priced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "solana": { "usd": 150.0 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let assets = normalizer_for(&server)
            .normalize(vec![
                AssetDraft::native(Chain::Solana, 2.0),
                AssetDraft::token(Chain::Solana, "MintA", "Jup", "JUP", "", 10.0, PriceHint::Quoted(0.75)),
            ])
            .await;

        assert_eq!(assets.len(), 2);
        let native = assets[0].fungible().unwrap();
        assert_eq!(native.usd_price, 150.0);
        assert_eq!(native.total_value, "300.00");
        assert_eq!(native.native_price, "1.0000");
        let jup = assets[1].fungible().unwrap();
        assert_eq!(jup.total_value, "7.50");
        assert_eq!(jup.native_price, "0.0050");
    }
}
