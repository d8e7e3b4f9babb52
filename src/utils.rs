// Shared parsing and display helpers used by adapters and the normalizer.

use ethers::types::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{SOLANA_SYSTEM_PROGRAM_ID, ZERO_NATIVE_PRICE};

/// Rewrites IPFS references to a gateway URL. Data URIs and http(s) URLs pass
/// through untouched; anything else unrecognised is returned as-is.
pub fn resolve_image_url(raw: &str, gateway: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }
    if value.starts_with("data:") || value.starts_with("http://") || value.starts_with("https://")
    {
        return value.to_string();
    }

    let gateway = gateway.trim_end_matches('/');
    if let Some(rest) = value.strip_prefix("ipfs://") {
        let rest = rest.trim_start_matches("ipfs/").trim_start_matches('/');
        return format!("{}/{}", gateway, rest);
    }
    if let Some(rest) = value.strip_prefix("/ipfs/") {
        return format!("{}/{}", gateway, rest);
    }
    if let Some(rest) = value.strip_prefix("ar://") {
        return format!("https://arweave.net/{}", rest);
    }
    if looks_like_cid(value) {
        return format!("{}/{}", gateway, value);
    }
    value.to_string()
}

// Internal helper that checks conditions for `looks_like_cid`.
fn looks_like_cid(value: &str) -> bool {
    let root = value.split('/').next().unwrap_or_default();
    if !root.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    (root.starts_with("Qm") && root.len() == 46) || (root.starts_with("baf") && root.len() >= 50)
}

/// Human-unit balance: 4 decimals normally, 8 for sub-0.0001 amounts.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return ZERO_NATIVE_PRICE.to_string();
    }
    if value < 0.0001 {
        format!("{:.8}", value)
    } else {
        format!("{:.4}", value)
    }
}

/// `round(value, 2)` rendered with exactly two decimals.
pub fn format_usd_value(value: f64) -> String {
    let rounded = Decimal::from_f64(if value.is_finite() { value } else { 0.0 })
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Unit price expressed in the chain's native currency.
pub fn native_price_string(usd_price: f64, native_usd: f64) -> String {
    if !native_usd.is_finite() || native_usd <= 0.0 || !usd_price.is_finite() || usd_price <= 0.0
    {
        return ZERO_NATIVE_PRICE.to_string();
    }
    format_amount(usd_price / native_usd)
}

/// Clamps a price to the `>= 0` invariant.
pub fn sanitize_price(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// Internal helper that supports `json_as_f64` operations.
pub fn json_as_f64(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_i64().map(|v| v as f64))
        .or_else(|| value.as_u64().map(|v| v as f64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

/// Reads an integer that providers send either as a JSON number or a string.
pub fn json_as_u32(value: &serde_json::Value) -> Option<u32> {
    value
        .as_u64()
        .map(|v| v as u32)
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u32>().ok()))
}

/// Parses `0x`-prefixed (or bare) hex into a U256. Empty `0x` is zero.
pub fn parse_hex_u256(value: &str) -> Option<U256> {
    let digits = value.trim().trim_start_matches("0x").trim_start_matches("0X");
    if digits.is_empty() {
        return Some(U256::zero());
    }
    U256::from_str_radix(digits, 16).ok()
}

/// Converts a raw integer amount to human units.
pub fn scale_units(raw: U256, decimals: u32) -> f64 {
    let raw = raw.to_string().parse::<f64>().unwrap_or(0.0);
    raw / 10_f64.powi(decimals as i32)
}

/// Same as `scale_units` for decimal-string amounts (Cardano quantities).
pub fn scale_decimal_str(raw: &str, decimals: u32) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0) / 10_f64.powi(decimals as i32)
}

/// Zero/null addresses never carry a price.
pub fn is_null_address(address: &str) -> bool {
    let trimmed = address.trim();
    if trimmed.is_empty() || trimmed == SOLANA_SYSTEM_PROGRAM_ID {
        return true;
    }
    match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(digits) => {
            digits.chars().all(|c| c == '0') || digits.chars().all(|c| c == 'e' || c == 'E')
        }
        None => false,
    }
}

/// Decodes hex into printable UTF-8, used for Cardano asset names.
pub fn decode_hex_utf8(value: &str) -> Option<String> {
    let bytes = hex::decode(value.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let text = text.trim_matches(char::from(0)).trim().to_string();
    if text.is_empty() || text.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(text)
}

/// Returns the first non-blank string among the candidates.
pub fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Splits a comma separated env value into trimmed, non-empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GATEWAY: &str = "https://ipfs.io/ipfs/";

    #[test]
    fn resolve_image_url_rewrites_ipfs_forms() {
        // Memastikan ipfs://, CID polos, dan URL biasa diperlakukan benar
        let cid = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
        assert_eq!(
            resolve_image_url(&format!("ipfs://{}", cid), GATEWAY),
            format!("https://ipfs.io/ipfs/{}", cid)
        );
        assert_eq!(
            resolve_image_url(cid, GATEWAY),
            format!("https://ipfs.io/ipfs/{}", cid)
        );
        assert_eq!(
            resolve_image_url("https://example.com/x.png", GATEWAY),
            "https://example.com/x.png"
        );
    }

    #[test]
    fn resolve_image_url_keeps_data_uris_and_empty() {
        let data = "data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=";
        assert_eq!(resolve_image_url(data, GATEWAY), data);
        assert_eq!(resolve_image_url("   ", GATEWAY), "");
        assert_eq!(
            resolve_image_url("ipfs://ipfs/QmHash/1.png", GATEWAY),
            "https://ipfs.io/ipfs/QmHash/1.png"
        );
    }

    #[test]
    fn format_helpers_match_wire_format() {
        assert_eq!(format_amount(2.5), "2.5000");
        assert_eq!(format_amount(0.000002), "0.00000200");
        assert_eq!(format_usd_value(1.0), "1.00");
        assert_eq!(format_usd_value(2.345), "2.35");
        assert_eq!(native_price_string(1.0, 0.0), "0.0000");
        assert_eq!(native_price_string(1500.0, 3000.0), "0.5000");
    }

    #[test]
    fn parse_hex_u256_handles_prefix_and_empty() {
        assert_eq!(parse_hex_u256("0x"), Some(U256::zero()));
        assert_eq!(parse_hex_u256("0x0f4240"), Some(U256::from(1_000_000u64)));
        assert_eq!(parse_hex_u256("zz"), None);
        assert!((scale_units(U256::from(1_000_000u64), 6) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn null_address_detection() {
        assert!(is_null_address("0x0000000000000000000000000000000000000000"));
        assert!(is_null_address("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"));
        assert!(is_null_address(""));
        assert!(!is_null_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
    }

    #[test]
    fn decode_hex_utf8_reads_asset_names() {
        assert_eq!(decode_hex_utf8("534e454b").as_deref(), Some("SNEK"));
        assert_eq!(decode_hex_utf8("00ff"), None);
        assert_eq!(decode_hex_utf8("not-hex"), None);
    }
}
