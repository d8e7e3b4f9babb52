use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::json_as_f64;

/// One OHLC bucket; `time` is the bucket open in unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Reads `[time, open, high, low, close, ...]` rows. Exchanges send the
    /// prices as numbers or strings; `time_multiplier` converts the time
    /// column to milliseconds (1000 for second-based feeds).
    pub fn from_row(row: &[Value], time_multiplier: i64) -> Option<Candle> {
        if row.len() < 5 {
            return None;
        }
        let time = row[0].as_i64().or_else(|| json_as_f64(&row[0]).map(|v| v as i64))?;
        Some(Candle {
            time: time.saturating_mul(time_multiplier),
            open: json_as_f64(&row[1])?,
            high: json_as_f64(&row[2])?,
            low: json_as_f64(&row[3])?,
            close: json_as_f64(&row[4])?,
        })
    }
}

/// Result of a symbol price search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_row_accepts_string_prices_and_scales_time() {
        let row = vec![json!(1_700_000_000), json!("1.5"), json!("2"), json!(1.0), json!("1.8")];
        let candle = Candle::from_row(&row, 1000).unwrap();
        assert_eq!(candle.time, 1_700_000_000_000);
        assert_eq!(candle.open, 1.5);
        assert_eq!(candle.close, 1.8);
    }

    #[test]
    fn from_row_rejects_short_rows() {
        assert!(Candle::from_row(&[json!(1), json!(2)], 1).is_none());
    }
}
