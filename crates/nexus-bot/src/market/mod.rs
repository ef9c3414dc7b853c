//! Market data: quotes and OHLCV history
//!
//! [`MarketDataProvider`] is what handlers depend on. [`YahooFinanceProvider`]
//! implements it on top of a raw [`MarketDataSource`], adding symbol
//! normalization, price fallbacks and error wrapping.

mod provider;
mod yahoo;

pub use provider::{
    MarketDataProvider, MarketDataSource, QuoteInfo, YahooFinanceProvider, normalize_symbol,
};
pub use yahoo::YahooFinanceClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time price snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Normalized symbol, e.g. `2330.TW`
    pub symbol: String,
    pub current_price: f64,
    pub currency: String,
    /// Absolute change against the previous close
    pub change: Option<f64>,
    /// Percentage change against the previous close
    pub change_percent: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// One OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bars for one symbol and interval, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub symbol: String,
    /// Bar width: `1d`, `1wk` or `1mo`
    pub interval: String,
    pub bars: Vec<Bar>,
}

impl Series {
    /// Create a series
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            bars,
        }
    }

    /// Closing price of the newest bar
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }

    /// The newest `n` bars (fewer when the series is shorter)
    pub fn tail(&self, n: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }

    /// Closing prices, oldest first
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_series_helpers() {
        let series = Series::new("AAPL", "1d", vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]);

        assert_eq!(series.last_close(), Some(12.0));
        assert_eq!(series.tail(2).len(), 2);
        assert_eq!(series.tail(2)[0].close, 11.0);
        assert_eq!(series.tail(10).len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_empty_series() {
        let series = Series::new("AAPL", "1d", Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
        assert!(series.tail(5).is_empty());
    }
}
