//! Market data provider trait and the Yahoo Finance implementation

use super::{Bar, Quote, Series};
use crate::error::{BotError, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument, warn};

const DEFAULT_CURRENCY: &str = "USD";
const TAIWAN_SUFFIX: &str = ".TW";

/// Quote and history lookups used by the command handlers
///
/// Implementations normalize the symbol they are given and report every
/// failure as [`BotError::ExternalApi`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest quote for `symbol`
    async fn get_quote(&self, symbol: &str) -> Result<Quote>;

    /// OHLCV bars of width `interval` covering `period` (e.g. `"1d"`, `"6mo"`)
    async fn get_history(&self, symbol: &str, interval: &str, period: &str) -> Result<Series>;

    /// Whether this provider serves `symbol`
    fn can_handle(&self, _symbol: &str) -> bool {
        true
    }
}

/// Raw quote fields as reported by a data source; any may be missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteInfo {
    pub regular_market_price: Option<f64>,
    /// Secondary price used when the regular market price is missing
    pub current_price: Option<f64>,
    pub currency: Option<String>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub previous_close: Option<f64>,
}

/// Unprocessed access to a market data backend
///
/// Symbols passed in are already normalized.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Quote metadata for `symbol`
    async fn quote_info(&self, symbol: &str) -> Result<QuoteInfo>;

    /// Cheapest available last trade price
    async fn fast_price(&self, symbol: &str) -> Result<Option<f64>>;

    /// Bars for `symbol`, in whatever order and quality the backend returns
    async fn history(&self, symbol: &str, interval: &str, period: &str) -> Result<Vec<Bar>>;
}

/// Normalize user input into a Yahoo Finance symbol
///
/// Trims and upper-cases the input; purely numeric codes are Taiwan listings
/// and get the `.TW` suffix.
///
/// ```
/// use nexus_bot::market::normalize_symbol;
///
/// assert_eq!(normalize_symbol(" 2330 "), "2330.TW");
/// assert_eq!(normalize_symbol("aapl"), "AAPL");
/// assert_eq!(normalize_symbol("0050.tw"), "0050.TW");
/// ```
pub fn normalize_symbol(symbol: &str) -> String {
    let mut normalized = symbol.trim().to_uppercase();
    if !normalized.is_empty() && normalized.bytes().all(|b| b.is_ascii_digit()) {
        normalized.push_str(TAIWAN_SUFFIX);
    }
    normalized
}

/// [`MarketDataProvider`] backed by Yahoo Finance
pub struct YahooFinanceProvider<S = super::YahooFinanceClient> {
    source: S,
}

impl<S: MarketDataSource> YahooFinanceProvider<S> {
    /// Create a provider over `source`
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

/// Source failures never leak raw; anything that is not already an
/// `ExternalApi` error gets wrapped in one.
fn wrap_source_error(err: BotError, message: impl FnOnce() -> String) -> BotError {
    if err.is_external() {
        err
    } else {
        BotError::external_with(message(), err)
    }
}

#[async_trait]
impl<S: MarketDataSource> MarketDataProvider for YahooFinanceProvider<S> {
    #[instrument(skip(self))]
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol);

        let info = self
            .source
            .quote_info(&symbol)
            .await
            .map_err(|e| wrap_source_error(e, || format!("Failed to fetch quote for {symbol}")))?;

        let finite = |price: Option<f64>| price.filter(|p| p.is_finite());
        let price = match finite(info.regular_market_price).or(finite(info.current_price)) {
            Some(price) => Some(price),
            None => {
                debug!("No price in quote info, trying fast price");
                let fast = self.source.fast_price(&symbol).await.map_err(|e| {
                    wrap_source_error(e, || format!("Failed to fetch quote for {symbol}"))
                })?;
                finite(fast)
            }
        };

        let Some(current_price) = price else {
            warn!("No quote data found");
            return Err(BotError::external(format!(
                "No quote data found for {symbol}"
            )));
        };

        let previous_close = info.previous_close.filter(|p| p.is_finite() && *p != 0.0);
        let change = info
            .change
            .or_else(|| previous_close.map(|prev| current_price - prev));
        let change_percent = info.change_percent.or_else(|| {
            previous_close.map(|prev| (current_price - prev) / prev * 100.0)
        });

        Ok(Quote {
            symbol,
            current_price,
            currency: info
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            change,
            change_percent,
            timestamp: Utc::now(),
        })
    }

    #[instrument(skip(self))]
    async fn get_history(&self, symbol: &str, interval: &str, period: &str) -> Result<Series> {
        let symbol = normalize_symbol(symbol);

        let raw = self
            .source
            .history(&symbol, interval, period)
            .await
            .map_err(|e| {
                wrap_source_error(e, || format!("Failed to fetch history for {symbol}"))
            })?;

        let received = raw.len();
        let mut bars: Vec<Bar> = Vec::with_capacity(received);
        for bar in raw {
            if !bar.close.is_finite() {
                continue;
            }
            if bars.last().is_some_and(|prev| bar.timestamp <= prev.timestamp) {
                continue;
            }
            bars.push(bar);
        }

        if bars.len() < received {
            debug!(dropped = received - bars.len(), "Dropped out-of-order or invalid bars");
        }

        if bars.is_empty() {
            return Err(BotError::external(format!(
                "No {interval} history found for {symbol} over {period}"
            )));
        }

        Ok(Series::new(symbol, interval, bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use std::sync::Mutex;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: at(day),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    /// Source that records the symbols it was asked for
    #[derive(Default)]
    struct FakeSource {
        info: QuoteInfo,
        fast: Option<f64>,
        bars: Vec<Bar>,
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn record(&self, symbol: &str) -> Result<()> {
            self.seen.lock().unwrap().push(symbol.to_string());
            if self.fail {
                Err(BotError::Other("socket closed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn quote_info(&self, symbol: &str) -> Result<QuoteInfo> {
            self.record(symbol)?;
            Ok(self.info.clone())
        }

        async fn fast_price(&self, symbol: &str) -> Result<Option<f64>> {
            self.record(symbol)?;
            Ok(self.fast)
        }

        async fn history(&self, symbol: &str, _interval: &str, _period: &str) -> Result<Vec<Bar>> {
            self.record(symbol)?;
            Ok(self.bars.clone())
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("2330"), "2330.TW");
        assert_eq!(normalize_symbol("aapl"), "AAPL");
        assert_eq!(normalize_symbol("  tsla\n"), "TSLA");
        assert_eq!(normalize_symbol("2330.tw"), "2330.TW");
        assert_eq!(normalize_symbol(""), "");
    }

    #[tokio::test]
    async fn test_provider_normalizes_before_fetching() {
        let provider = YahooFinanceProvider::new(FakeSource {
            info: QuoteInfo {
                regular_market_price: Some(600.0),
                ..Default::default()
            },
            bars: vec![bar(1, 1.0)],
            ..Default::default()
        });

        let quote = provider.get_quote("2330").await.unwrap();
        assert_eq!(quote.symbol, "2330.TW");

        let series = provider.get_history("aapl", "1d", "1mo").await.unwrap();
        assert_eq!(series.symbol, "AAPL");

        let seen = provider.source.seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["2330.TW".to_string(), "AAPL".to_string()]);
    }

    #[tokio::test]
    async fn test_quote_derives_change_and_defaults_currency() {
        let provider = YahooFinanceProvider::new(FakeSource {
            info: QuoteInfo {
                regular_market_price: Some(110.0),
                previous_close: Some(100.0),
                ..Default::default()
            },
            ..Default::default()
        });

        let quote = provider.get_quote("AAPL").await.unwrap();
        assert_eq!(quote.currency, "USD");
        assert!((quote.change.unwrap() - 10.0).abs() < 1e-9);
        assert!((quote.change_percent.unwrap() - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_quote_price_fallbacks() {
        let provider = YahooFinanceProvider::new(FakeSource {
            info: QuoteInfo {
                current_price: Some(42.0),
                currency: Some("TWD".to_string()),
                ..Default::default()
            },
            fast: Some(1.0),
            ..Default::default()
        });
        let quote = provider.get_quote("2330").await.unwrap();
        assert_eq!(quote.current_price, 42.0);
        assert_eq!(quote.currency, "TWD");
        assert_eq!(quote.change, None);

        let provider = YahooFinanceProvider::new(FakeSource {
            fast: Some(7.5),
            ..Default::default()
        });
        assert_eq!(provider.get_quote("X").await.unwrap().current_price, 7.5);
    }

    #[tokio::test]
    async fn test_non_finite_price_falls_through() {
        let provider = YahooFinanceProvider::new(FakeSource {
            info: QuoteInfo {
                regular_market_price: Some(f64::NAN),
                current_price: Some(42.0),
                ..Default::default()
            },
            fast: Some(1.0),
            ..Default::default()
        });
        assert_eq!(provider.get_quote("AAPL").await.unwrap().current_price, 42.0);

        let provider = YahooFinanceProvider::new(FakeSource {
            info: QuoteInfo {
                regular_market_price: Some(f64::INFINITY),
                current_price: Some(f64::NAN),
                ..Default::default()
            },
            fast: Some(7.5),
            ..Default::default()
        });
        assert_eq!(provider.get_quote("AAPL").await.unwrap().current_price, 7.5);

        let provider = YahooFinanceProvider::new(FakeSource {
            info: QuoteInfo {
                regular_market_price: Some(f64::NAN),
                ..Default::default()
            },
            fast: Some(f64::NAN),
            ..Default::default()
        });
        assert!(provider.get_quote("AAPL").await.unwrap_err().is_external());
    }

    #[tokio::test]
    async fn test_quote_without_any_price() {
        let provider = YahooFinanceProvider::new(FakeSource::default());

        let err = provider.get_quote("zzzz").await.unwrap_err();
        assert!(err.is_external());
        assert_eq!(err.to_string(), "No quote data found for ZZZZ");
    }

    #[tokio::test]
    async fn test_source_errors_are_wrapped() {
        let provider = YahooFinanceProvider::new(FakeSource {
            fail: true,
            ..Default::default()
        });

        let err = provider.get_quote("AAPL").await.unwrap_err();
        assert!(err.is_external());
        assert_eq!(err.to_string(), "Failed to fetch quote for AAPL");
        assert!(std::error::Error::source(&err).is_some());

        let err = provider.get_history("AAPL", "1d", "1mo").await.unwrap_err();
        assert!(err.is_external());
    }

    #[tokio::test]
    async fn test_history_drops_bad_bars() {
        let provider = YahooFinanceProvider::new(FakeSource {
            bars: vec![
                bar(1, 10.0),
                bar(2, f64::NAN),
                bar(3, 12.0),
                bar(3, 13.0),
                bar(2, 11.0),
                bar(4, 14.0),
            ],
            ..Default::default()
        });

        let series = provider.get_history("AAPL", "1d", "1mo").await.unwrap();
        assert_eq!(series.interval, "1d");
        assert_eq!(series.closes(), vec![10.0, 12.0, 14.0]);
    }

    #[tokio::test]
    async fn test_empty_history_is_error() {
        let provider = YahooFinanceProvider::new(FakeSource::default());

        let err = provider.get_history("AAPL", "1wk", "1y").await.unwrap_err();
        assert!(err.is_external());
        assert!(err.to_string().contains("AAPL"));
    }

    #[test]
    fn test_can_handle_everything() {
        let provider = YahooFinanceProvider::new(FakeSource::default());
        assert!(provider.can_handle("2330.TW"));
        assert!(provider.can_handle("BTC-USD"));
    }
}
