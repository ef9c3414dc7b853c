//! `/price <symbol>`

use super::{CommandHandler, data_retrieval_failed, with_thousands};
use crate::error::{BotError, Result};
use crate::market::{MarketDataProvider, Quote, Series};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::instrument;

const RECENT_SESSIONS: usize = 5;

/// Latest quote plus the last few daily sessions
pub struct QuoteHandler {
    provider: Arc<dyn MarketDataProvider>,
}

impl QuoteHandler {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CommandHandler for QuoteHandler {
    #[instrument(skip(self))]
    async fn execute(&self, args: &str) -> Result<String> {
        let symbol = args.trim();
        if symbol.is_empty() {
            return Err(BotError::service(
                "Please provide a stock symbol, e.g. /price 2330",
            ));
        }

        let (quote, history) = tokio::try_join!(
            self.provider.get_quote(symbol),
            self.provider.get_history(symbol, "1d", "1mo"),
        )
        .map_err(data_retrieval_failed)?;

        Ok(format_quote(&quote, &history))
    }

    fn name(&self) -> &'static str {
        "price"
    }
}

/// Render a quote card followed by the most recent sessions
pub fn format_quote(quote: &Quote, history: &Series) -> String {
    let change = quote.change.unwrap_or(0.0);
    let change_percent = quote.change_percent.unwrap_or(0.0);
    let marker = if change >= 0.0 { "📈" } else { "📉" };

    let mut out = format!(
        "【Quote】{}\nPrice: {:.2} {}\nChange: {change:+.2} ({change_percent:+.2}%) {marker}\n\n【Last {RECENT_SESSIONS} sessions】",
        quote.symbol, quote.current_price, quote.currency,
    );

    for bar in history.tail(RECENT_SESSIONS) {
        let _ = write!(
            out,
            "\n- {}: C:{:.2} V:{}",
            bar.timestamp.format("%m/%d"),
            bar.close,
            with_thousands(bar.volume)
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::FakeMarket;
    use std::time::Duration;

    #[tokio::test]
    async fn test_quote_output() {
        let market = Arc::new(FakeMarket::new(1085.0, Some(15.0), Some(1.4)));
        let reply = QuoteHandler::new(market.clone()).execute("2330").await.unwrap();

        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(lines[0], "【Quote】2330.TW");
        assert_eq!(lines[1], "Price: 1085.00 TWD");
        assert_eq!(lines[2], "Change: +15.00 (+1.40%) 📈");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "【Last 5 sessions】");
        assert_eq!(lines.len(), 10);
        // 120 bars from 2024-01-01; the last is 2024-04-29.
        assert_eq!(lines[9], "- 04/29: C:219.00 V:1,000,119");

        let mut calls = market.calls();
        calls.sort();
        assert_eq!(calls, vec!["history 2330 1d 1mo", "quote 2330"]);
    }

    #[tokio::test]
    async fn test_negative_change_marker() {
        let market = Arc::new(FakeMarket::new(98.5, Some(-1.5), Some(-1.5)));
        let reply = QuoteHandler::new(market).execute("AAPL").await.unwrap();
        assert!(reply.contains("Change: -1.50 (-1.50%) 📉"));
    }

    #[tokio::test]
    async fn test_missing_change_counts_as_flat() {
        let market = Arc::new(FakeMarket::new(10.0, None, None));
        let reply = QuoteHandler::new(market).execute("AAPL").await.unwrap();
        assert!(reply.contains("Change: +0.00 (+0.00%) 📈"));
    }

    #[tokio::test]
    async fn test_empty_symbol() {
        let market = Arc::new(FakeMarket::new(1.0, None, None));
        let err = QuoteHandler::new(market.clone()).execute("  ").await.unwrap_err();

        assert!(err.is_service());
        assert!(market.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_service_error() {
        let market = Arc::new(FakeMarket::failing("No quote data found for ZZZZ"));
        let err = QuoteHandler::new(market).execute("zzzz").await.unwrap_err();

        assert!(err.is_service());
        assert_eq!(err.to_string(), "Data retrieval failed: No quote data found for ZZZZ");
    }

    #[tokio::test]
    async fn test_whole_argument_is_the_symbol() {
        let market = Arc::new(FakeMarket::new(1.0, None, None));
        QuoteHandler::new(market.clone())
            .execute("  2330 junk ")
            .await
            .unwrap();

        let mut calls = market.calls();
        calls.sort();
        assert_eq!(calls, vec!["history 2330 junk 1d 1mo", "quote 2330 junk"]);
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let market = Arc::new(FakeMarket::new(1.0, None, None).with_barrier(2));
        let handler = QuoteHandler::new(market);

        let reply = tokio::time::timeout(Duration::from_secs(5), handler.execute("2330"))
            .await
            .expect("quote and history were fetched sequentially");
        assert!(reply.is_ok());
    }
}
