//! Yahoo Finance API client

use super::Bar;
use super::provider::{MarketDataSource, QuoteInfo};
use crate::error::{BotError, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const CHART_API_BASE: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Yahoo Finance API client
///
/// Quote metadata comes from the chart endpoint; OHLCV ranges and the fast
/// latest price go through `yahoo_finance_api`.
pub struct YahooFinanceClient {
    http: Client,
    connector: yahoo::YahooConnector,
    timeout: Duration,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| BotError::external(format!("Yahoo Finance error: {e}")))?;

        Ok(Self {
            http,
            connector,
            timeout,
        })
    }

    /// Run a connector call under the client timeout
    async fn timed<T, E, F>(&self, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(BotError::external(format!("Yahoo Finance {what} failed: {e}"))),
            Err(_) => Err(BotError::external(format!(
                "Yahoo Finance {what} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    #[instrument(skip(self))]
    async fn quote_info(&self, symbol: &str) -> Result<QuoteInfo> {
        let url = format!("{CHART_API_BASE}/v8/finance/chart/{symbol}");
        let response = self
            .http
            .get(url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "Chart response received");

        let envelope: ChartEnvelope = serde_json::from_str(&body).map_err(|e| {
            BotError::external_with(format!("Unexpected chart response for {symbol} (HTTP {status})"), e)
        })?;

        envelope.into_quote_info(symbol)
    }

    #[instrument(skip(self))]
    async fn fast_price(&self, symbol: &str) -> Result<Option<f64>> {
        let response = self
            .timed("latest quote", self.connector.get_latest_quotes(symbol, "1d"))
            .await?;

        Ok(response.last_quote().ok().map(|quote| quote.close))
    }

    #[instrument(skip(self))]
    async fn history(&self, symbol: &str, interval: &str, period: &str) -> Result<Vec<Bar>> {
        let response = self
            .timed("history", self.connector.get_quote_range(symbol, interval, period))
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| BotError::external(format!("No history for {symbol}: {e}")))?;

        Ok(quotes
            .iter()
            .filter_map(|q| {
                Some(Bar {
                    timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)?,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect())
    }
}

// Chart endpoint response, trimmed to the fields we read

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartEnvelope {
    fn into_quote_info(self, symbol: &str) -> Result<QuoteInfo> {
        if let Some(error) = self.chart.error {
            return Err(BotError::external(format!(
                "Yahoo Finance rejected {symbol}: {} ({})",
                error.description, error.code
            )));
        }

        let result = self
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| BotError::external(format!("No quote data found for {symbol}")))?;

        let last_close = result
            .indicators
            .and_then(|indicators| indicators.quote.into_iter().next())
            .and_then(|quote| quote.close.into_iter().rev().flatten().next());

        Ok(QuoteInfo {
            regular_market_price: result.meta.regular_market_price,
            current_price: last_close,
            currency: result.meta.currency,
            change: None,
            change_percent: None,
            previous_close: result.meta.previous_close.or(result.meta.chart_previous_close),
        })
    }
}
