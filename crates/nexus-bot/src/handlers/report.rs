//! `/stock <symbol> [strategy]`
//!
//! Builds an AI technical analysis report:
//!
//! 1. quote, daily, weekly and monthly history are fetched concurrently
//! 2. indicators are computed on the daily series
//! 3. the `stock` prompt is rendered with price data, indicators and recent
//!    bars from each timeframe
//! 4. the AI response is returned as-is

use super::{CommandHandler, data_retrieval_failed};
use crate::ai::AiClient;
use crate::error::{BotError, Result};
use crate::indicators::{IndicatorEngine, IndicatorSet};
use crate::market::{Bar, MarketDataProvider, Series};
use async_trait::async_trait;
use nexus_prompt::PromptEngine;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

const PROMPT_NAME: &str = "stock";
const DEFAULT_STRATEGY: &str = "general";

const DAILY_BARS: usize = 22;
const WEEKLY_BARS: usize = 12;
const MONTHLY_BARS: usize = 12;

/// AI technical analysis over multiple timeframes
pub struct ReportHandler {
    provider: Arc<dyn MarketDataProvider>,
    prompts: Arc<PromptEngine>,
    ai: Arc<AiClient>,
}

impl ReportHandler {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        prompts: Arc<PromptEngine>,
        ai: Arc<AiClient>,
    ) -> Self {
        Self {
            provider,
            prompts,
            ai,
        }
    }
}

#[async_trait]
impl CommandHandler for ReportHandler {
    #[instrument(skip(self))]
    async fn execute(&self, args: &str) -> Result<String> {
        let mut words = args.split_whitespace();
        let Some(symbol) = words.next() else {
            return Err(BotError::service(
                "Please provide a stock symbol, e.g. /stock 2330",
            ));
        };
        let strategy = words.next().unwrap_or(DEFAULT_STRATEGY);

        let (quote, daily, weekly, monthly) = tokio::try_join!(
            self.provider.get_quote(symbol),
            self.provider.get_history(symbol, "1d", "6mo"),
            self.provider.get_history(symbol, "1wk", "1y"),
            self.provider.get_history(symbol, "1mo", "2y"),
        )
        .map_err(data_retrieval_failed)?;

        let daily = IndicatorEngine::compute(daily);
        info!(
            symbol = %quote.symbol,
            strategy,
            daily = daily.series.len(),
            weekly = weekly.len(),
            monthly = monthly.len(),
            "Market data collected"
        );

        let vars = json!({
            "symbol": quote.symbol,
            "price": format!("{:.2}", quote.current_price),
            "currency": quote.currency,
            "change": signed(quote.change),
            "change_percent": signed(quote.change_percent),
            "strategy": strategy,
            "indicators": indicator_vars(&daily.indicators),
            "daily_bars": bar_lines(&daily.series, DAILY_BARS),
            "weekly_bars": bar_lines(&weekly, WEEKLY_BARS),
            "monthly_bars": bar_lines(&monthly, MONTHLY_BARS),
        });
        let prompt = self.prompts.render(PROMPT_NAME, &vars)?;

        match self.ai.generate(&prompt).await {
            Ok(Some(report)) => Ok(report),
            Ok(None) => Err(BotError::external("AI analysis returned empty content.")),
            Err(e) => Err(BotError::external_with(
                "AI analysis is currently unavailable, please try again later.",
                e,
            )),
        }
    }

    fn name(&self) -> &'static str {
        "stock"
    }
}

fn signed(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:+.2}"))
}

fn fixed(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn indicator_vars(set: &IndicatorSet) -> Value {
    json!({
        "ma5": fixed(set.ma5),
        "ma10": fixed(set.ma10),
        "ma20": fixed(set.ma20),
        "ma60": fixed(set.ma60),
        "rsi14": fixed(set.rsi14),
        "macd_line": fixed(set.macd_line),
        "macd_signal": fixed(set.macd_signal),
        "macd_histogram": fixed(set.macd_histogram),
        "bb_upper": fixed(set.bb_upper),
        "bb_middle": fixed(set.bb_middle),
        "bb_lower": fixed(set.bb_lower),
    })
}

fn bar_line(bar: &Bar) -> String {
    format!(
        "- {}: O:{:.2} H:{:.2} L:{:.2} C:{:.2} V:{}",
        bar.timestamp.format("%Y-%m-%d"),
        bar.open,
        bar.high,
        bar.low,
        bar.close,
        bar.volume
    )
}

fn bar_lines(series: &Series, count: usize) -> Vec<String> {
    series.tail(count).iter().map(bar_line).collect()
}
