//! Technical indicators over a price series
//!
//! Only the value at the newest bar is kept. An indicator whose lookback is
//! longer than the series is `None` rather than a partial-window estimate.

use crate::market::Series;
use serde::Serialize;
use ta::Next;
use ta::indicators::{BollingerBands, MovingAverageConvergenceDivergence, SimpleMovingAverage};

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BB_PERIOD: usize = 20;
const BB_MULTIPLIER: f64 = 2.0;

/// Latest indicator values; `None` when the series is too short
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

/// A series together with indicators computed from it
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    pub series: Series,
    pub indicators: IndicatorSet,
}

/// Computes [`IndicatorSet`]s from closing prices
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Attach indicators computed over `series` closes
    pub fn compute(series: Series) -> EnrichedSeries {
        let closes = series.closes();
        let indicators = Self::indicators(&closes);
        EnrichedSeries { series, indicators }
    }

    /// Indicators over `closes`, oldest first
    pub fn indicators(closes: &[f64]) -> IndicatorSet {
        if closes.is_empty() {
            return IndicatorSet::default();
        }

        let (macd_line, macd_signal, macd_histogram) = match macd(closes) {
            Some((line, signal, histogram)) => (Some(line), Some(signal), Some(histogram)),
            None => (None, None, None),
        };
        let (bb_upper, bb_middle, bb_lower) = match bollinger(closes) {
            Some((upper, middle, lower)) => (Some(upper), Some(middle), Some(lower)),
            None => (None, None, None),
        };

        IndicatorSet {
            ma5: sma(closes, 5),
            ma10: sma(closes, 10),
            ma20: sma(closes, 20),
            ma60: sma(closes, 60),
            rsi14: wilder_rsi(closes, RSI_PERIOD),
            macd_line,
            macd_signal,
            macd_histogram,
            bb_upper,
            bb_middle,
            bb_lower,
        }
    }
}

fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period {
        return None;
    }
    let mut indicator = SimpleMovingAverage::new(period).ok()?;
    closes.iter().map(|&close| indicator.next(close)).last()
}

/// RSI with Wilder smoothing, seeded by the simple mean of the first
/// `period` gains and losses
fn wilder_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() <= period {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = deltas.split_at(period);

    let n = period as f64;
    let mut avg_gain = seed.iter().map(|d| d.max(0.0)).sum::<f64>() / n;
    let mut avg_loss = seed.iter().map(|d| (-d).max(0.0)).sum::<f64>() / n;

    for delta in rest {
        avg_gain = (avg_gain * (n - 1.0) + delta.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-delta).max(0.0)) / n;
    }

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

fn macd(closes: &[f64]) -> Option<(f64, f64, f64)> {
    if closes.len() < MACD_SLOW + MACD_SIGNAL - 1 {
        return None;
    }
    let mut indicator =
        MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL).ok()?;
    closes
        .iter()
        .map(|&close| indicator.next(close))
        .last()
        .map(|out| (out.macd, out.signal, out.histogram))
}

fn bollinger(closes: &[f64]) -> Option<(f64, f64, f64)> {
    if closes.len() < BB_PERIOD {
        return None;
    }
    let mut indicator = BollingerBands::new(BB_PERIOD, BB_MULTIPLIER).ok()?;
    closes
        .iter()
        .map(|&close| indicator.next(close))
        .last()
        .map(|out| (out.upper, out.average, out.lower))
}
