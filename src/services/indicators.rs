//! Indicator math over an ascending price series.
//!
//! Everything here is synchronous and allocation-light; callers decide what to do with
//! series that are too short (functions return `None` or documented neutral values).

pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;

/// Mean of the last `window` values, `None` if there are fewer than `window` values.
pub fn sma_tail(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Exponential Moving Average at every index.
///
/// Seeded with the first value, then `ema = (value - ema) * (2 / (period + 1)) + ema`.
/// Element `i` is exactly the EMA of the prefix `values[..=i]`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&seed) = values.first() else {
        return Vec::new();
    };
    let multiplier = 2.0 / (period as f64 + 1.0);

    values
        .iter()
        .enumerate()
        .scan(seed, move |prev, (i, &v)| {
            if i > 0 {
                *prev = (v - *prev) * multiplier + *prev;
            }
            Some(*prev)
        })
        .collect()
}

/// Final EMA value of the series, 0.0 for an empty series.
pub fn ema(values: &[f64], period: usize) -> f64 {
    ema_series(values, period).last().copied().unwrap_or(0.0)
}

/// Relative Strength Index over the trailing `period` price changes.
///
/// Gains are positive deltas, losses the magnitude of negative deltas. When the average
/// loss is zero the RSI is 100. Returns `None` when fewer than `period` deltas exist.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - period..];

    let avg_gain = recent.iter().map(|&d| d.max(0.0)).sum::<f64>() / period as f64;
    let avg_loss = recent.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD (12/26/9) at the end of the series.
///
/// The MACD line is evaluated on every prefix of `prices` and the signal line is the
/// 9-period EMA of those values. Because the EMA is causal, the prefix values are the
/// running fast/slow EMA difference, so this is computed in one pass.
pub fn macd(prices: &[f64]) -> Macd {
    if prices.is_empty() {
        return Macd {
            line: 0.0,
            signal: 0.0,
            histogram: 0.0,
        };
    }

    let fast = ema_series(prices, MACD_FAST_PERIOD);
    let slow = ema_series(prices, MACD_SLOW_PERIOD);
    let macd_values: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

    let line = macd_values.last().copied().unwrap_or(0.0);
    let signal = ema(&macd_values, MACD_SIGNAL_PERIOD);

    Macd {
        line,
        signal,
        histogram: line - signal,
    }
}

/// Simple period-over-period returns. Steps whose previous price is zero are skipped.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Population standard deviation, 0.0 for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    let Some(avg) = mean(values) else {
        return 0.0;
    };
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard deviation of simple returns.
pub fn volatility(prices: &[f64]) -> f64 {
    population_std_dev(&simple_returns(prices))
}
