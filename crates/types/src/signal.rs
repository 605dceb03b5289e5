use rust_decimal::Decimal;

use crate::result::{MetaValue, Metadata};

/// Direction of a trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    /// Go long / add exposure
    Buy,
    /// Go short / reduce exposure
    Sell,
    /// Event without a directional bias
    Neutral,
}

/// What caused a signal to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTrigger {
    /// One series crossed another (price vs MA, MACD vs signal line).
    Crossover,
    /// A level threshold was breached (RSI overbought/oversold).
    ThresholdBreach,
    /// Price and oscillator trends disagree.
    Divergence,
    /// A trend-following indicator changed direction.
    TrendFlip,
    /// A volatility squeeze ended.
    SqueezeRelease,
    /// Price left its support/resistance range.
    Breakout,
    /// A candle pattern was detected.
    Pattern,
}

/// Directional signal emitted for one bar
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Signal {
    /// Name of the indicator that fired
    pub indicator: String,
    /// Direction of the signal
    pub direction: SignalDirection,
    /// Confidence in `[0, 1]`
    pub strength: Decimal,
    /// Price at which the signal fired (bar close)
    pub price: Decimal,
    /// Timestamp of the bar that fired
    pub timestamp_ns: i64,
    /// Trigger category
    pub trigger: SignalTrigger,
    /// Trigger details
    #[serde(default)]
    pub metadata: Metadata,
}

impl Signal {
    /// Creates a signal; `strength` is clamped into `[0, 1]`.
    #[must_use]
    pub fn new(
        indicator: impl Into<String>,
        direction: SignalDirection,
        strength: Decimal,
        price: Decimal,
        timestamp_ns: i64,
        trigger: SignalTrigger,
    ) -> Self {
        Self {
            indicator: indicator.into(),
            direction,
            strength: strength.clamp(Decimal::ZERO, Decimal::ONE),
            price,
            timestamp_ns,
            trigger,
            metadata: Metadata::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
