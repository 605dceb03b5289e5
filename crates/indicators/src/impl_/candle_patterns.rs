//! Single- and two-bar candlestick patterns.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::require_range;
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::traits::{Indicator, ToIndicatorResult};

/// Candle pattern configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandlePatternConfig {
    /// Largest body, as a fraction of the range, that still counts as a doji.
    pub doji_body_ratio: Decimal,
}

impl Default for CandlePatternConfig {
    fn default() -> Self {
        Self {
            doji_body_ratio: Decimal::new(1, 1),
        }
    }
}

impl CandlePatternConfig {
    /// # Errors
    /// [`IndicatorError::ParamOutOfRange`] for a ratio outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_range(
            "CandlePatterns doji_body_ratio",
            self.doji_body_ratio,
            Decimal::ZERO,
            Decimal::ONE,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Doji,
    Hammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
}

impl CandlePattern {
    /// +1 bullish, -1 bearish, 0 indecision.
    #[must_use]
    pub fn bias(&self) -> i32 {
        match self {
            CandlePattern::Doji => 0,
            CandlePattern::Hammer | CandlePattern::BullishEngulfing => 1,
            CandlePattern::ShootingStar | CandlePattern::BearishEngulfing => -1,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CandlePattern::Doji => "doji",
            CandlePattern::Hammer => "hammer",
            CandlePattern::ShootingStar => "shooting_star",
            CandlePattern::BullishEngulfing => "bullish_engulfing",
            CandlePattern::BearishEngulfing => "bearish_engulfing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandlePatternOutput {
    /// Patterns found on this bar, in declaration order.
    pub patterns: Vec<CandlePattern>,
    /// Sum of the pattern biases.
    pub bias: i32,
}

impl ToIndicatorResult for CandlePatternOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        let mut result = IndicatorResult::new(name, timestamp_ns, Decimal::from(self.bias));
        for pattern in &self.patterns {
            result = result.with_meta(pattern.as_str(), true);
        }
        result
    }
}

/// Candle pattern detector
///
/// Remembers only the previous bar.
#[derive(Debug, Clone, PartialEq)]
pub struct CandlePatterns {
    config: CandlePatternConfig,
    gate: BarGate,
    prev: Option<Bar>,
    last: Option<CandlePatternOutput>,
}

impl CandlePatterns {
    /// # Errors
    /// See [`CandlePatternConfig::validate`].
    pub fn new(config: CandlePatternConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            config,
            gate: BarGate::new(),
            prev: None,
            last: None,
        })
    }

    /// Patterns of `bar` given the bar before it.
    #[must_use]
    pub fn detect(&self, bar: &Bar, prev: Option<&Bar>) -> Vec<CandlePattern> {
        let body = bar.body();
        let range = bar.range();
        let upper = bar.upper_shadow();
        let lower = bar.lower_shadow();
        let has_shape = !body.is_zero() || !range.is_zero();

        let mut patterns = Vec::new();
        if body <= self.config.doji_body_ratio * range {
            patterns.push(CandlePattern::Doji);
        }
        if has_shape && lower >= Decimal::TWO * body && upper <= body {
            patterns.push(CandlePattern::Hammer);
        }
        if has_shape && upper >= Decimal::TWO * body && lower <= body {
            patterns.push(CandlePattern::ShootingStar);
        }
        if let Some(prev) = prev {
            if prev.is_bearish()
                && bar.is_bullish()
                && bar.open <= prev.close
                && bar.close >= prev.open
                && body > prev.body()
            {
                patterns.push(CandlePattern::BullishEngulfing);
            }
            if prev.is_bullish()
                && bar.is_bearish()
                && bar.open >= prev.close
                && bar.close <= prev.open
                && body > prev.body()
            {
                patterns.push(CandlePattern::BearishEngulfing);
            }
        }
        patterns
    }
}

impl Indicator for CandlePatterns {
    type Output = CandlePatternOutput;

    fn name(&self) -> &'static str {
        "CandlePatterns"
    }

    fn warmup_periods(&self) -> usize {
        1
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let patterns = self.detect(bar, self.prev.as_ref());
        let bias = patterns.iter().map(CandlePattern::bias).sum();
        self.prev = Some(bar.clone());

        let output = CandlePatternOutput { patterns, bias };
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "CandlePatterns", "reset");
        self.gate.reset();
        self.prev = None;
        self.last = None;
    }
}
