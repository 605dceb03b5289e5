//! Average True Range (ATR) with volatility-regime helpers.
//!
//! TR = max(High - Low, |High - Prev_Close|, |Low - Prev_Close|); the
//! first bar has no previous close, so its TR is just `High - Low`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::{require_period, require_range};
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::smoothing::ExpSmoother;
use crate::traits::{Indicator, ToIndicatorResult};
use crate::window::{RingBuffer, RollingSum};

/// How true ranges are averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrMode {
    /// Rolling mean of the last `period` true ranges.
    Sma,
    /// Wilder smoothing (`alpha = 1 / period`) seeded by the first mean.
    #[default]
    Wilder,
}

/// ATR configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtrConfig {
    pub period: usize,
    pub mode: AtrMode,
    /// Number of previous ATR values the percentile rank is taken against.
    pub percentile_lookback: usize,
    /// Percentile rank at or below which volatility is `Low`.
    pub low_threshold: Decimal,
    /// Percentile rank at or above which volatility is `High`.
    pub high_threshold: Decimal,
}

impl Default for AtrConfig {
    fn default() -> Self {
        Self {
            period: 14,
            mode: AtrMode::Wilder,
            percentile_lookback: 100,
            low_threshold: Decimal::new(2, 1),
            high_threshold: Decimal::new(8, 1),
        }
    }
}

impl AtrConfig {
    /// # Errors
    /// Zero periods, thresholds outside `[0, 1]`, or `low >= high`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("ATR period", self.period)?;
        require_period("ATR percentile_lookback", self.percentile_lookback)?;
        require_range(
            "ATR low_threshold",
            self.low_threshold,
            Decimal::ZERO,
            Decimal::ONE,
        )?;
        require_range(
            "ATR high_threshold",
            self.high_threshold,
            Decimal::ZERO,
            Decimal::ONE,
        )?;
        if self.low_threshold >= self.high_threshold {
            return Err(IndicatorError::invalid_params(format!(
                "ATR low_threshold ({}) must be below high_threshold ({})",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

/// Three-state volatility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityRegime {
    Low,
    Normal,
    High,
}

impl VolatilityRegime {
    /// Classifies a percentile rank against the two thresholds.
    #[must_use]
    pub fn classify(rank: Decimal, low_threshold: Decimal, high_threshold: Decimal) -> Self {
        if rank >= high_threshold {
            VolatilityRegime::High
        } else if rank <= low_threshold {
            VolatilityRegime::Low
        } else {
            VolatilityRegime::Normal
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VolatilityRegime::Low => "low",
            VolatilityRegime::Normal => "normal",
            VolatilityRegime::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Averager {
    Sma(RollingSum),
    Wilder(ExpSmoother),
}

/// Ungated true-range averager shared by ATR, SuperTrend and Keltner.
///
/// Callers are expected to have validated and ordered the bar already.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrueRangeAverage {
    prev_close: Option<Decimal>,
    averager: Averager,
    last_true_range: Option<Decimal>,
}

impl TrueRangeAverage {
    #[must_use]
    pub fn new(period: usize, mode: AtrMode) -> Self {
        let averager = match mode {
            AtrMode::Sma => Averager::Sma(RollingSum::new(period)),
            AtrMode::Wilder => Averager::Wilder(ExpSmoother::wilder(period)),
        };
        Self {
            prev_close: None,
            averager,
            last_true_range: None,
        }
    }

    /// True range of `bar` given the previous close.
    #[must_use]
    pub fn true_range(bar: &Bar, prev_close: Option<Decimal>) -> Decimal {
        let hl = bar.high - bar.low;
        match prev_close {
            None => hl,
            Some(prev) => {
                let hc = (bar.high - prev).abs();
                let lc = (bar.low - prev).abs();
                hl.max(hc).max(lc)
            }
        }
    }

    /// Folds in one bar; returns the ATR once enough true ranges were seen.
    pub fn push(&mut self, bar: &Bar) -> Option<Decimal> {
        let tr = Self::true_range(bar, self.prev_close);
        self.prev_close = Some(bar.close);
        self.last_true_range = Some(tr);
        match &mut self.averager {
            Averager::Sma(window) => window.push(tr),
            Averager::Wilder(smoother) => smoother.push(tr),
        }
    }

    #[must_use]
    pub fn last_true_range(&self) -> Option<Decimal> {
        self.last_true_range
    }

    pub fn reset(&mut self) {
        self.prev_close = None;
        self.last_true_range = None;
        match &mut self.averager {
            Averager::Sma(window) => window.clear(),
            Averager::Wilder(smoother) => smoother.reset(),
        }
    }
}

/// ATR output for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtrOutput {
    pub atr: Decimal,
    /// True range of this bar.
    pub true_range: Decimal,
    /// `atr / close`, comparable across instruments.
    pub normalized: Decimal,
    /// Fraction of the previous `percentile_lookback` ATRs strictly below
    /// this one. `None` until that history is full.
    pub percentile_rank: Option<Decimal>,
    pub regime: Option<VolatilityRegime>,
}

impl ToIndicatorResult for AtrOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        IndicatorResult::new(name, timestamp_ns, self.atr)
            .with_meta("true_range", self.true_range)
            .with_meta("normalized", self.normalized)
            .with_opt_meta("percentile_rank", self.percentile_rank)
            .with_opt_meta("regime", self.regime.map(|r| r.as_str()))
    }
}

/// Average True Range
#[derive(Debug, Clone, PartialEq)]
pub struct Atr {
    config: AtrConfig,
    gate: BarGate,
    average: TrueRangeAverage,
    history: RingBuffer<Decimal>,
    last: Option<AtrOutput>,
}

impl Atr {
    /// Creates a new ATR.
    ///
    /// # Errors
    /// See [`AtrConfig::validate`].
    pub fn new(config: AtrConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            average: TrueRangeAverage::new(config.period, config.mode),
            history: RingBuffer::new(config.percentile_lookback),
            config,
            gate: BarGate::new(),
            last: None,
        })
    }

    /// Creates an ATR with the given period and smoothing mode.
    ///
    /// # Errors
    /// See [`AtrConfig::validate`].
    pub fn with_period(period: usize, mode: AtrMode) -> Result<Self, IndicatorError> {
        Self::new(AtrConfig {
            period,
            mode,
            ..AtrConfig::default()
        })
    }

    #[must_use]
    pub fn config(&self) -> &AtrConfig {
        &self.config
    }

    fn percentile_rank(&self, atr: Decimal) -> Option<Decimal> {
        if !self.history.is_full() {
            return None;
        }
        let below = self.history.iter().filter(|&&v| v < atr).count();
        Some(Decimal::from(below) / Decimal::from(self.history.len()))
    }
}

impl Indicator for Atr {
    type Output = AtrOutput;

    fn name(&self) -> &'static str {
        "ATR"
    }

    fn warmup_periods(&self) -> usize {
        self.config.period
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let atr = self.average.push(bar);
        let (Some(atr), Some(true_range)) = (atr, self.average.last_true_range()) else {
            return Ok(None);
        };

        let percentile_rank = self.percentile_rank(atr);
        self.history.push_back(atr);
        let regime = percentile_rank.map(|rank| {
            VolatilityRegime::classify(
                rank,
                self.config.low_threshold,
                self.config.high_threshold,
            )
        });

        if self.last.is_none() {
            tracing::trace!(period = self.config.period, mode = ?self.config.mode, "ATR ready");
        }
        let output = AtrOutput {
            atr,
            true_range,
            normalized: atr / bar.close,
            percentile_rank,
            regime,
        };
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "ATR", "reset");
        self.gate.reset();
        self.average.reset();
        self.history.clear();
        self.last = None;
    }
}
