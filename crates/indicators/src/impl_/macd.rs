//! Moving Average Convergence Divergence (MACD).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::require_period;
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::smoothing::ExpSmoother;
use crate::traits::{Indicator, ToIndicatorResult};

/// MACD configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl MacdConfig {
    /// # Errors
    /// Zero periods or `fast_period >= slow_period`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("MACD fast_period", self.fast_period)?;
        require_period("MACD slow_period", self.slow_period)?;
        require_period("MACD signal_period", self.signal_period)?;
        if self.fast_period >= self.slow_period {
            return Err(IndicatorError::invalid_params(format!(
                "MACD fast_period ({}) must be below slow_period ({})",
                self.fast_period, self.slow_period
            )));
        }
        Ok(())
    }
}

/// MACD output for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacdOutput {
    /// `EMA_fast - EMA_slow`.
    pub macd: Decimal,
    /// EMA of the MACD line.
    pub signal: Decimal,
    /// `macd - signal`.
    pub histogram: Decimal,
    /// True once `slow + signal - 1` bars were seen.
    pub valid: bool,
}

impl ToIndicatorResult for MacdOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        IndicatorResult::new(name, timestamp_ns, self.macd)
            .with_valid(self.valid)
            .with_meta("signal", self.signal)
            .with_meta("histogram", self.histogram)
    }
}

/// MACD line, signal line and histogram.
///
/// All three EMAs are seeded with their first sample, so values exist from
/// the first bar; they are flagged invalid until the slow and signal
/// averages have each seen a full period.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    config: MacdConfig,
    gate: BarGate,
    fast: ExpSmoother,
    slow: ExpSmoother,
    signal: ExpSmoother,
    bars_seen: usize,
    last: Option<MacdOutput>,
}

impl Macd {
    /// Creates a new MACD.
    ///
    /// # Errors
    /// See [`MacdConfig::validate`].
    pub fn new(config: MacdConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            fast: ExpSmoother::ema(config.fast_period),
            slow: ExpSmoother::ema(config.slow_period),
            signal: ExpSmoother::ema(config.signal_period),
            config,
            gate: BarGate::new(),
            bars_seen: 0,
            last: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &MacdConfig {
        &self.config
    }
}

impl Indicator for Macd {
    type Output = MacdOutput;

    fn name(&self) -> &'static str {
        "MACD"
    }

    fn warmup_periods(&self) -> usize {
        self.config.slow_period + self.config.signal_period - 1
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let (Some(fast), Some(slow)) = (self.fast.push(bar.close), self.slow.push(bar.close))
        else {
            return Ok(None);
        };
        let macd = fast - slow;
        let Some(signal) = self.signal.push(macd) else {
            return Ok(None);
        };

        self.bars_seen = self.bars_seen.saturating_add(1);
        let valid = self.bars_seen >= self.warmup_periods();
        if valid && !self.last.as_ref().is_some_and(|o| o.valid) {
            tracing::trace!(
                fast = self.config.fast_period,
                slow = self.config.slow_period,
                signal = self.config.signal_period,
                "MACD ready"
            );
        }

        let output = MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
            valid,
        };
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "MACD", "reset");
        self.gate.reset();
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.bars_seen = 0;
        self.last = None;
    }
}
