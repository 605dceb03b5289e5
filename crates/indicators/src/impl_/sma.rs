//! Simple Moving Average (SMA) indicator

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::require_period;
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::traits::{Indicator, ToIndicatorResult};
use crate::window::RollingSum;

/// SMA configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaConfig {
    /// Number of closes averaged.
    pub period: usize,
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl SmaConfig {
    /// # Errors
    /// [`IndicatorError::InvalidParams`] for a zero period.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("SMA period", self.period)
    }
}

/// Output shared by the moving-average calculators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovingAverageOutput {
    /// Average value.
    pub value: Decimal,
    /// Close of the bar that produced the value.
    pub close: Decimal,
    /// Period used.
    pub period: usize,
    /// False while an exponential average has seen fewer than `period` bars.
    pub stable: bool,
}

impl ToIndicatorResult for MovingAverageOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        IndicatorResult::new(name, timestamp_ns, self.value)
            .with_valid(self.stable)
            .with_meta("period", self.period)
            .with_meta("close", self.close)
    }
}

/// Simple Moving Average
///
/// Arithmetic mean of the last N closes, kept as a FIFO plus running sum.
/// Produces nothing until N closes have been seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Sma {
    config: SmaConfig,
    gate: BarGate,
    window: RollingSum,
    last: Option<MovingAverageOutput>,
}

impl Sma {
    /// Creates a new SMA.
    ///
    /// # Errors
    /// [`IndicatorError::InvalidParams`] for a zero period.
    pub fn new(config: SmaConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            window: RollingSum::new(config.period),
            config,
            gate: BarGate::new(),
            last: None,
        })
    }

    /// Creates an SMA with the given period.
    ///
    /// # Errors
    /// [`IndicatorError::InvalidParams`] for a zero period.
    pub fn with_period(period: usize) -> Result<Self, IndicatorError> {
        Self::new(SmaConfig { period })
    }

    #[must_use]
    pub fn config(&self) -> &SmaConfig {
        &self.config
    }
}

impl Indicator for Sma {
    type Output = MovingAverageOutput;

    fn name(&self) -> &'static str {
        "SMA"
    }

    fn warmup_periods(&self) -> usize {
        self.config.period
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let Some(value) = self.window.push(bar.close) else {
            return Ok(None);
        };
        let output = MovingAverageOutput {
            value,
            close: bar.close,
            period: self.config.period,
            stable: true,
        };
        if self.last.is_none() {
            tracing::trace!(period = self.config.period, "SMA ready");
        }
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "SMA", "reset");
        self.gate.reset();
        self.window.clear();
        self.last = None;
    }
}
