//! Exponential Moving Average (EMA) indicator

use serde::{Deserialize, Serialize};
use thebot_types::Bar;

use crate::config::require_period;
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::impl_::sma::MovingAverageOutput;
use crate::smoothing::ExpSmoother;
use crate::traits::Indicator;

/// EMA configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaConfig {
    /// Span of the average.
    pub period: usize,
}

impl Default for EmaConfig {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl EmaConfig {
    /// # Errors
    /// [`IndicatorError::InvalidParams`] for a zero period.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("EMA period", self.period)
    }
}

/// Exponential Moving Average
///
/// Matches pandas `ewm(span=period, adjust=False).mean()` semantics:
/// the first close is the first value, then
/// `ema = alpha * close + (1 - alpha) * prev` with `alpha = 2 / (period + 1)`.
/// Outputs are flagged unstable until `period` bars were seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    config: EmaConfig,
    gate: BarGate,
    smoother: ExpSmoother,
    last: Option<MovingAverageOutput>,
}

impl Ema {
    /// Creates a new EMA.
    ///
    /// # Errors
    /// [`IndicatorError::InvalidParams`] for a zero period.
    pub fn new(config: EmaConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            smoother: ExpSmoother::ema(config.period),
            config,
            gate: BarGate::new(),
            last: None,
        })
    }

    /// Creates an EMA with the given period.
    ///
    /// # Errors
    /// [`IndicatorError::InvalidParams`] for a zero period.
    pub fn with_period(period: usize) -> Result<Self, IndicatorError> {
        Self::new(EmaConfig { period })
    }

    #[must_use]
    pub fn config(&self) -> &EmaConfig {
        &self.config
    }
}

impl Indicator for Ema {
    type Output = MovingAverageOutput;

    fn name(&self) -> &'static str {
        "EMA"
    }

    fn warmup_periods(&self) -> usize {
        1
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let Some(value) = self.smoother.push(bar.close) else {
            return Ok(None);
        };
        let output = MovingAverageOutput {
            value,
            close: bar.close,
            period: self.config.period,
            stable: self.smoother.is_stable(),
        };
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "EMA", "reset");
        self.gate.reset();
        self.smoother.reset();
        self.last = None;
    }
}
