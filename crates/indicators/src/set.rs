//! All calculators of one `(symbol, timeframe)` stream.

use thebot_types::{Bar, IndicatorResult, Signal, Timeframe};

use crate::config::{EngineConfig, IndicatorKind};
use crate::error::IndicatorError;
use crate::factory::{Calculator, IndicatorFactory};
use crate::gate::BarGate;
use crate::signals::SignalConfig;

/// Outcome of one calculator for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorUpdate {
    pub kind: IndicatorKind,
    /// `None` while the calculator is warming up.
    pub result: Option<IndicatorResult>,
    pub signal: Option<Signal>,
}

/// Calculators sharing one bar stream.
///
/// The set checks every bar once, up front, so a rejected bar reaches no
/// calculator and every calculator sees exactly the same accepted bars.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    symbol: String,
    timeframe: Timeframe,
    gate: BarGate,
    calculators: Vec<Calculator>,
    signals: SignalConfig,
}

impl IndicatorSet {
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        calculators: Vec<Calculator>,
        signals: SignalConfig,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            gate: BarGate::new(),
            calculators,
            signals,
        }
    }

    /// Builds the calculators listed in `config`.
    ///
    /// # Errors
    /// The first invalid calculator or signal config.
    pub fn from_config(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        config: &EngineConfig,
        factory: &IndicatorFactory,
    ) -> Result<Self, IndicatorError> {
        config.signals.validate()?;
        let calculators = factory.build_all(&config.indicators)?;
        Ok(Self::new(
            symbol,
            timeframe,
            calculators,
            config.signals.clone(),
        ))
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    #[must_use]
    pub fn calculators(&self) -> &[Calculator] {
        &self.calculators
    }

    /// Timestamp of the last accepted bar.
    #[must_use]
    pub fn last_timestamp_ns(&self) -> Option<i64> {
        self.gate.last_timestamp_ns()
    }

    fn admit(&mut self, bar: &Bar) -> Result<(), IndicatorError> {
        if bar.symbol != self.symbol || bar.timeframe != self.timeframe {
            return Err(IndicatorError::stream_mismatch(
                (&self.symbol, self.timeframe),
                (&bar.symbol, bar.timeframe),
            ));
        }
        self.gate.admit(bar)
    }

    /// Feeds one bar to every calculator, in configuration order.
    ///
    /// # Errors
    /// A validation error when the bar is malformed, older than the last
    /// accepted bar, or belongs to another stream. No calculator is touched
    /// in that case.
    pub fn update(&mut self, bar: &Bar) -> Result<Vec<IndicatorUpdate>, IndicatorError> {
        if let Err(err) = self.admit(bar) {
            tracing::warn!(
                symbol = %self.symbol,
                timeframe = %self.timeframe,
                timestamp_ns = bar.timestamp_ns,
                error = %err,
                "bar rejected"
            );
            return Err(err);
        }

        let signals = &self.signals;
        self.calculators
            .iter_mut()
            .map(|calculator| calculator.signal(bar, signals))
            .collect()
    }

    /// Feeds a history of bars in order.
    ///
    /// # Errors
    /// The first rejected bar; bars before it stay applied.
    pub fn replay(&mut self, bars: &[Bar]) -> Result<Vec<Vec<IndicatorUpdate>>, IndicatorError> {
        bars.iter().map(|bar| self.update(bar)).collect()
    }

    /// Clears every calculator; the next bar behaves like the first one.
    pub fn reset(&mut self) {
        tracing::debug!(symbol = %self.symbol, timeframe = %self.timeframe, "indicator set reset");
        self.gate.reset();
        for calculator in &mut self.calculators {
            calculator.reset();
        }
    }
}
