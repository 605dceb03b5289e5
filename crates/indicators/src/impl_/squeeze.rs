//! Squeeze Momentum
//!
//! A squeeze is on while the Bollinger Bands sit strictly inside the
//! Keltner Channel. The bar on which that stops being true is the release
//! event; momentum is the linear-regression endpoint of the close's
//! distance from the mid-point of the range and the SMA.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::{require_multiplier, require_period};
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::impl_::atr::AtrMode;
use crate::impl_::bollinger::{BollingerBands, BollingerOutput};
use crate::impl_::keltner::{KeltnerChannels, KeltnerOutput};
use crate::math::linreg_endpoint;
use crate::traits::{Indicator, ToIndicatorResult};
use crate::window::{RingBuffer, RollingExtreme, RollingSum};

/// Squeeze configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqueezeConfig {
    /// Period of the Bollinger Bands, the Keltner middle line and momentum.
    pub period: usize,
    pub bb_multiplier: Decimal,
    pub kc_multiplier: Decimal,
    pub atr_period: usize,
    pub atr_mode: AtrMode,
}

impl Default for SqueezeConfig {
    fn default() -> Self {
        Self {
            period: 20,
            bb_multiplier: Decimal::TWO,
            kc_multiplier: Decimal::new(15, 1),
            atr_period: 20,
            atr_mode: AtrMode::Sma,
        }
    }
}

impl SqueezeConfig {
    /// # Errors
    /// Zero periods or multipliers outside `(0, 100]`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("Squeeze period", self.period)?;
        require_period("Squeeze atr_period", self.atr_period)?;
        require_multiplier("Squeeze bb_multiplier", self.bb_multiplier)?;
        require_multiplier("Squeeze kc_multiplier", self.kc_multiplier)
    }
}

/// Squeeze output for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqueezeOutput {
    /// Bollinger Bands strictly inside the Keltner Channel.
    pub squeeze_active: bool,
    /// Consecutive active bars, including this one.
    pub squeeze_count: usize,
    /// True only on the first inactive bar after an active one.
    pub released: bool,
    /// Length of the squeeze that ended on this bar; 0 unless `released`.
    pub release_length: usize,
    /// `None` until `period` momentum samples exist.
    pub momentum: Option<Decimal>,
    pub bollinger: BollingerOutput,
    pub keltner: KeltnerOutput,
}

/// The result value is the squeeze count; momentum is only reported in the
/// metadata once it exists, and the result is valid from then on.
impl ToIndicatorResult for SqueezeOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        IndicatorResult::new(name, timestamp_ns, Decimal::from(self.squeeze_count))
            .with_valid(self.momentum.is_some())
            .with_opt_meta("momentum", self.momentum)
            .with_meta("squeeze_active", self.squeeze_active)
            .with_meta("squeeze_count", self.squeeze_count)
            .with_meta("released", self.released)
            .with_meta("release_length", self.release_length)
            .with_meta("bb_upper", self.bollinger.upper)
            .with_meta("bb_lower", self.bollinger.lower)
            .with_meta("kc_upper", self.keltner.upper)
            .with_meta("kc_lower", self.keltner.lower)
    }
}

/// Squeeze Momentum
#[derive(Debug, Clone, PartialEq)]
pub struct Squeeze {
    config: SqueezeConfig,
    gate: BarGate,
    bollinger: BollingerBands,
    keltner: KeltnerChannels,
    highest: RollingExtreme,
    lowest: RollingExtreme,
    closes: RollingSum,
    deltas: RingBuffer<Decimal>,
    active: bool,
    count: usize,
    last: Option<SqueezeOutput>,
}

impl Squeeze {
    /// Creates a new Squeeze calculator.
    ///
    /// # Errors
    /// See [`SqueezeConfig::validate`].
    pub fn new(config: SqueezeConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            bollinger: BollingerBands::new(config.period, config.bb_multiplier),
            keltner: KeltnerChannels::new(
                config.period,
                config.kc_multiplier,
                config.atr_period,
                config.atr_mode,
            ),
            highest: RollingExtreme::max(config.period),
            lowest: RollingExtreme::min(config.period),
            closes: RollingSum::new(config.period),
            deltas: RingBuffer::new(config.period),
            config,
            gate: BarGate::new(),
            active: false,
            count: 0,
            last: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SqueezeConfig {
        &self.config
    }

    fn push_momentum(&mut self, bar: &Bar) -> Option<Decimal> {
        self.highest.push(bar.high);
        self.lowest.push(bar.low);
        let sma = self.closes.push(bar.close);
        let (Some(hh), Some(ll), Some(sma)) = (self.highest.value(), self.lowest.value(), sma)
        else {
            return None;
        };
        let midline = ((hh + ll) / Decimal::TWO + sma) / Decimal::TWO;
        self.deltas.push_back(bar.close - midline);
        if !self.deltas.is_full() {
            return None;
        }
        let deltas: Vec<Decimal> = self.deltas.iter().copied().collect();
        linreg_endpoint(&deltas)
    }
}

impl Indicator for Squeeze {
    type Output = SqueezeOutput;

    fn name(&self) -> &'static str {
        "Squeeze"
    }

    fn warmup_periods(&self) -> usize {
        // momentum regresses `period` deltas, each needing `period` bars
        (2 * self.config.period - 1).max(self.config.atr_period)
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let bollinger = self.bollinger.push(bar);
        let keltner = self.keltner.push(bar);
        let momentum = self.push_momentum(bar);
        let (Some(bollinger), Some(keltner)) = (bollinger, keltner) else {
            return Ok(None);
        };

        let active = bollinger.upper < keltner.upper && bollinger.lower > keltner.lower;
        let released = self.active && !active;
        let release_length = if released { self.count } else { 0 };
        self.count = if active { self.count + 1 } else { 0 };
        self.active = active;
        if released {
            tracing::trace!(length = release_length, "squeeze released");
        }

        let output = SqueezeOutput {
            squeeze_active: active,
            squeeze_count: self.count,
            released,
            release_length,
            momentum,
            bollinger,
            keltner,
        };
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "Squeeze", "reset");
        self.gate.reset();
        self.bollinger.reset();
        self.keltner.reset();
        self.highest.clear();
        self.lowest.clear();
        self.closes.clear();
        self.deltas.clear();
        self.active = false;
        self.count = 0;
        self.last = None;
    }
}
