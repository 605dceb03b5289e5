//! Relative Strength Index (RSI) with Wilder smoothing.
//!
//! ```text
//! RS  = Average Gain / Average Loss
//! RSI = 100 - (100 / (1 + RS))
//! ```
//!
//! The first `period` price changes are averaged with a simple mean; every
//! later change is folded in with Wilder's `alpha = 1 / period`, not the
//! EMA `2 / (period + 1)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::{require_period, require_range};
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::math::linear_fit;
use crate::smoothing::ExpSmoother;
use crate::traits::{Indicator, ToIndicatorResult};
use crate::window::RingBuffer;

/// RSI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    /// Number of price changes in the initial average and Wilder period.
    pub period: usize,
    /// Level at or above which the market is overbought.
    pub overbought: Decimal,
    /// Level at or below which the market is oversold.
    pub oversold: Decimal,
    /// Number of trailing `(close, rsi)` pairs compared for divergence.
    pub divergence_lookback: usize,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: Decimal::from(70),
            oversold: Decimal::from(30),
            divergence_lookback: 14,
        }
    }
}

impl RsiConfig {
    /// # Errors
    /// Zero periods, thresholds outside `[0, 100]`, or `oversold >= overbought`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("RSI period", self.period)?;
        require_range(
            "RSI overbought",
            self.overbought,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;
        require_range(
            "RSI oversold",
            self.oversold,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;
        if self.oversold >= self.overbought {
            return Err(IndicatorError::invalid_params(format!(
                "RSI oversold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }
        if self.divergence_lookback < 2 {
            return Err(IndicatorError::invalid_params(
                "RSI divergence_lookback must be >= 2",
            ));
        }
        require_period("RSI divergence_lookback", self.divergence_lookback)
    }
}

/// Lifecycle of the gain/loss averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiPhase {
    /// No close seen yet.
    Uninitialized,
    /// Collecting the first `period` price changes.
    Warming {
        /// Price changes collected so far.
        collected: usize,
    },
    /// Emitting a value every bar.
    Ready,
}

/// Level classification of the current RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RsiZone::Overbought => "overbought",
            RsiZone::Oversold => "oversold",
            RsiZone::Neutral => "neutral",
        }
    }
}

/// Disagreement between the price trend and the RSI trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Divergence {
    /// Price trending down while RSI trends up.
    Bullish,
    /// Price trending up while RSI trends down.
    Bearish,
}

impl Divergence {
    /// Classifies the pair of trend slopes.
    #[must_use]
    pub fn from_slopes(price_slope: Decimal, rsi_slope: Decimal) -> Option<Self> {
        if price_slope > Decimal::ZERO && rsi_slope < Decimal::ZERO {
            Some(Divergence::Bearish)
        } else if price_slope < Decimal::ZERO && rsi_slope > Decimal::ZERO {
            Some(Divergence::Bullish)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Divergence::Bullish => "bullish",
            Divergence::Bearish => "bearish",
        }
    }
}

/// RSI output for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsiOutput {
    /// RSI in `[0, 100]`.
    pub rsi: Decimal,
    /// Smoothed average gain.
    pub avg_gain: Decimal,
    /// Smoothed average loss.
    pub avg_loss: Decimal,
    /// Overbought/oversold classification.
    pub zone: RsiZone,
    /// Overbought level in effect for `zone`.
    pub overbought: Decimal,
    /// Oversold level in effect for `zone`.
    pub oversold: Decimal,
    /// Divergence over the trailing window, once it is full.
    pub divergence: Option<Divergence>,
    /// Close of the bar.
    pub close: Decimal,
}

impl ToIndicatorResult for RsiOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        let result = IndicatorResult::new(name, timestamp_ns, self.rsi)
            .with_meta("avg_gain", self.avg_gain)
            .with_meta("avg_loss", self.avg_loss)
            .with_meta("zone", self.zone.as_str());
        match self.divergence {
            Some(d) => result.with_meta("divergence", d.as_str()),
            None => result,
        }
    }
}

/// Relative Strength Index
#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    config: RsiConfig,
    gate: BarGate,
    phase: RsiPhase,
    prev_close: Option<Decimal>,
    gains: ExpSmoother,
    losses: ExpSmoother,
    trail: RingBuffer<(Decimal, Decimal)>,
    last: Option<RsiOutput>,
}

impl Rsi {
    /// Creates a new RSI.
    ///
    /// # Errors
    /// See [`RsiConfig::validate`].
    pub fn new(config: RsiConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            gains: ExpSmoother::wilder(config.period),
            losses: ExpSmoother::wilder(config.period),
            trail: RingBuffer::new(config.divergence_lookback),
            config,
            gate: BarGate::new(),
            phase: RsiPhase::Uninitialized,
            prev_close: None,
            last: None,
        })
    }

    /// Creates an RSI with the given period and default thresholds.
    ///
    /// # Errors
    /// See [`RsiConfig::validate`].
    pub fn with_period(period: usize) -> Result<Self, IndicatorError> {
        Self::new(RsiConfig {
            period,
            ..RsiConfig::default()
        })
    }

    #[must_use]
    pub fn phase(&self) -> RsiPhase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> &RsiConfig {
        &self.config
    }

    fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
        // a vanishing loss average can push RS past the Decimal range
        let Some(one_plus_rs) = avg_gain
            .checked_div(avg_loss)
            .and_then(|rs| rs.checked_add(Decimal::ONE))
        else {
            return Decimal::ONE_HUNDRED;
        };
        let rsi = Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / one_plus_rs;
        rsi.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }

    fn zone(&self, rsi: Decimal) -> RsiZone {
        if rsi >= self.config.overbought {
            RsiZone::Overbought
        } else if rsi <= self.config.oversold {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    fn divergence(&self) -> Option<Divergence> {
        if !self.trail.is_full() {
            return None;
        }
        let (price_slope, _) = linear_fit(self.trail.iter().map(|&(price, _)| price))?;
        let (rsi_slope, _) = linear_fit(self.trail.iter().map(|&(_, rsi)| rsi))?;
        Divergence::from_slopes(price_slope, rsi_slope)
    }
}

impl Indicator for Rsi {
    type Output = RsiOutput;

    fn name(&self) -> &'static str {
        "RSI"
    }

    fn warmup_periods(&self) -> usize {
        self.config.period + 1
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let Some(prev_close) = self.prev_close.replace(bar.close) else {
            self.phase = RsiPhase::Warming { collected: 0 };
            return Ok(None);
        };

        let change = bar.close - prev_close;
        let gain = change.max(Decimal::ZERO);
        let loss = (-change).max(Decimal::ZERO);

        let (Some(avg_gain), Some(avg_loss)) = (self.gains.push(gain), self.losses.push(loss))
        else {
            self.phase = RsiPhase::Warming {
                collected: self.gains.samples(),
            };
            return Ok(None);
        };

        if self.phase != RsiPhase::Ready {
            tracing::trace!(period = self.config.period, "RSI ready");
            self.phase = RsiPhase::Ready;
        }

        let rsi = Self::rsi_value(avg_gain, avg_loss);
        self.trail.push_back((bar.close, rsi));

        let output = RsiOutput {
            rsi,
            avg_gain,
            avg_loss,
            zone: self.zone(rsi),
            overbought: self.config.overbought,
            oversold: self.config.oversold,
            divergence: self.divergence(),
            close: bar.close,
        };
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "RSI", "reset");
        self.gate.reset();
        self.phase = RsiPhase::Uninitialized;
        self.prev_close = None;
        self.gains.reset();
        self.losses.reset();
        self.trail.clear();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bar, from_closes, ohlc};
    use rust_decimal_macros::dec;

    fn rsi_config(period: usize, divergence_lookback: usize) -> RsiConfig {
        RsiConfig {
            period,
            divergence_lookback,
            ..RsiConfig::default()
        }
    }

    #[test]
    fn test_phase_transitions() {
        let mut rsi = Rsi::with_period(3).unwrap();
        assert_eq!(rsi.phase(), RsiPhase::Uninitialized);

        let bars = from_closes(&[dec!(10), dec!(11), dec!(12), dec!(11), dec!(13)]);
        assert_eq!(rsi.update(&bars[0]).unwrap(), None);
        assert_eq!(rsi.phase(), RsiPhase::Warming { collected: 0 });
        assert_eq!(rsi.update(&bars[1]).unwrap(), None);
        assert_eq!(rsi.phase(), RsiPhase::Warming { collected: 1 });
        assert_eq!(rsi.update(&bars[2]).unwrap(), None);
        assert_eq!(rsi.phase(), RsiPhase::Warming { collected: 2 });
        assert!(rsi.update(&bars[3]).unwrap().is_some());
        assert_eq!(rsi.phase(), RsiPhase::Ready);
        assert!(rsi.update(&bars[4]).unwrap().is_some());
    }

    #[test]
    fn test_all_gains_is_exactly_100() {
        let closes: Vec<Decimal> = (0..15).map(|i| Decimal::from(100 + i)).collect();
        let mut rsi = Rsi::with_period(14).unwrap();
        let outputs = rsi.replay(&from_closes(&closes)).unwrap();

        assert!(outputs[..14].iter().all(Option::is_none));
        let last = outputs[14].as_ref().unwrap();
        assert_eq!(last.rsi, dec!(100));
        assert_eq!(last.avg_loss, Decimal::ZERO);
        assert_eq!(last.zone, RsiZone::Overbought);
    }

    #[test]
    fn test_wilder_reference_values() {
        let closes = [
            dec!(44.34),
            dec!(44.09),
            dec!(44.15),
            dec!(43.61),
            dec!(44.33),
            dec!(44.83),
            dec!(45.10),
            dec!(45.42),
            dec!(45.84),
            dec!(46.08),
            dec!(45.89),
            dec!(46.03),
            dec!(45.61),
            dec!(46.28),
            dec!(46.28),
        ];
        let mut rsi = Rsi::with_period(14).unwrap();
        let outputs = rsi.replay(&from_closes(&closes)).unwrap();
        let first = outputs[14].as_ref().unwrap();

        assert_eq!(first.avg_gain, dec!(3.34) / dec!(14));
        assert_eq!(first.avg_loss, dec!(0.1));
        assert_eq!(first.rsi.round_dp(2), dec!(70.46));
    }

    #[test]
    fn test_wilder_smoothing_after_seed() {
        let mut rsi = Rsi::with_period(2).unwrap();
        let outputs = rsi
            .replay(&from_closes(&[dec!(10), dec!(11), dec!(10.5), dec!(12)]))
            .unwrap();
        let seeded = outputs[2].as_ref().unwrap();
        assert_eq!(seeded.avg_gain, dec!(0.5));
        assert_eq!(seeded.avg_loss, dec!(0.25));

        let smoothed = outputs[3].as_ref().unwrap();
        assert_eq!(smoothed.avg_gain, dec!(1.0));
        assert_eq!(smoothed.avg_loss, dec!(0.125));
        // RS = 8 -> 100 - 100 / 9
        assert_eq!(smoothed.rsi, dec!(100) - dec!(100) / dec!(9));
    }

    #[test]
    fn test_rsi_is_bounded() {
        let closes = [
            dec!(50),
            dec!(40),
            dec!(30),
            dec!(20),
            dec!(10),
            dec!(5),
            dec!(6),
            dec!(100),
        ];
        let mut rsi = Rsi::with_period(3).unwrap();
        for output in rsi.replay(&from_closes(&closes)).unwrap().into_iter().flatten() {
            assert!(output.rsi >= Decimal::ZERO && output.rsi <= dec!(100));
        }
    }

    #[test]
    fn test_all_losses_is_zero_and_oversold() {
        let closes: Vec<Decimal> = (0..6).map(|i| Decimal::from(100 - i)).collect();
        let mut rsi = Rsi::with_period(3).unwrap();
        let last = rsi.replay(&from_closes(&closes)).unwrap().pop().flatten().unwrap();
        assert_eq!(last.rsi, Decimal::ZERO);
        assert_eq!(last.zone, RsiZone::Oversold);
    }

    #[test]
    fn test_bearish_divergence() {
        let mut rsi = Rsi::new(rsi_config(2, 3)).unwrap();
        let closes = [dec!(10), dec!(11), dec!(10.5), dec!(12), dec!(11), dec!(12.1)];
        let outputs = rsi.replay(&from_closes(&closes)).unwrap();

        assert_eq!(outputs[2].as_ref().unwrap().divergence, None);
        assert_eq!(outputs[3].as_ref().unwrap().divergence, None);
        assert_eq!(
            outputs[5].as_ref().unwrap().divergence,
            Some(Divergence::Bearish)
        );
    }

    #[test]
    fn test_bullish_divergence() {
        let mut rsi = Rsi::new(rsi_config(2, 3)).unwrap();
        let closes = [dec!(10), dec!(9), dec!(9.5), dec!(8), dec!(9), dec!(7.9)];
        let outputs = rsi.replay(&from_closes(&closes)).unwrap();
        assert_eq!(
            outputs[5].as_ref().unwrap().divergence,
            Some(Divergence::Bullish)
        );
    }

    #[test]
    fn test_divergence_classification() {
        assert_eq!(
            Divergence::from_slopes(dec!(1), dec!(-1)),
            Some(Divergence::Bearish)
        );
        assert_eq!(
            Divergence::from_slopes(dec!(-1), dec!(2)),
            Some(Divergence::Bullish)
        );
        assert_eq!(Divergence::from_slopes(dec!(1), dec!(1)), None);
        assert_eq!(Divergence::from_slopes(dec!(0), dec!(-1)), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(Rsi::with_period(0).is_err());
        let inverted = RsiConfig {
            overbought: dec!(30),
            oversold: dec!(70),
            ..RsiConfig::default()
        };
        assert!(Rsi::new(inverted).is_err());
        let out_of_range = RsiConfig {
            overbought: dec!(120),
            ..RsiConfig::default()
        };
        assert!(matches!(
            Rsi::new(out_of_range),
            Err(IndicatorError::ParamOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejected_bar_leaves_state_unchanged() {
        let mut rsi = Rsi::with_period(2).unwrap();
        rsi.replay(&from_closes(&[dec!(10), dec!(11), dec!(12), dec!(11)]))
            .unwrap();
        let before = rsi.clone();

        let bad = ohlc(crate::test_support::minute(4), dec!(11), dec!(10), dec!(9), dec!(12));
        assert!(rsi.update(&bad).is_err());
        assert_eq!(rsi, before);
    }

    #[test]
    fn test_reset_behaves_like_fresh() {
        let mut rsi = Rsi::with_period(2).unwrap();
        rsi.replay(&from_closes(&[dec!(10), dec!(11), dec!(12), dec!(11)]))
            .unwrap();
        rsi.reset();
        assert_eq!(rsi, Rsi::with_period(2).unwrap());
        assert_eq!(rsi.update(&bar(0, dec!(10))).unwrap(), None);
    }

    #[test]
    fn test_output_carries_configured_levels() {
        let config = RsiConfig {
            period: 2,
            overbought: dec!(90),
            oversold: dec!(10),
            ..RsiConfig::default()
        };
        let mut rsi = Rsi::new(config).unwrap();
        let outputs = rsi
            .replay(&from_closes(&[dec!(10), dec!(11), dec!(10), dec!(11)]))
            .unwrap();
        let last = outputs[3].as_ref().unwrap();
        assert_eq!(last.rsi, dec!(75));
        assert_eq!(last.zone, RsiZone::Neutral);
        assert_eq!((last.oversold, last.overbought), (dec!(10), dec!(90)));
    }
}
