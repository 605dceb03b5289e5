//! On-Balance Volume (OBV) with an EMA signal line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::require_period;
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::smoothing::ExpSmoother;
use crate::traits::{Indicator, ToIndicatorResult};

/// OBV configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObvConfig {
    /// Span of the EMA signal line.
    pub signal_period: usize,
}

impl Default for ObvConfig {
    fn default() -> Self {
        Self { signal_period: 20 }
    }
}

impl ObvConfig {
    /// # Errors
    /// [`IndicatorError::InvalidParams`] for a zero period.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("OBV signal_period", self.signal_period)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObvOutput {
    pub obv: Decimal,
    /// EMA of OBV.
    pub signal: Decimal,
}

impl ToIndicatorResult for ObvOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        IndicatorResult::new(name, timestamp_ns, self.obv).with_meta("signal", self.signal)
    }
}

/// Magnitude at which the running OBV saturates, `1e27`.
///
/// With volumes capped at [`Bar::MAX_VOLUME`] the running total and its EMA
/// stay inside the `Decimal` range.
pub const OBV_LIMIT: Decimal =
    Decimal::from_parts(3_892_314_112, 2_681_241_660, 54_210_108, false, 0);

/// On-Balance Volume
///
/// Starts at 0 and adds the bar's volume on an up close, subtracts it on a
/// down close. The total saturates at `±OBV_LIMIT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Obv {
    config: ObvConfig,
    gate: BarGate,
    prev_close: Option<Decimal>,
    obv: Decimal,
    signal: ExpSmoother,
    last: Option<ObvOutput>,
}

impl Obv {
    /// # Errors
    /// See [`ObvConfig::validate`].
    pub fn new(config: ObvConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            signal: ExpSmoother::ema(config.signal_period),
            config,
            gate: BarGate::new(),
            prev_close: None,
            obv: Decimal::ZERO,
            last: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ObvConfig {
        &self.config
    }
}

impl Indicator for Obv {
    type Output = ObvOutput;

    fn name(&self) -> &'static str {
        "OBV"
    }

    fn warmup_periods(&self) -> usize {
        1
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        if let Some(prev) = self.prev_close.replace(bar.close) {
            let moved = if bar.close > prev {
                self.obv + bar.volume
            } else if bar.close < prev {
                self.obv - bar.volume
            } else {
                self.obv
            };
            self.obv = moved.clamp(-OBV_LIMIT, OBV_LIMIT);
        }
        let Some(signal) = self.signal.push(self.obv) else {
            return Ok(None);
        };

        let output = ObvOutput {
            obv: self.obv,
            signal,
        };
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "OBV", "reset");
        self.gate.reset();
        self.prev_close = None;
        self.obv = Decimal::ZERO;
        self.signal.reset();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{minute, ohlcv};
    use rust_decimal_macros::dec;

    fn bars() -> Vec<Bar> {
        [
            (dec!(10), dec!(100)),
            (dec!(11), dec!(200)),
            (dec!(11), dec!(300)),
            (dec!(9), dec!(400)),
        ]
        .iter()
        .enumerate()
        .map(|(i, &(c, v))| ohlcv(minute(i), c, c, c, c, v))
        .collect()
    }

    #[test]
    fn test_obv_accumulates_signed_volume() {
        let mut obv = Obv::new(ObvConfig { signal_period: 3 }).unwrap();
        let values: Vec<Decimal> = obv
            .replay(&bars())
            .unwrap()
            .into_iter()
            .map(|o| o.unwrap().obv)
            .collect();
        assert_eq!(values, vec![dec!(0), dec!(200), dec!(200), dec!(-200)]);
    }

    #[test]
    fn test_signal_line_is_ema_of_obv() {
        // alpha = 0.5
        let mut obv = Obv::new(ObvConfig { signal_period: 3 }).unwrap();
        let signals: Vec<Decimal> = obv
            .replay(&bars())
            .unwrap()
            .into_iter()
            .map(|o| o.unwrap().signal)
            .collect();
        assert_eq!(signals, vec![dec!(0), dec!(100), dec!(150), dec!(-25)]);
    }

    #[test]
    fn test_reset_behaves_like_fresh() {
        let mut obv = Obv::new(ObvConfig::default()).unwrap();
        obv.replay(&bars()).unwrap();
        obv.reset();
        assert_eq!(obv, Obv::new(ObvConfig::default()).unwrap());
    }

    #[test]
    fn test_limit_constant() {
        assert_eq!(OBV_LIMIT, dec!(1000000000000000000000000000));
    }

    #[test]
    fn test_max_volume_bars_accumulate() {
        let mut obv = Obv::new(ObvConfig::default()).unwrap();
        let max = Bar::MAX_VOLUME;
        let up = [dec!(10), dec!(11), dec!(12)]
            .iter()
            .enumerate()
            .map(|(i, &c)| ohlcv(minute(i), c, c, c, c, max))
            .collect::<Vec<_>>();
        let last = obv.replay(&up).unwrap().pop().flatten().unwrap();
        assert_eq!(last.obv, max * dec!(2));
    }

    #[test]
    fn test_oversized_volume_is_rejected_before_accumulating() {
        let mut obv = Obv::new(ObvConfig::default()).unwrap();
        obv.replay(&bars()[..2]).unwrap();
        let before = obv.clone();

        let huge = ohlcv(minute(2), dec!(12), dec!(12), dec!(12), dec!(12), Decimal::MAX / dec!(4));
        let err = obv.update(&huge).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::InvalidBar(thebot_types::BarError::VolumeOutOfRange(_))
        ));
        assert_eq!(obv, before);
    }

    #[test]
    fn test_total_saturates_at_limit() {
        let mut obv = Obv::new(ObvConfig::default()).unwrap();
        obv.replay(&bars()[..1]).unwrap();
        obv.obv = OBV_LIMIT - dec!(1);

        let up = ohlcv(minute(1), dec!(11), dec!(11), dec!(11), dec!(11), dec!(10));
        assert_eq!(obv.update(&up).unwrap().unwrap().obv, OBV_LIMIT);

        obv.obv = -OBV_LIMIT;
        let down = ohlcv(minute(2), dec!(10), dec!(10), dec!(10), dec!(10), dec!(10));
        assert_eq!(obv.update(&down).unwrap().unwrap().obv, -OBV_LIMIT);
    }
}
