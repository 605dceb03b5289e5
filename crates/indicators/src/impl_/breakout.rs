//! Support/resistance breakout detector with volume confirmation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::{require_multiplier, require_period, require_range};
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::math::{checked_ratio, unit};
use crate::traits::{Indicator, ToIndicatorResult};
use crate::window::{RollingExtreme, RollingSum};

/// Breakout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    /// Bars before the current one that define support and resistance.
    pub lookback: usize,
    /// Distance beyond the level, in percent, needed to fire.
    pub threshold_pct: Decimal,
    /// Volume relative to the window average that confirms a breakout.
    pub volume_multiplier: Decimal,
    pub volume_confirmation: bool,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            threshold_pct: Decimal::new(5, 1),
            volume_multiplier: Decimal::new(15, 1),
            volume_confirmation: true,
        }
    }
}

impl BreakoutConfig {
    /// # Errors
    /// Zero look-back, a threshold outside `[0, 100]`, or a volume
    /// multiplier outside `(0, 100]`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("Breakout lookback", self.lookback)?;
        require_range(
            "Breakout threshold_pct",
            self.threshold_pct,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;
        require_multiplier("Breakout volume_multiplier", self.volume_multiplier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutDirection {
    /// Close above resistance.
    Up,
    /// Close below support.
    Down,
}

impl BreakoutDirection {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakoutDirection::Up => "up",
            BreakoutDirection::Down => "down",
        }
    }
}

/// Breakout output for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakoutOutput {
    /// Highest high of the previous `lookback` bars.
    pub resistance: Decimal,
    /// Lowest low of the previous `lookback` bars.
    pub support: Decimal,
    pub direction: Option<BreakoutDirection>,
    /// Volume over the window average; `None` when the window traded nothing.
    pub volume_ratio: Option<Decimal>,
    pub confirmed: bool,
    /// In `[0, 1]`; 0 when nothing broke out.
    pub strength: Decimal,
    pub close: Decimal,
}

impl ToIndicatorResult for BreakoutOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        let value = match self.direction {
            Some(BreakoutDirection::Up) => self.strength,
            Some(BreakoutDirection::Down) => -self.strength,
            None => Decimal::ZERO,
        };
        IndicatorResult::new(name, timestamp_ns, value)
            .with_meta("resistance", self.resistance)
            .with_meta("support", self.support)
            .with_opt_meta("direction", self.direction.map(|d| d.as_str()))
            .with_opt_meta("volume_ratio", self.volume_ratio)
            .with_meta("confirmed", self.confirmed)
            .with_meta("strength", self.strength)
    }
}

/// Breakout detector
///
/// Levels come from prior bars only, so a bar can never break its own high.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakout {
    config: BreakoutConfig,
    gate: BarGate,
    highs: RollingExtreme,
    lows: RollingExtreme,
    volumes: RollingSum,
    last: Option<BreakoutOutput>,
}

impl Breakout {
    /// Creates a new breakout detector.
    ///
    /// # Errors
    /// See [`BreakoutConfig::validate`].
    pub fn new(config: BreakoutConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            highs: RollingExtreme::max(config.lookback),
            lows: RollingExtreme::min(config.lookback),
            volumes: RollingSum::new(config.lookback),
            config,
            gate: BarGate::new(),
            last: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BreakoutConfig {
        &self.config
    }

    fn evaluate(&self, bar: &Bar, resistance: Decimal, support: Decimal) -> BreakoutOutput {
        let pct = self.config.threshold_pct / Decimal::ONE_HUNDRED;
        let up_band = resistance * pct;
        let down_band = support * pct;

        let (direction, excess, band) = if bar.close > resistance + up_band {
            (
                Some(BreakoutDirection::Up),
                bar.close - resistance - up_band,
                up_band,
            )
        } else if bar.close < support - down_band {
            (
                Some(BreakoutDirection::Down),
                support - down_band - bar.close,
                down_band,
            )
        } else {
            (None, Decimal::ZERO, Decimal::ZERO)
        };

        let volume_ratio = self
            .volumes
            .mean()
            .and_then(|avg| checked_ratio(bar.volume, avg));
        let confirmed = volume_ratio.is_some_and(|r| r >= self.config.volume_multiplier);

        let strength = if direction.is_some() {
            let distance = checked_ratio(excess, band).map_or(Decimal::ONE, unit);
            let confirmation = if !self.config.volume_confirmation || confirmed {
                Decimal::ONE
            } else {
                volume_ratio
                    .and_then(|r| checked_ratio(r, self.config.volume_multiplier))
                    .map_or(Decimal::ZERO, unit)
            };
            unit(distance * Decimal::new(5, 1) + confirmation * Decimal::new(5, 1))
        } else {
            Decimal::ZERO
        };

        BreakoutOutput {
            resistance,
            support,
            direction,
            volume_ratio,
            confirmed,
            strength,
            close: bar.close,
        }
    }
}

impl Indicator for Breakout {
    type Output = BreakoutOutput;

    fn name(&self) -> &'static str {
        "Breakout"
    }

    fn warmup_periods(&self) -> usize {
        self.config.lookback + 1
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let output = match (self.highs.value(), self.lows.value()) {
            (Some(resistance), Some(support)) => Some(self.evaluate(bar, resistance, support)),
            _ => None,
        };
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        self.volumes.push(bar.volume);

        if let Some(output) = &output {
            if let Some(direction) = output.direction {
                tracing::trace!(
                    direction = direction.as_str(),
                    confirmed = output.confirmed,
                    "breakout"
                );
            }
            self.last = Some(output.clone());
        }
        Ok(output)
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "Breakout", "reset");
        self.gate.reset();
        self.highs.clear();
        self.lows.clear();
        self.volumes.clear();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{minute, ohlcv};
    use rust_decimal_macros::dec;

    fn detector(volume_confirmation: bool) -> Breakout {
        Breakout::new(BreakoutConfig {
            lookback: 3,
            threshold_pct: dec!(1),
            volume_multiplier: dec!(1.5),
            volume_confirmation,
        })
        .unwrap()
    }

    fn base() -> Vec<Bar> {
        vec![
            ohlcv(minute(0), dec!(9.5), dec!(10), dec!(9), dec!(9.8), dec!(100)),
            ohlcv(minute(1), dec!(9.8), dec!(11), dec!(9.5), dec!(10.5), dec!(100)),
            ohlcv(minute(2), dec!(10.5), dec!(10.5), dec!(9.2), dec!(10), dec!(100)),
        ]
    }

    fn probe(close: Decimal, volume: Decimal) -> Bar {
        let open = dec!(10);
        ohlcv(minute(3), open, open.max(close), open.min(close), close, volume)
    }

    fn run(detector: &mut Breakout, last: Bar) -> BreakoutOutput {
        let mut bars = base();
        bars.push(last);
        detector.replay(&bars).unwrap().pop().flatten().unwrap()
    }

    #[test]
    fn test_levels_need_full_lookback() {
        let mut breakout = detector(true);
        let outputs = breakout.replay(&base()).unwrap();
        assert!(outputs.iter().all(Option::is_none));
    }

    #[test]
    fn test_levels_exclude_current_bar() {
        let out = run(&mut detector(true), probe(dec!(10.9), dec!(100)));
        assert_eq!(out.resistance, dec!(11));
        assert_eq!(out.support, dec!(9));
        assert_eq!(out.direction, None);
        assert_eq!(out.strength, Decimal::ZERO);
    }

    #[test]
    fn test_confirmed_upside_breakout() {
        let out = run(&mut detector(true), probe(dec!(12), dec!(200)));
        assert_eq!(out.direction, Some(BreakoutDirection::Up));
        assert_eq!(out.volume_ratio, Some(dec!(2)));
        assert!(out.confirmed);
        assert_eq!(out.strength, dec!(1));
    }

    #[test]
    fn test_unconfirmed_breakout_scales_strength() {
        let out = run(&mut detector(true), probe(dec!(12), dec!(75)));
        assert_eq!(out.direction, Some(BreakoutDirection::Up));
        assert!(!out.confirmed);
        // distance 1 * 0.5 + (0.75 / 1.5) * 0.5
        assert_eq!(out.strength, dec!(0.75));
    }

    #[test]
    fn test_partial_distance() {
        // level 11.11, band 0.11, excess 0.055
        let out = run(&mut detector(true), probe(dec!(11.165), dec!(150)));
        assert!(out.confirmed);
        assert_eq!(out.strength, dec!(0.75));
    }

    #[test]
    fn test_threshold_must_be_exceeded() {
        let out = run(&mut detector(true), probe(dec!(11.11), dec!(500)));
        assert_eq!(out.direction, None);
    }

    #[test]
    fn test_downside_breakout() {
        let out = run(&mut detector(true), probe(dec!(8.5), dec!(300)));
        assert_eq!(out.direction, Some(BreakoutDirection::Down));
        assert_eq!(out.support, dec!(9));
        assert!(out.confirmed);
    }

    #[test]
    fn test_volume_confirmation_disabled() {
        let out = run(&mut detector(false), probe(dec!(11.165), dec!(1)));
        assert!(!out.confirmed);
        assert_eq!(out.strength, dec!(0.75));
    }

    #[test]
    fn test_zero_volume_window_has_no_ratio() {
        let mut breakout = detector(true);
        let mut bars: Vec<Bar> = base()
            .into_iter()
            .map(|mut b| {
                b.volume = Decimal::ZERO;
                b
            })
            .collect();
        bars.push(probe(dec!(12), dec!(10)));
        let out = breakout.replay(&bars).unwrap().pop().flatten().unwrap();
        assert_eq!(out.volume_ratio, None);
        assert!(!out.confirmed);
        assert_eq!(out.strength, dec!(0.5));
    }

    #[test]
    fn test_reset_behaves_like_fresh() {
        let mut breakout = detector(true);
        breakout.replay(&base()).unwrap();
        breakout.reset();
        assert_eq!(breakout, detector(true));
    }
}
