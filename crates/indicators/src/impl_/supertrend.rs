//! SuperTrend
//!
//! Bands of `hl2 ± multiplier * ATR` that only tighten while the trend they
//! support holds:
//!
//! - in an uptrend the lower band never falls;
//! - in a downtrend the upper band never rises.
//!
//! The trend flips when the close crosses the supporting band, and the
//! SuperTrend value switches to the band of the new trend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::{require_multiplier, require_period};
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::impl_::atr::{AtrMode, TrueRangeAverage};
use crate::traits::{Indicator, ToIndicatorResult};

/// SuperTrend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperTrendConfig {
    pub atr_period: usize,
    pub multiplier: Decimal,
    pub atr_mode: AtrMode,
}

impl Default for SuperTrendConfig {
    fn default() -> Self {
        Self {
            atr_period: 10,
            multiplier: Decimal::from(3),
            atr_mode: AtrMode::Wilder,
        }
    }
}

impl SuperTrendConfig {
    /// # Errors
    /// Zero ATR period or a multiplier outside `(0, 100]`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("SuperTrend atr_period", self.atr_period)?;
        require_multiplier("SuperTrend multiplier", self.multiplier)
    }
}

/// Trend direction tracked by SuperTrend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
        }
    }
}

/// SuperTrend output for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperTrendOutput {
    /// Lower band in an uptrend, upper band in a downtrend.
    pub value: Decimal,
    pub upper: Decimal,
    pub lower: Decimal,
    pub trend: Trend,
    /// True on the bar the trend changed.
    pub flipped: bool,
    pub atr: Decimal,
    /// Close of the bar.
    pub close: Decimal,
}

impl ToIndicatorResult for SuperTrendOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        IndicatorResult::new(name, timestamp_ns, self.value)
            .with_meta("upper", self.upper)
            .with_meta("lower", self.lower)
            .with_meta("trend", self.trend.as_str())
            .with_meta("flipped", self.flipped)
            .with_meta("atr", self.atr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BandState {
    upper: Decimal,
    lower: Decimal,
    trend: Trend,
    close: Decimal,
}

/// SuperTrend
#[derive(Debug, Clone, PartialEq)]
pub struct SuperTrend {
    config: SuperTrendConfig,
    gate: BarGate,
    atr: TrueRangeAverage,
    state: Option<BandState>,
    last: Option<SuperTrendOutput>,
}

impl SuperTrend {
    /// Creates a new SuperTrend.
    ///
    /// # Errors
    /// See [`SuperTrendConfig::validate`].
    pub fn new(config: SuperTrendConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            atr: TrueRangeAverage::new(config.atr_period, config.atr_mode),
            config,
            gate: BarGate::new(),
            state: None,
            last: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SuperTrendConfig {
        &self.config
    }

    /// Current trend, once the first ATR is available.
    #[must_use]
    pub fn trend(&self) -> Option<Trend> {
        self.state.as_ref().map(|s| s.trend)
    }

    fn next_state(&self, bar: &Bar, atr: Decimal) -> (BandState, bool) {
        let hl2 = bar.median_price();
        let width = self.config.multiplier * atr;
        let basic_upper = hl2 + width;
        let basic_lower = hl2 - width;

        let Some(prev) = &self.state else {
            let trend = if bar.close < basic_lower {
                Trend::Down
            } else {
                Trend::Up
            };
            let state = BandState {
                upper: basic_upper,
                lower: basic_lower,
                trend,
                close: bar.close,
            };
            return (state, false);
        };

        // The band supporting the current trend only tightens. The other band
        // resets to the basic band once the previous close crossed it.
        let lower = match prev.trend {
            Trend::Up => basic_lower.max(prev.lower),
            Trend::Down if prev.close < prev.lower => basic_lower,
            Trend::Down => basic_lower.max(prev.lower),
        };
        let upper = match prev.trend {
            Trend::Down => basic_upper.min(prev.upper),
            Trend::Up if prev.close > prev.upper => basic_upper,
            Trend::Up => basic_upper.min(prev.upper),
        };

        let trend = match prev.trend {
            Trend::Up if bar.close < lower => Trend::Down,
            Trend::Down if bar.close > upper => Trend::Up,
            unchanged => unchanged,
        };
        let flipped = trend != prev.trend;
        let state = BandState {
            upper,
            lower,
            trend,
            close: bar.close,
        };
        (state, flipped)
    }
}

impl Indicator for SuperTrend {
    type Output = SuperTrendOutput;

    fn name(&self) -> &'static str {
        "SuperTrend"
    }

    fn warmup_periods(&self) -> usize {
        self.config.atr_period
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        let Some(atr) = self.atr.push(bar) else {
            return Ok(None);
        };
        let (state, flipped) = self.next_state(bar, atr);
        if self.state.is_none() {
            tracing::trace!(trend = state.trend.as_str(), "SuperTrend ready");
        }

        let value = match state.trend {
            Trend::Up => state.lower,
            Trend::Down => state.upper,
        };
        let output = SuperTrendOutput {
            value,
            upper: state.upper,
            lower: state.lower,
            trend: state.trend,
            flipped,
            atr,
            close: bar.close,
        };
        self.state = Some(state);
        self.last = Some(output.clone());
        Ok(Some(output))
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "SuperTrend", "reset");
        self.gate.reset();
        self.atr.reset();
        self.state = None;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{minute, ohlc, ranged};
    use rust_decimal_macros::dec;

    fn supertrend(multiplier: Decimal) -> SuperTrend {
        SuperTrend::new(SuperTrendConfig {
            atr_period: 1,
            multiplier,
            atr_mode: AtrMode::Sma,
        })
        .unwrap()
    }

    fn flip_scenario() -> Vec<Bar> {
        vec![
            ohlc(minute(0), dec!(10), dec!(11), dec!(9), dec!(10)),
            ohlc(minute(1), dec!(10), dec!(12), dec!(10), dec!(11)),
            ohlc(minute(2), dec!(11), dec!(13), dec!(11), dec!(12)),
            ohlc(minute(3), dec!(12), dec!(12), dec!(8), dec!(8.5)),
            ohlc(minute(4), dec!(8.5), dec!(9), dec!(7), dec!(7.5)),
            ohlc(minute(5), dec!(7.5), dec!(11), dec!(7.5), dec!(10.5)),
        ]
    }

    #[test]
    fn test_uptrend_lower_band_ratchets() {
        let mut st = supertrend(dec!(1));
        let outputs: Vec<SuperTrendOutput> = st
            .replay(&flip_scenario()[..3])
            .unwrap()
            .into_iter()
            .map(Option::unwrap)
            .collect();

        let lowers: Vec<Decimal> = outputs.iter().map(|o| o.lower).collect();
        assert_eq!(lowers, vec![dec!(8), dec!(9), dec!(10)]);
        assert!(outputs.iter().all(|o| o.trend == Trend::Up && !o.flipped));
        assert_eq!(outputs[2].value, dec!(10));
        // upper stays at the tightest level while price stays below it
        assert_eq!(outputs[2].upper, dec!(12));
    }

    #[test]
    fn test_flip_down_and_back_up() {
        let mut st = supertrend(dec!(1));
        let outputs: Vec<SuperTrendOutput> = st
            .replay(&flip_scenario())
            .unwrap()
            .into_iter()
            .map(Option::unwrap)
            .collect();

        // Bar 3 closes at 8.5 below the ratcheted lower band of 10.
        let crash = &outputs[3];
        assert_eq!(crash.lower, dec!(10));
        assert_eq!(crash.trend, Trend::Down);
        assert!(crash.flipped);
        assert_eq!(crash.value, dec!(12));

        // Down: upper tightens to the basic band, the lower band resets.
        let follow = &outputs[4];
        assert!(!follow.flipped);
        assert_eq!(follow.upper, dec!(10));
        assert_eq!(follow.lower, dec!(6));
        assert_eq!(follow.value, dec!(10));

        // Close 10.5 above the upper band of 10 flips back up.
        let recovery = &outputs[5];
        assert_eq!(recovery.trend, Trend::Up);
        assert!(recovery.flipped);
        assert_eq!(recovery.value, dec!(6));
    }

    #[test]
    fn test_initial_trend_down_when_close_below_basic_lower() {
        let mut st = supertrend(dec!(0.1));
        let first = st
            .update(&ohlc(0, dec!(11), dec!(11), dec!(9), dec!(9)))
            .unwrap()
            .unwrap();
        assert_eq!(first.trend, Trend::Down);
        assert!(!first.flipped);
        assert_eq!(first.value, first.upper);
    }

    #[test]
    fn test_no_output_before_atr() {
        let mut st = SuperTrend::new(SuperTrendConfig::default()).unwrap();
        let closes: Vec<Decimal> = (0..9).map(|i| Decimal::from(100 + i)).collect();
        let outputs = st.replay(&ranged(&closes, dec!(1))).unwrap();
        assert!(outputs.iter().all(Option::is_none));
        assert_eq!(st.trend(), None);
    }

    #[test]
    fn test_multiplier_validation() {
        let config = SuperTrendConfig {
            multiplier: dec!(0),
            ..SuperTrendConfig::default()
        };
        assert!(matches!(
            SuperTrend::new(config),
            Err(IndicatorError::ParamOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejected_bar_leaves_state_unchanged() {
        let mut st = supertrend(dec!(1));
        st.replay(&flip_scenario()[..3]).unwrap();
        let before = st.clone();

        let mut foreign = flip_scenario()[3].clone();
        foreign.symbol = "OTHER".to_string();
        assert!(matches!(
            st.update(&foreign),
            Err(IndicatorError::StreamMismatch { .. })
        ));
        assert_eq!(st, before);
    }

    #[test]
    fn test_reset_behaves_like_fresh() {
        let mut st = supertrend(dec!(1));
        let first_pass = st.replay(&flip_scenario()).unwrap();
        st.reset();
        assert_eq!(st, supertrend(dec!(1)));
        assert_eq!(st.replay(&flip_scenario()).unwrap(), first_pass);
    }
}
