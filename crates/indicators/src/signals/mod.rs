//! Signal layer.
//!
//! Each rule is a pure function of the previous and current typed output of
//! one calculator, the bar that produced the current output, and the
//! thresholds in [`SignalConfig`]. A rule returns at most one [`Signal`]
//! per bar and never touches calculator state.
//!
//! [`Signal`]: thebot_types::Signal

mod events;
mod oscillator;
mod trend;

pub use events::{breakout_signal, pattern_signal, squeeze_signal};
pub use oscillator::rsi_signal;
pub use trend::{ma_cross_signal, macd_signal, obv_signal, supertrend_signal};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{require_period, require_range};
use crate::error::IndicatorError;

/// Thresholds and weights used by the signal rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Signals weaker than this are dropped.
    pub min_strength: Decimal,
    /// Strength of an RSI divergence signal.
    pub divergence_strength: Decimal,
    /// Strength added per percent of distance between close and average.
    pub ma_distance_weight: Decimal,
    /// Strength added per ATR of distance between close and SuperTrend.
    pub supertrend_atr_weight: Decimal,
    /// Strength of a squeeze release before length is accounted for.
    pub squeeze_base: Decimal,
    /// Squeeze length, in bars, that adds a full unit of strength.
    pub squeeze_full_length: usize,
    pub pattern_base: Decimal,
    /// Strength added per unit of net pattern bias.
    pub pattern_weight: Decimal,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_strength: Decimal::ZERO,
            divergence_strength: Decimal::new(6, 1),
            ma_distance_weight: Decimal::new(1, 1),
            supertrend_atr_weight: Decimal::new(25, 2),
            squeeze_base: Decimal::new(4, 1),
            squeeze_full_length: 20,
            pattern_base: Decimal::new(3, 1),
            pattern_weight: Decimal::new(3, 1),
        }
    }
}

impl SignalConfig {
    /// # Errors
    /// The first threshold or weight outside its range.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let unit = |param: &str, value: Decimal| {
            require_range(param, value, Decimal::ZERO, Decimal::ONE)
        };
        let weight = |param: &str, value: Decimal| {
            require_range(param, value, Decimal::ZERO, Decimal::ONE_HUNDRED)
        };

        unit("signals min_strength", self.min_strength)?;
        unit("signals divergence_strength", self.divergence_strength)?;
        weight("signals ma_distance_weight", self.ma_distance_weight)?;
        weight("signals supertrend_atr_weight", self.supertrend_atr_weight)?;
        unit("signals squeeze_base", self.squeeze_base)?;
        require_period("signals squeeze_full_length", self.squeeze_full_length)?;
        unit("signals pattern_base", self.pattern_base)?;
        weight("signals pattern_weight", self.pattern_weight)
    }

    /// Drops `signal` when it is weaker than [`SignalConfig::min_strength`].
    #[must_use]
    pub fn admit(&self, signal: Option<thebot_types::Signal>) -> Option<thebot_types::Signal> {
        signal.filter(|s| s.strength >= self.min_strength)
    }
}
