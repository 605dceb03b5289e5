//! Typed engine configuration.
//!
//! Every calculator has its own `*Config` struct (next to the calculator);
//! [`IndicatorConfig`] is the closed set of kinds the factory can build.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;
use crate::impl_::atr::AtrConfig;
use crate::impl_::breakout::BreakoutConfig;
use crate::impl_::candle_patterns::CandlePatternConfig;
use crate::impl_::ema::EmaConfig;
use crate::impl_::macd::MacdConfig;
use crate::impl_::obv::ObvConfig;
use crate::impl_::rsi::RsiConfig;
use crate::impl_::sma::SmaConfig;
use crate::impl_::squeeze::SqueezeConfig;
use crate::impl_::supertrend::SuperTrendConfig;
use crate::impl_::volume_profile::VolumeProfileConfig;
use crate::signals::SignalConfig;

/// Indicator kinds known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    Atr,
    Macd,
    SuperTrend,
    Squeeze,
    Breakout,
    Obv,
    CandlePatterns,
    VolumeProfile,
}

/// Configuration of one calculator, tagged by kind.
///
/// ```json
/// { "kind": "rsi", "period": 14, "overbought": "70", "oversold": "30" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorConfig {
    Sma(SmaConfig),
    Ema(EmaConfig),
    Rsi(RsiConfig),
    Atr(AtrConfig),
    Macd(MacdConfig),
    SuperTrend(SuperTrendConfig),
    Squeeze(SqueezeConfig),
    Breakout(BreakoutConfig),
    Obv(ObvConfig),
    CandlePatterns(CandlePatternConfig),
    VolumeProfile(VolumeProfileConfig),
}

impl IndicatorConfig {
    /// Kind of calculator this config builds.
    #[must_use]
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorConfig::Sma(_) => IndicatorKind::Sma,
            IndicatorConfig::Ema(_) => IndicatorKind::Ema,
            IndicatorConfig::Rsi(_) => IndicatorKind::Rsi,
            IndicatorConfig::Atr(_) => IndicatorKind::Atr,
            IndicatorConfig::Macd(_) => IndicatorKind::Macd,
            IndicatorConfig::SuperTrend(_) => IndicatorKind::SuperTrend,
            IndicatorConfig::Squeeze(_) => IndicatorKind::Squeeze,
            IndicatorConfig::Breakout(_) => IndicatorKind::Breakout,
            IndicatorConfig::Obv(_) => IndicatorKind::Obv,
            IndicatorConfig::CandlePatterns(_) => IndicatorKind::CandlePatterns,
            IndicatorConfig::VolumeProfile(_) => IndicatorKind::VolumeProfile,
        }
    }

    /// Validates the wrapped config.
    ///
    /// # Errors
    /// The first invalid parameter found.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        match self {
            IndicatorConfig::Sma(c) => c.validate(),
            IndicatorConfig::Ema(c) => c.validate(),
            IndicatorConfig::Rsi(c) => c.validate(),
            IndicatorConfig::Atr(c) => c.validate(),
            IndicatorConfig::Macd(c) => c.validate(),
            IndicatorConfig::SuperTrend(c) => c.validate(),
            IndicatorConfig::Squeeze(c) => c.validate(),
            IndicatorConfig::Breakout(c) => c.validate(),
            IndicatorConfig::Obv(c) => c.validate(),
            IndicatorConfig::CandlePatterns(c) => c.validate(),
            IndicatorConfig::VolumeProfile(c) => c.validate(),
        }
    }
}

/// Full engine configuration: which calculators run per stream and how
/// their signals are thresholded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Calculators instantiated for every stream.
    #[serde(default = "default_indicators")]
    pub indicators: Vec<IndicatorConfig>,
    /// Signal thresholds.
    #[serde(default)]
    pub signals: SignalConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicators: default_indicators(),
            signals: SignalConfig::default(),
        }
    }
}

fn default_indicators() -> Vec<IndicatorConfig> {
    vec![
        IndicatorConfig::Sma(SmaConfig::default()),
        IndicatorConfig::Ema(EmaConfig::default()),
        IndicatorConfig::Rsi(RsiConfig::default()),
        IndicatorConfig::Atr(AtrConfig::default()),
        IndicatorConfig::Macd(MacdConfig::default()),
        IndicatorConfig::SuperTrend(SuperTrendConfig::default()),
        IndicatorConfig::Squeeze(SqueezeConfig::default()),
        IndicatorConfig::Breakout(BreakoutConfig::default()),
        IndicatorConfig::Obv(ObvConfig::default()),
        IndicatorConfig::CandlePatterns(CandlePatternConfig::default()),
        IndicatorConfig::VolumeProfile(VolumeProfileConfig::default()),
    ]
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// [`IndicatorError::Config`] for malformed JSON, or the first
    /// validation error of the parsed config.
    pub fn from_json_str(json: &str) -> Result<Self, IndicatorError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every calculator config and the signal thresholds.
    ///
    /// # Errors
    /// The first invalid parameter found.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.indicators.is_empty() {
            return Err(IndicatorError::invalid_params(
                "engine config must list at least one indicator",
            ));
        }
        for indicator in &self.indicators {
            indicator.validate()?;
        }
        self.signals.validate()
    }
}

/// Longest accepted look-back.
///
/// Window sums of squared prices stay inside the `Decimal` range for bars
/// within [`Bar::MAX_PRICE`](thebot_types::Bar::MAX_PRICE).
pub const MAX_PERIOD: usize = 10_000;

/// Requires `0 < value <= MAX_PERIOD`.
///
/// # Errors
/// [`IndicatorError::InvalidParams`] otherwise.
pub fn require_period(param: &str, value: usize) -> Result<(), IndicatorError> {
    if value == 0 {
        return Err(IndicatorError::invalid_params(format!(
            "{param} must be > 0"
        )));
    }
    if value > MAX_PERIOD {
        return Err(IndicatorError::invalid_params(format!(
            "{param} must be <= {MAX_PERIOD}, got {value}"
        )));
    }
    Ok(())
}

/// Requires `min <= value <= max`.
///
/// # Errors
/// [`IndicatorError::ParamOutOfRange`] otherwise.
pub fn require_range(
    param: &str,
    value: Decimal,
    min: Decimal,
    max: Decimal,
) -> Result<(), IndicatorError> {
    if value < min || value > max {
        return Err(IndicatorError::param_out_of_range(param, value, min, max));
    }
    Ok(())
}

/// Requires `0 < value <= 100`, the accepted range for band multipliers.
///
/// # Errors
/// [`IndicatorError::ParamOutOfRange`] otherwise.
pub fn require_multiplier(param: &str, value: Decimal) -> Result<(), IndicatorError> {
    if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(IndicatorError::param_out_of_range(
            param,
            value,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        ));
    }
    Ok(())
}
