//! THEBOT Indicators
//!
//! Incremental technical-indicator engine for the THEBOT trading system.
//! Calculators consume one OHLCV bar at a time, keep their own rolling
//! state, and emit typed outputs plus optional trading signals.
//!
//! # Features
//! - Streaming [`Indicator`] trait with a validating ingestion gate
//! - Closed [`IndicatorConfig`] / [`Calculator`] sets built by an explicit
//!   [`IndicatorFactory`]
//! - Per-stream [`IndicatorSet`] and multi-stream [`IndicatorHub`]
//! - Pure signal rules over previous and current outputs
//!
//! # Available Indicators
//! - SMA / EMA: moving averages with close crossovers
//! - RSI: Wilder RSI with zones and divergence
//! - ATR: true-range average with percentile rank and volatility regime
//! - MACD: line, signal line and histogram
//! - SuperTrend: ATR bands with ratcheting trend line
//! - Squeeze: Bollinger inside Keltner, with linear-regression momentum
//! - Breakout: support/resistance breaks with volume confirmation
//! - OBV: on-balance volume with EMA signal line
//! - Candle patterns: doji, hammer, shooting star, engulfing
//! - Volume profile: point of control and value area

pub mod config;
pub mod error;
pub mod factory;
pub mod gate;
pub mod hub;
pub mod impl_;
pub mod math;
pub mod set;
pub mod signals;
pub mod smoothing;
pub mod traits;
pub mod window;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use config::{EngineConfig, IndicatorConfig, IndicatorKind};
pub use error::IndicatorError;
pub use factory::{Calculator, IndicatorFactory};
pub use gate::BarGate;
pub use hub::IndicatorHub;
pub use set::{IndicatorSet, IndicatorUpdate};
pub use signals::SignalConfig;
pub use traits::{Indicator, ToIndicatorResult};

// Re-export indicator implementations
pub use impl_::{
    atr::{Atr, AtrConfig, AtrMode, AtrOutput, TrueRangeAverage, VolatilityRegime},
    bollinger::{BollingerBands, BollingerOutput},
    breakout::{Breakout, BreakoutConfig, BreakoutDirection, BreakoutOutput},
    candle_patterns::{CandlePattern, CandlePatternConfig, CandlePatternOutput, CandlePatterns},
    ema::{Ema, EmaConfig},
    keltner::{KeltnerChannels, KeltnerOutput},
    macd::{Macd, MacdConfig, MacdOutput},
    obv::{Obv, ObvConfig, ObvOutput},
    rsi::{Divergence, Rsi, RsiConfig, RsiOutput, RsiPhase, RsiZone},
    sma::{MovingAverageOutput, Sma, SmaConfig},
    squeeze::{Squeeze, SqueezeConfig, SqueezeOutput},
    supertrend::{SuperTrend, SuperTrendConfig, SuperTrendOutput, Trend},
    volume_profile::{VolumeProfile, VolumeProfileConfig, VolumeProfileOutput},
};
