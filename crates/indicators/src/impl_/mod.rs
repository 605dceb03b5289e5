//! Indicator implementations
//!
//! Contains all concrete calculators. `bollinger` and `keltner` are
//! ungated building blocks used by the composites.

pub mod atr;
pub mod bollinger;
pub mod breakout;
pub mod candle_patterns;
pub mod ema;
pub mod keltner;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod squeeze;
pub mod supertrend;
pub mod volume_profile;
