//! THEBOT Types
//!
//! Shared data model for the THEBOT indicator engine.
//! This crate provides the OHLCV bar record and its validation rules,
//! timeframes, indicator results and trading signals.

#![deny(clippy::all)]

pub mod bar;
pub mod error;
pub mod result;
pub mod signal;
pub mod timeframe;

// Re-export main types for convenience
pub use bar::Bar;
pub use error::BarError;
pub use result::{IndicatorResult, MetaValue, Metadata};
pub use signal::{Signal, SignalDirection, SignalTrigger};
pub use timeframe::{ParseTimeframeError, Timeframe};
