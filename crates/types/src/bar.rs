use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BarError;
use crate::timeframe::Timeframe;

/// One OHLCV record of a single `(symbol, timeframe)` stream.
///
/// `timestamp_ns` is the bar **open time** in Unix epoch nanoseconds (UTC).
/// Fields are public so producers can build bars directly; every consumer in
/// the engine re-validates through [`Bar::validate`] before using one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Instrument symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Bar interval.
    pub timeframe: Timeframe,
    /// Unix epoch nanoseconds UTC (open time)
    pub timestamp_ns: i64,
    /// Open price
    pub open: Decimal,
    /// High price
    pub high: Decimal,
    /// Low price
    pub low: Decimal,
    /// Close price
    pub close: Decimal,
    /// Traded volume
    pub volume: Decimal,
}

impl Bar {
    /// Smallest accepted price, `1e-10`.
    pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 10);
    /// Largest accepted price, `1e12`.
    ///
    /// Together with [`Bar::MIN_PRICE`] and the period cap on calculators,
    /// this keeps squared prices, window sums and price ratios inside the
    /// `Decimal` range.
    pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);
    /// Largest accepted volume, `1e15`.
    pub const MAX_VOLUME: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

    /// Builds a bar and validates it.
    ///
    /// # Errors
    /// Returns the first [`BarError`] found by [`Bar::validate`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        timestamp_ns: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, BarError> {
        let bar = Self {
            symbol: symbol.into(),
            timeframe,
            timestamp_ns,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Checks the record invariants.
    ///
    /// Prices must be strictly positive and within
    /// `[MIN_PRICE, MAX_PRICE]`, volume within `[0, MAX_VOLUME]`, and
    /// `low <= min(open, close)`, `high >= max(open, close)`.
    ///
    /// # Errors
    /// - [`BarError::NonPositivePrice`] for a zero or negative price.
    /// - [`BarError::PriceOutOfRange`] for a positive price outside the bounds.
    /// - [`BarError::NegativeVolume`] for volume below zero.
    /// - [`BarError::VolumeOutOfRange`] for volume above `MAX_VOLUME`.
    /// - [`BarError::InconsistentOhlc`] when the OHLC relationship is violated.
    pub fn validate(&self) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if value <= Decimal::ZERO {
                return Err(BarError::NonPositivePrice { field, value });
            }
            if value < Self::MIN_PRICE || value > Self::MAX_PRICE {
                return Err(BarError::PriceOutOfRange { field, value });
            }
        }

        if self.volume < Decimal::ZERO {
            return Err(BarError::NegativeVolume(self.volume));
        }
        if self.volume > Self::MAX_VOLUME {
            return Err(BarError::VolumeOutOfRange(self.volume));
        }

        if self.high < self.open.max(self.close)
            || self.low > self.open.min(self.close)
            || self.low > self.high
        {
            return Err(BarError::InconsistentOhlc {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        Ok(())
    }

    /// `(high + low + close) / 3`
    #[must_use]
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    /// `(high + low) / 2`
    #[must_use]
    pub fn median_price(&self) -> Decimal {
        (self.high + self.low) / Decimal::TWO
    }

    /// `high - low`
    #[must_use]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Absolute distance between open and close.
    #[must_use]
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// Distance from the top of the body to the high.
    #[must_use]
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    /// Distance from the bottom of the body to the low.
    #[must_use]
    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[must_use]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
