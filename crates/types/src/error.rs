use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons a bar is refused at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarError {
    /// A price field is zero or negative.
    #[error("non-positive {field} price: {value}")]
    NonPositivePrice {
        /// Offending field name (`open`, `high`, `low`, `close`).
        field: &'static str,
        /// Observed value.
        value: Decimal,
    },

    /// A positive price outside `[Bar::MIN_PRICE, Bar::MAX_PRICE]`.
    ///
    /// [`Bar::MIN_PRICE`]: crate::Bar::MIN_PRICE
    /// [`Bar::MAX_PRICE`]: crate::Bar::MAX_PRICE
    #[error("{field} price out of range: {value}")]
    PriceOutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Observed value.
        value: Decimal,
    },

    /// Volume below zero.
    #[error("negative volume: {0}")]
    NegativeVolume(Decimal),

    /// Volume above [`Bar::MAX_VOLUME`](crate::Bar::MAX_VOLUME).
    #[error("volume out of range: {0}")]
    VolumeOutOfRange(Decimal),

    /// The OHLC relationship `low <= min(open, close) <= max(open, close) <= high` is violated.
    #[error("inconsistent OHLC: open={open}, high={high}, low={low}, close={close}")]
    InconsistentOhlc {
        /// Open price.
        open: Decimal,
        /// High price.
        high: Decimal,
        /// Low price.
        low: Decimal,
        /// Close price.
        close: Decimal,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = BarError::NegativeVolume(dec!(-1.5));
        assert_eq!(err.to_string(), "negative volume: -1.5");

        let err = BarError::NonPositivePrice {
            field: "close",
            value: dec!(0),
        };
        assert_eq!(err.to_string(), "non-positive close price: 0");
    }
}
