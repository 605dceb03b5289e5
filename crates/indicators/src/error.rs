//! Indicator error types.

use rust_decimal::Decimal;
use thebot_types::{BarError, Timeframe};
use thiserror::Error;

/// Errors raised by calculators, configs and the factory.
///
/// Not having enough history is never an error; calculators return
/// `Ok(None)` for that.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    /// The bar violates its own invariants.
    #[error("invalid bar: {0}")]
    InvalidBar(#[from] BarError),

    /// The bar is older than the last accepted bar of the stream.
    #[error("out-of-order bar: timestamp {received_ns} < last accepted {previous_ns}")]
    OutOfOrder {
        /// Timestamp of the last accepted bar.
        previous_ns: i64,
        /// Timestamp of the rejected bar.
        received_ns: i64,
    },

    /// The bar belongs to a different `(symbol, timeframe)` stream.
    #[error("stream mismatch: calculator bound to {expected}, got {received}")]
    StreamMismatch {
        /// Stream the calculator is bound to.
        expected: String,
        /// Stream of the rejected bar.
        received: String,
    },

    /// Invalid parameters for the indicator
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Parameter out of valid range
    #[error("parameter out of range: {param} = {value} (valid: {min}..={max})")]
    ParamOutOfRange {
        /// Parameter name.
        param: String,
        /// Parameter value.
        value: Decimal,
        /// Minimum allowed value.
        min: Decimal,
        /// Maximum allowed value.
        max: Decimal,
    },

    /// Engine configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl IndicatorError {
    /// Creates an `InvalidParams` error with a message.
    #[must_use]
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        IndicatorError::InvalidParams(msg.into())
    }

    /// Creates a `ParamOutOfRange` error.
    #[must_use]
    pub fn param_out_of_range(
        param: impl Into<String>,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    ) -> Self {
        IndicatorError::ParamOutOfRange {
            param: param.into(),
            value,
            min,
            max,
        }
    }

    /// Creates a `StreamMismatch` error from the two stream keys.
    #[must_use]
    pub fn stream_mismatch(
        expected: (&str, Timeframe),
        received: (&str, Timeframe),
    ) -> Self {
        IndicatorError::StreamMismatch {
            expected: format!("{}@{}", expected.0, expected.1),
            received: format!("{}@{}", received.0, received.1),
        }
    }

    /// True for errors caused by the bar itself rather than configuration.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IndicatorError::InvalidBar(_)
                | IndicatorError::OutOfOrder { .. }
                | IndicatorError::StreamMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for IndicatorError {
    fn from(err: serde_json::Error) -> Self {
        IndicatorError::Config(err.to_string())
    }
}
