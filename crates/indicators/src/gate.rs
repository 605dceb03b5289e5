//! Ingestion boundary shared by every calculator.
//!
//! A bar passes the gate only when it is internally consistent, not older
//! than the last accepted bar, and belongs to the stream the calculator was
//! bound to by its first bar. The gate is checked before any calculator
//! state is touched, so a rejected bar never leaves partial updates behind.

use thebot_types::{Bar, Timeframe};

use crate::error::IndicatorError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StreamBinding {
    symbol: String,
    timeframe: Timeframe,
    last_timestamp_ns: i64,
}

/// Validation and ordering guard for one bar stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarGate {
    binding: Option<StreamBinding>,
}

impl BarGate {
    /// Creates an unbound gate.
    #[must_use]
    pub fn new() -> Self {
        Self { binding: None }
    }

    /// Checks `bar` without recording it.
    ///
    /// # Errors
    /// - [`IndicatorError::InvalidBar`] for a malformed record.
    /// - [`IndicatorError::StreamMismatch`] for a bar of another stream.
    /// - [`IndicatorError::OutOfOrder`] for a timestamp older than the last accepted one.
    pub fn check(&self, bar: &Bar) -> Result<(), IndicatorError> {
        bar.validate()?;

        if let Some(binding) = &self.binding {
            if binding.symbol != bar.symbol || binding.timeframe != bar.timeframe {
                return Err(IndicatorError::stream_mismatch(
                    (&binding.symbol, binding.timeframe),
                    (&bar.symbol, bar.timeframe),
                ));
            }
            if bar.timestamp_ns < binding.last_timestamp_ns {
                return Err(IndicatorError::OutOfOrder {
                    previous_ns: binding.last_timestamp_ns,
                    received_ns: bar.timestamp_ns,
                });
            }
        }

        Ok(())
    }

    /// Checks `bar` and, on success, records it as the last accepted bar.
    ///
    /// # Errors
    /// Same as [`BarGate::check`]; nothing is recorded on error.
    pub fn admit(&mut self, bar: &Bar) -> Result<(), IndicatorError> {
        self.check(bar)?;
        match &mut self.binding {
            Some(binding) => binding.last_timestamp_ns = bar.timestamp_ns,
            None => {
                self.binding = Some(StreamBinding {
                    symbol: bar.symbol.clone(),
                    timeframe: bar.timeframe,
                    last_timestamp_ns: bar.timestamp_ns,
                });
            }
        }
        Ok(())
    }

    /// Timestamp of the last accepted bar.
    #[must_use]
    pub fn last_timestamp_ns(&self) -> Option<i64> {
        self.binding.as_ref().map(|b| b.last_timestamp_ns)
    }

    /// Stream this gate is bound to, if any bar was accepted.
    #[must_use]
    pub fn stream(&self) -> Option<(&str, Timeframe)> {
        self.binding
            .as_ref()
            .map(|b| (b.symbol.as_str(), b.timeframe))
    }

    /// Forgets the stream binding.
    pub fn reset(&mut self) {
        self.binding = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bar, ohlc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_bar_binds_stream() {
        let mut gate = BarGate::new();
        assert_eq!(gate.stream(), None);
        gate.admit(&bar(0, dec!(10))).unwrap();
        assert_eq!(gate.stream(), Some(("TEST", Timeframe::M1)));
        assert_eq!(gate.last_timestamp_ns(), Some(0));
    }

    #[test]
    fn test_equal_timestamps_are_accepted() {
        let mut gate = BarGate::new();
        gate.admit(&bar(5, dec!(10))).unwrap();
        gate.admit(&bar(5, dec!(11))).unwrap();
    }

    #[test]
    fn test_older_bar_is_rejected_without_recording() {
        let mut gate = BarGate::new();
        gate.admit(&bar(10, dec!(10))).unwrap();
        let before = gate.clone();

        let err = gate.admit(&bar(9, dec!(10))).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::OutOfOrder {
                previous_ns: 10,
                received_ns: 9
            }
        );
        assert_eq!(gate, before);
    }

    #[test]
    fn test_other_stream_is_rejected() {
        let mut gate = BarGate::new();
        gate.admit(&bar(0, dec!(10))).unwrap();

        let mut other = bar(1, dec!(10));
        other.symbol = "OTHER".to_string();
        assert!(matches!(
            gate.admit(&other),
            Err(IndicatorError::StreamMismatch { .. })
        ));

        let mut other_tf = bar(1, dec!(10));
        other_tf.timeframe = Timeframe::H1;
        assert!(matches!(
            gate.admit(&other_tf),
            Err(IndicatorError::StreamMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_bar_is_rejected() {
        let gate = BarGate::new();
        let bad = ohlc(0, dec!(10), dec!(9), dec!(11), dec!(10));
        assert!(matches!(
            gate.check(&bad),
            Err(IndicatorError::InvalidBar(_))
        ));
    }

    #[test]
    fn test_reset_unbinds() {
        let mut gate = BarGate::new();
        gate.admit(&bar(100, dec!(10))).unwrap();
        gate.reset();
        assert_eq!(gate, BarGate::new());
        gate.admit(&bar(1, dec!(10))).unwrap();
    }
}
