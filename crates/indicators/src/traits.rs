//! Indicator traits.
//!
//! Defines the streaming contract shared by every calculator.

use thebot_types::{Bar, IndicatorResult};

use crate::error::IndicatorError;

/// Conversion of a typed calculator output into the uniform result record.
pub trait ToIndicatorResult {
    /// Builds the result for the bar at `timestamp_ns`.
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult;
}

/// Streaming indicator consuming one bar at a time.
///
/// Implementations validate each bar at the ingestion boundary before any
/// state changes: an `Err` from [`Indicator::update`] leaves the calculator
/// exactly as it was. `Ok(None)` means "not enough history yet" and must not
/// be read as zero.
///
/// Calculators are `Send` so a caller may move a per-symbol set into its own
/// task, but no calculator is meant to be shared between streams.
pub trait Indicator: Send {
    /// Typed output produced once per accepted bar after warm-up.
    type Output: Clone + PartialEq + std::fmt::Debug + ToIndicatorResult;

    /// Name of the indicator (e.g., "EMA", "ATR").
    fn name(&self) -> &'static str;

    /// Number of bars after which every output is valid.
    fn warmup_periods(&self) -> usize;

    /// Consumes one bar.
    ///
    /// # Errors
    /// Returns a validation error for a malformed, out-of-order or foreign
    /// bar; the calculator state is left untouched in that case.
    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError>;

    /// Output produced by the most recent accepted bar that produced one.
    fn last(&self) -> Option<&Self::Output>;

    /// Clears all state; the next update behaves like on a fresh instance.
    fn reset(&mut self);

    /// Consumes one bar and converts the output into an [`IndicatorResult`].
    ///
    /// # Errors
    /// Same as [`Indicator::update`].
    fn update_result(&mut self, bar: &Bar) -> Result<Option<IndicatorResult>, IndicatorError> {
        let output = self.update(bar)?;
        Ok(output.map(|o| o.to_result(self.name(), bar.timestamp_ns)))
    }

    /// Feeds a history of bars in order, returning one entry per bar.
    ///
    /// Entries before warm-up are `None`. Stops at the first rejected bar.
    ///
    /// # Errors
    /// The first validation error encountered.
    fn replay(&mut self, bars: &[Bar]) -> Result<Vec<Option<Self::Output>>, IndicatorError> {
        let mut outputs = Vec::with_capacity(bars.len());
        for bar in bars {
            outputs.push(self.update(bar)?);
        }
        Ok(outputs)
    }
}
