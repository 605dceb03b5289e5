//! Indicator output records.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single metadata entry attached to a result or signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Numeric component (period used, intermediate averages, band values).
    Number(Decimal),
    /// Boolean state flag.
    Flag(bool),
    /// Categorical state (trend direction, regime, pattern name).
    Label(String),
}

impl From<Decimal> for MetaValue {
    fn from(value: Decimal) -> Self {
        MetaValue::Number(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Flag(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Label(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Label(value)
    }
}

impl From<usize> for MetaValue {
    fn from(value: usize) -> Self {
        MetaValue::Number(Decimal::from(value))
    }
}

/// Free-form metadata keyed by component name.
pub type Metadata = BTreeMap<String, MetaValue>;

/// Output of one calculator for one accepted bar.
///
/// Only produced once the calculator has enough history; a bar without
/// enough history yields no result at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorResult {
    /// Indicator name (e.g. `RSI`, `SUPERTREND`).
    pub name: String,
    /// Timestamp of the bar that produced this value.
    pub timestamp_ns: i64,
    /// Primary output value.
    pub value: Decimal,
    /// False while the value is emitted but not yet stable (EMA warm-up).
    pub valid: bool,
    /// Secondary components for downstream inspection.
    #[serde(default)]
    pub metadata: Metadata,
}

impl IndicatorResult {
    /// Creates a valid result with empty metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, timestamp_ns: i64, value: Decimal) -> Self {
        Self {
            name: name.into(),
            timestamp_ns,
            value,
            valid: true,
            metadata: Metadata::new(),
        }
    }

    /// Sets the validity flag.
    #[must_use]
    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds an entry only when `value` is present.
    #[must_use]
    pub fn with_opt_meta<V: Into<MetaValue>>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(v) => self.with_meta(key, v),
            None => self,
        }
    }

    /// Returns a numeric metadata entry.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<Decimal> {
        match self.metadata.get(key) {
            Some(MetaValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a boolean metadata entry.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetaValue::Flag(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a label metadata entry.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetaValue::Label(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_and_accessors() {
        let result = IndicatorResult::new("RSI", 42, dec!(71.5))
            .with_meta("period", 14usize)
            .with_meta("zone", "overbought")
            .with_meta("ready", true)
            .with_opt_meta("missing", None::<Decimal>);

        assert!(result.valid);
        assert_eq!(result.number("period"), Some(dec!(14)));
        assert_eq!(result.label("zone"), Some("overbought"));
        assert_eq!(result.flag("ready"), Some(true));
        assert!(!result.metadata.contains_key("missing"));
        assert_eq!(result.number("zone"), None);
    }

    #[test]
    fn test_result_serde_roundtrip() {
        let result = IndicatorResult::new("EMA", 7, dec!(10.25))
            .with_valid(false)
            .with_meta("alpha", dec!(0.5));
        let json = serde_json::to_string(&result).unwrap();
        let back: IndicatorResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
