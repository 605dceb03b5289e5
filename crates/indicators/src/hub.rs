//! Per-stream indicator sets keyed by `(symbol, timeframe)`.

use std::collections::HashMap;

use thebot_types::{Bar, Timeframe};

use crate::config::EngineConfig;
use crate::error::IndicatorError;
use crate::factory::IndicatorFactory;
use crate::set::{IndicatorSet, IndicatorUpdate};

type StreamKey = (String, Timeframe);

/// Routes bars to the indicator set of their stream.
///
/// Sets are opened on the first accepted bar of a stream, built from one
/// shared [`EngineConfig`]. Streams never share state.
#[derive(Debug)]
pub struct IndicatorHub {
    factory: IndicatorFactory,
    config: EngineConfig,
    sets: HashMap<StreamKey, IndicatorSet>,
}

impl IndicatorHub {
    /// Creates an empty hub.
    ///
    /// # Errors
    /// The first validation error of `config`, or a kind the factory does
    /// not build.
    pub fn new(factory: IndicatorFactory, config: EngineConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        if let Some(disabled) = config
            .indicators
            .iter()
            .map(|c| c.kind())
            .find(|kind| !factory.contains(*kind))
        {
            return Err(IndicatorError::invalid_params(format!(
                "indicator kind {disabled:?} is not enabled"
            )));
        }
        Ok(Self {
            factory,
            config,
            sets: HashMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Feeds `bar` to the set of its stream, opening the stream if needed.
    ///
    /// A stream whose first bar is rejected is not opened.
    ///
    /// # Errors
    /// The set's validation error for the bar.
    pub fn ingest(&mut self, bar: &Bar) -> Result<Vec<IndicatorUpdate>, IndicatorError> {
        let key = (bar.symbol.clone(), bar.timeframe);
        if let Some(set) = self.sets.get_mut(&key) {
            return set.update(bar);
        }

        let mut set =
            IndicatorSet::from_config(bar.symbol.clone(), bar.timeframe, &self.config, &self.factory)?;
        let updates = set.update(bar)?;
        tracing::info!(
            symbol = %bar.symbol,
            timeframe = %bar.timeframe,
            calculators = set.calculators().len(),
            "stream opened"
        );
        self.sets.insert(key, set);
        Ok(updates)
    }

    #[must_use]
    pub fn get(&self, symbol: &str, timeframe: Timeframe) -> Option<&IndicatorSet> {
        self.sets.get(&(symbol.to_string(), timeframe))
    }

    /// Closes a stream and hands its set back.
    pub fn remove(&mut self, symbol: &str, timeframe: Timeframe) -> Option<IndicatorSet> {
        self.sets.remove(&(symbol.to_string(), timeframe))
    }

    /// Open streams, sorted by symbol then timeframe.
    #[must_use]
    pub fn streams(&self) -> Vec<(&str, Timeframe)> {
        let mut streams: Vec<(&str, Timeframe)> = self
            .sets
            .keys()
            .map(|(symbol, timeframe)| (symbol.as_str(), *timeframe))
            .collect();
        streams.sort_unstable();
        streams
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Resets every open set; streams stay open.
    pub fn reset_all(&mut self) {
        for set in self.sets.values_mut() {
            set.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndicatorConfig, IndicatorKind};
    use crate::impl_::ema::EmaConfig;
    use crate::impl_::sma::SmaConfig;
    use crate::signals::SignalConfig;
    use crate::test_support::{bar, ohlc};
    use rust_decimal_macros::dec;

    fn sma_hub() -> IndicatorHub {
        let config = EngineConfig {
            indicators: vec![IndicatorConfig::Sma(SmaConfig { period: 2 })],
            signals: SignalConfig::default(),
        };
        IndicatorHub::new(IndicatorFactory::new(), config).unwrap()
    }

    fn on(symbol: &str, timeframe: Timeframe, timestamp_ns: i64, close: rust_decimal::Decimal) -> Bar {
        let mut b = bar(timestamp_ns, close);
        b.symbol = symbol.to_string();
        b.timeframe = timeframe;
        b
    }

    #[test]
    fn test_streams_are_independent() {
        let mut hub = sma_hub();
        hub.ingest(&on("BTC", Timeframe::H1, 0, dec!(10))).unwrap();
        hub.ingest(&on("ETH", Timeframe::H1, 0, dec!(100))).unwrap();
        let btc = hub.ingest(&on("BTC", Timeframe::H1, 1, dec!(20))).unwrap();
        let eth = hub.ingest(&on("ETH", Timeframe::H1, 1, dec!(200))).unwrap();

        assert_eq!(btc[0].result.as_ref().unwrap().value, dec!(15));
        assert_eq!(eth[0].result.as_ref().unwrap().value, dec!(150));
        assert_eq!(
            hub.streams(),
            vec![("BTC", Timeframe::H1), ("ETH", Timeframe::H1)]
        );
    }

    #[test]
    fn test_timeframes_are_separate_streams() {
        let mut hub = sma_hub();
        hub.ingest(&on("BTC", Timeframe::H4, 100, dec!(10))).unwrap();
        // older timestamp, but on another timeframe
        hub.ingest(&on("BTC", Timeframe::H1, 0, dec!(10))).unwrap();
        assert_eq!(hub.len(), 2);
        assert!(hub.get("BTC", Timeframe::H4).is_some());
    }

    #[test]
    fn test_rejected_first_bar_opens_nothing() {
        let mut hub = sma_hub();
        let bad = ohlc(0, dec!(10), dec!(9), dec!(8), dec!(10));
        assert!(hub.ingest(&bad).is_err());
        assert!(hub.is_empty());
    }

    #[test]
    fn test_out_of_order_in_open_stream() {
        let mut hub = sma_hub();
        hub.ingest(&bar(10, dec!(10))).unwrap();
        assert!(matches!(
            hub.ingest(&bar(5, dec!(10))),
            Err(IndicatorError::OutOfOrder { .. })
        ));
        assert_eq!(hub.get("TEST", Timeframe::M1).unwrap().last_timestamp_ns(), Some(10));
    }

    #[test]
    fn test_remove_and_reset_all() {
        let mut hub = sma_hub();
        hub.ingest(&on("BTC", Timeframe::H1, 10, dec!(10))).unwrap();
        hub.ingest(&on("ETH", Timeframe::H1, 10, dec!(10))).unwrap();

        hub.reset_all();
        assert_eq!(hub.len(), 2);
        assert_eq!(hub.get("BTC", Timeframe::H1).unwrap().last_timestamp_ns(), None);
        // accepted again after reset
        hub.ingest(&on("BTC", Timeframe::H1, 0, dec!(10))).unwrap();

        let removed = hub.remove("ETH", Timeframe::H1).unwrap();
        assert_eq!(removed.symbol(), "ETH");
        assert!(hub.get("ETH", Timeframe::H1).is_none());
        assert!(hub.remove("ETH", Timeframe::H1).is_none());
    }

    #[test]
    fn test_new_rejects_invalid_or_disabled_config() {
        let zero = EngineConfig {
            indicators: vec![IndicatorConfig::Ema(EmaConfig { period: 0 })],
            signals: SignalConfig::default(),
        };
        assert!(IndicatorHub::new(IndicatorFactory::new(), zero).is_err());

        let factory = IndicatorFactory::new().without(IndicatorKind::Sma);
        let config = EngineConfig {
            indicators: vec![IndicatorConfig::Sma(SmaConfig { period: 2 })],
            signals: SignalConfig::default(),
        };
        assert!(IndicatorHub::new(factory, config).is_err());
    }
}
