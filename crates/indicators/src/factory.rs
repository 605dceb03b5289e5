//! Indicator factory and the closed set of calculators it builds.

use std::collections::BTreeSet;

use thebot_types::{Bar, IndicatorResult, Signal};

use crate::config::{IndicatorConfig, IndicatorKind};
use crate::error::IndicatorError;
use crate::impl_::{
    atr::Atr, breakout::Breakout, candle_patterns::CandlePatterns, ema::Ema, macd::Macd, obv::Obv,
    rsi::Rsi, sma::Sma, squeeze::Squeeze, supertrend::SuperTrend, volume_profile::VolumeProfile,
};
use crate::set::IndicatorUpdate;
use crate::signals::{
    SignalConfig, breakout_signal, ma_cross_signal, macd_signal, obv_signal, pattern_signal,
    rsi_signal, squeeze_signal, supertrend_signal,
};
use crate::traits::{Indicator, ToIndicatorResult};

const ALL_KINDS: [IndicatorKind; 11] = [
    IndicatorKind::Sma,
    IndicatorKind::Ema,
    IndicatorKind::Rsi,
    IndicatorKind::Atr,
    IndicatorKind::Macd,
    IndicatorKind::SuperTrend,
    IndicatorKind::Squeeze,
    IndicatorKind::Breakout,
    IndicatorKind::Obv,
    IndicatorKind::CandlePatterns,
    IndicatorKind::VolumeProfile,
];

/// Builds calculators from typed configs.
///
/// The factory is an ordinary value owned by the caller; every kind is
/// enabled unless removed with [`IndicatorFactory::without`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorFactory {
    enabled: BTreeSet<IndicatorKind>,
}

impl Default for IndicatorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorFactory {
    /// Creates a factory with every kind enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: ALL_KINDS.into_iter().collect(),
        }
    }

    /// Disables `kind`; building it afterwards is a configuration error.
    #[must_use]
    pub fn without(mut self, kind: IndicatorKind) -> Self {
        self.enabled.remove(&kind);
        self
    }

    /// Checks if a kind can be built.
    #[must_use]
    pub fn contains(&self, kind: IndicatorKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Returns the enabled kinds.
    #[must_use]
    pub fn kinds(&self) -> Vec<IndicatorKind> {
        self.enabled.iter().copied().collect()
    }

    /// Validates `config` and builds its calculator.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::InvalidParams`] for a disabled kind and the
    /// config's own validation error otherwise.
    pub fn build(&self, config: &IndicatorConfig) -> Result<Calculator, IndicatorError> {
        let kind = config.kind();
        if !self.contains(kind) {
            return Err(IndicatorError::invalid_params(format!(
                "indicator kind {kind:?} is not enabled"
            )));
        }
        let calculator = match config {
            IndicatorConfig::Sma(c) => Calculator::Sma(Sma::new(c.clone())?),
            IndicatorConfig::Ema(c) => Calculator::Ema(Ema::new(c.clone())?),
            IndicatorConfig::Rsi(c) => Calculator::Rsi(Rsi::new(c.clone())?),
            IndicatorConfig::Atr(c) => Calculator::Atr(Atr::new(c.clone())?),
            IndicatorConfig::Macd(c) => Calculator::Macd(Macd::new(c.clone())?),
            IndicatorConfig::SuperTrend(c) => Calculator::SuperTrend(SuperTrend::new(c.clone())?),
            IndicatorConfig::Squeeze(c) => Calculator::Squeeze(Squeeze::new(c.clone())?),
            IndicatorConfig::Breakout(c) => Calculator::Breakout(Breakout::new(c.clone())?),
            IndicatorConfig::Obv(c) => Calculator::Obv(Obv::new(c.clone())?),
            IndicatorConfig::CandlePatterns(c) => {
                Calculator::CandlePatterns(CandlePatterns::new(c.clone())?)
            }
            IndicatorConfig::VolumeProfile(c) => {
                Calculator::VolumeProfile(VolumeProfile::new(c.clone())?)
            }
        };
        Ok(calculator)
    }

    /// Builds every config, failing on the first invalid one.
    ///
    /// # Errors
    /// Same as [`IndicatorFactory::build`].
    pub fn build_all(&self, configs: &[IndicatorConfig]) -> Result<Vec<Calculator>, IndicatorError> {
        configs.iter().map(|c| self.build(c)).collect()
    }
}

/// One calculator of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Calculator {
    Sma(Sma),
    Ema(Ema),
    Rsi(Rsi),
    Atr(Atr),
    Macd(Macd),
    SuperTrend(SuperTrend),
    Squeeze(Squeeze),
    Breakout(Breakout),
    Obv(Obv),
    CandlePatterns(CandlePatterns),
    VolumeProfile(VolumeProfile),
}

type Step = (Option<IndicatorResult>, Option<Signal>);

/// Updates `indicator` and runs `rule` on its previous and current output.
fn step<I, F>(
    indicator: &mut I,
    bar: &Bar,
    config: &SignalConfig,
    rule: F,
) -> Result<Step, IndicatorError>
where
    I: Indicator,
    F: FnOnce(Option<&I::Output>, &I::Output, &Bar, &SignalConfig) -> Option<Signal>,
{
    let prev = indicator.last().cloned();
    let Some(curr) = indicator.update(bar)? else {
        return Ok((None, None));
    };
    let signal = config.admit(rule(prev.as_ref(), &curr, bar, config));
    Ok((Some(curr.to_result(indicator.name(), bar.timestamp_ns)), signal))
}

/// Updates an indicator that has no signal rule.
fn quiet<I: Indicator>(indicator: &mut I, bar: &Bar) -> Result<Step, IndicatorError> {
    Ok((indicator.update_result(bar)?, None))
}

impl Calculator {
    #[must_use]
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Calculator::Sma(_) => IndicatorKind::Sma,
            Calculator::Ema(_) => IndicatorKind::Ema,
            Calculator::Rsi(_) => IndicatorKind::Rsi,
            Calculator::Atr(_) => IndicatorKind::Atr,
            Calculator::Macd(_) => IndicatorKind::Macd,
            Calculator::SuperTrend(_) => IndicatorKind::SuperTrend,
            Calculator::Squeeze(_) => IndicatorKind::Squeeze,
            Calculator::Breakout(_) => IndicatorKind::Breakout,
            Calculator::Obv(_) => IndicatorKind::Obv,
            Calculator::CandlePatterns(_) => IndicatorKind::CandlePatterns,
            Calculator::VolumeProfile(_) => IndicatorKind::VolumeProfile,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Calculator::Sma(i) => i.name(),
            Calculator::Ema(i) => i.name(),
            Calculator::Rsi(i) => i.name(),
            Calculator::Atr(i) => i.name(),
            Calculator::Macd(i) => i.name(),
            Calculator::SuperTrend(i) => i.name(),
            Calculator::Squeeze(i) => i.name(),
            Calculator::Breakout(i) => i.name(),
            Calculator::Obv(i) => i.name(),
            Calculator::CandlePatterns(i) => i.name(),
            Calculator::VolumeProfile(i) => i.name(),
        }
    }

    #[must_use]
    pub fn warmup_periods(&self) -> usize {
        match self {
            Calculator::Sma(i) => i.warmup_periods(),
            Calculator::Ema(i) => i.warmup_periods(),
            Calculator::Rsi(i) => i.warmup_periods(),
            Calculator::Atr(i) => i.warmup_periods(),
            Calculator::Macd(i) => i.warmup_periods(),
            Calculator::SuperTrend(i) => i.warmup_periods(),
            Calculator::Squeeze(i) => i.warmup_periods(),
            Calculator::Breakout(i) => i.warmup_periods(),
            Calculator::Obv(i) => i.warmup_periods(),
            Calculator::CandlePatterns(i) => i.warmup_periods(),
            Calculator::VolumeProfile(i) => i.warmup_periods(),
        }
    }

    /// Consumes one bar and returns the uniform result.
    ///
    /// # Errors
    /// The calculator's validation error; its state is unchanged.
    pub fn update(&mut self, bar: &Bar) -> Result<Option<IndicatorResult>, IndicatorError> {
        match self {
            Calculator::Sma(i) => i.update_result(bar),
            Calculator::Ema(i) => i.update_result(bar),
            Calculator::Rsi(i) => i.update_result(bar),
            Calculator::Atr(i) => i.update_result(bar),
            Calculator::Macd(i) => i.update_result(bar),
            Calculator::SuperTrend(i) => i.update_result(bar),
            Calculator::Squeeze(i) => i.update_result(bar),
            Calculator::Breakout(i) => i.update_result(bar),
            Calculator::Obv(i) => i.update_result(bar),
            Calculator::CandlePatterns(i) => i.update_result(bar),
            Calculator::VolumeProfile(i) => i.update_result(bar),
        }
    }

    /// Consumes one bar and evaluates the signal rule of this kind against
    /// the previous and current output.
    ///
    /// # Errors
    /// The calculator's validation error; its state is unchanged.
    pub fn signal(
        &mut self,
        bar: &Bar,
        config: &SignalConfig,
    ) -> Result<IndicatorUpdate, IndicatorError> {
        let kind = self.kind();
        let (result, signal) = match self {
            Calculator::Sma(i) => step(i, bar, config, |p, c, b, cfg| {
                ma_cross_signal("SMA", p, c, b, cfg)
            })?,
            Calculator::Ema(i) => step(i, bar, config, |p, c, b, cfg| {
                ma_cross_signal("EMA", p, c, b, cfg)
            })?,
            Calculator::Rsi(i) => step(i, bar, config, rsi_signal)?,
            Calculator::Atr(i) => quiet(i, bar)?,
            Calculator::Macd(i) => step(i, bar, config, macd_signal)?,
            Calculator::SuperTrend(i) => step(i, bar, config, supertrend_signal)?,
            Calculator::Squeeze(i) => step(i, bar, config, squeeze_signal)?,
            Calculator::Breakout(i) => step(i, bar, config, breakout_signal)?,
            Calculator::Obv(i) => step(i, bar, config, obv_signal)?,
            Calculator::CandlePatterns(i) => step(i, bar, config, pattern_signal)?,
            Calculator::VolumeProfile(i) => quiet(i, bar)?,
        };
        Ok(IndicatorUpdate {
            kind,
            result,
            signal,
        })
    }

    /// Clears the calculator's state.
    pub fn reset(&mut self) {
        match self {
            Calculator::Sma(i) => i.reset(),
            Calculator::Ema(i) => i.reset(),
            Calculator::Rsi(i) => i.reset(),
            Calculator::Atr(i) => i.reset(),
            Calculator::Macd(i) => i.reset(),
            Calculator::SuperTrend(i) => i.reset(),
            Calculator::Squeeze(i) => i.reset(),
            Calculator::Breakout(i) => i.reset(),
            Calculator::Obv(i) => i.reset(),
            Calculator::CandlePatterns(i) => i.reset(),
            Calculator::VolumeProfile(i) => i.reset(),
        }
    }
}
