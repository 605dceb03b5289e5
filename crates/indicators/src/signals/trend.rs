//! Trend-following rules: moving-average and MACD crossovers, SuperTrend
//! flips and OBV crossings.

use rust_decimal::Decimal;
use thebot_types::{Bar, Signal, SignalDirection, SignalTrigger};

use super::SignalConfig;
use crate::impl_::macd::MacdOutput;
use crate::impl_::obv::ObvOutput;
use crate::impl_::sma::MovingAverageOutput;
use crate::impl_::supertrend::{SuperTrendOutput, Trend};
use crate::math::{checked_ratio, unit};

/// Direction of a crossing of `line` over `reference` between two bars.
fn crossing(
    prev_line: Decimal,
    prev_reference: Decimal,
    line: Decimal,
    reference: Decimal,
) -> Option<SignalDirection> {
    if prev_line <= prev_reference && line > reference {
        Some(SignalDirection::Buy)
    } else if prev_line >= prev_reference && line < reference {
        Some(SignalDirection::Sell)
    } else {
        None
    }
}

fn half_plus(weight: Decimal) -> Decimal {
    let half = Decimal::new(5, 1);
    half + half * unit(weight)
}

/// Close crossing a moving average (`indicator` is "SMA" or "EMA").
///
/// Unstable EMA values never signal.
#[must_use]
pub fn ma_cross_signal(
    indicator: &str,
    prev: Option<&MovingAverageOutput>,
    curr: &MovingAverageOutput,
    bar: &Bar,
    config: &SignalConfig,
) -> Option<Signal> {
    let prev = prev?;
    if !prev.stable || !curr.stable {
        return None;
    }
    let direction = crossing(prev.close, prev.value, curr.close, curr.value)?;
    let distance_pct = checked_ratio((curr.close - curr.value).abs(), curr.value)
        .unwrap_or(Decimal::ZERO)
        .saturating_mul(Decimal::ONE_HUNDRED);
    let strength =
        Decimal::new(5, 1).saturating_add(distance_pct.saturating_mul(config.ma_distance_weight));
    Some(
        Signal::new(
            indicator,
            direction,
            strength,
            bar.close,
            bar.timestamp_ns,
            SignalTrigger::Crossover,
        )
        .with_meta("ma", curr.value)
        .with_meta("period", curr.period),
    )
}

/// MACD line crossing its signal line; quiet until the output is valid.
#[must_use]
pub fn macd_signal(
    prev: Option<&MacdOutput>,
    curr: &MacdOutput,
    bar: &Bar,
    _config: &SignalConfig,
) -> Option<Signal> {
    let prev = prev?;
    if !prev.valid || !curr.valid {
        return None;
    }
    let direction = crossing(prev.macd, prev.signal, curr.macd, curr.signal)?;
    let weight = checked_ratio(curr.histogram.abs(), curr.macd.abs()).unwrap_or(Decimal::ZERO);
    Some(
        Signal::new(
            "MACD",
            direction,
            half_plus(weight),
            bar.close,
            bar.timestamp_ns,
            SignalTrigger::Crossover,
        )
        .with_meta("histogram", curr.histogram),
    )
}

/// SuperTrend flip; the direction is the new trend.
#[must_use]
pub fn supertrend_signal(
    _prev: Option<&SuperTrendOutput>,
    curr: &SuperTrendOutput,
    bar: &Bar,
    config: &SignalConfig,
) -> Option<Signal> {
    if !curr.flipped {
        return None;
    }
    let direction = match curr.trend {
        Trend::Up => SignalDirection::Buy,
        Trend::Down => SignalDirection::Sell,
    };
    let distance = (curr.close - curr.value).abs();
    // a decayed ATR can push the ratio past the Decimal range
    let atr_distance = if curr.atr.is_zero() {
        Decimal::ZERO
    } else {
        distance.checked_div(curr.atr).unwrap_or(Decimal::MAX)
    };
    let strength = Decimal::new(5, 1)
        .saturating_add(atr_distance.saturating_mul(config.supertrend_atr_weight));
    Some(
        Signal::new(
            "SuperTrend",
            direction,
            strength,
            bar.close,
            bar.timestamp_ns,
            SignalTrigger::TrendFlip,
        )
        .with_meta("band", curr.value)
        .with_meta("trend", curr.trend.as_str()),
    )
}

/// OBV crossing its signal line.
///
/// Strength grows with the gap between the two lines relative to the
/// larger of them.
#[must_use]
pub fn obv_signal(
    prev: Option<&ObvOutput>,
    curr: &ObvOutput,
    bar: &Bar,
    _config: &SignalConfig,
) -> Option<Signal> {
    let prev = prev?;
    let direction = crossing(prev.obv, prev.signal, curr.obv, curr.signal)?;
    let gap = (curr.obv - curr.signal).abs();
    let scale = curr.obv.abs().max(curr.signal.abs());
    let weight = checked_ratio(gap, scale).unwrap_or(Decimal::ZERO);
    Some(Signal::new(
        "OBV",
        direction,
        half_plus(weight),
        bar.close,
        bar.timestamp_ns,
        SignalTrigger::Crossover,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bar;
    use rust_decimal_macros::dec;

    fn ma(value: Decimal, close: Decimal) -> MovingAverageOutput {
        MovingAverageOutput {
            value,
            close,
            period: 20,
            stable: true,
        }
    }

    #[test]
    fn test_ma_cross_above() {
        let config = SignalConfig::default();
        let prev = ma(dec!(100), dec!(99));
        let curr = ma(dec!(100), dec!(102));
        let signal =
            ma_cross_signal("SMA", Some(&prev), &curr, &bar(1, dec!(102)), &config).unwrap();
        assert_eq!(signal.direction, SignalDirection::Buy);
        assert_eq!(signal.trigger, SignalTrigger::Crossover);
        // 0.5 + 2% * 0.1
        assert_eq!(signal.strength, dec!(0.7));
        assert_eq!(signal.indicator, "SMA");
    }

    #[test]
    fn test_ma_cross_below_and_no_cross() {
        let config = SignalConfig::default();
        let above = ma(dec!(100), dec!(101));
        let below = ma(dec!(100), dec!(99.5));
        let signal =
            ma_cross_signal("EMA", Some(&above), &below, &bar(1, dec!(99.5)), &config).unwrap();
        assert_eq!(signal.direction, SignalDirection::Sell);
        assert_eq!(signal.strength, dec!(0.55));

        let still_above = ma(dec!(100), dec!(103));
        assert!(
            ma_cross_signal("EMA", Some(&above), &still_above, &bar(1, dec!(103)), &config)
                .is_none()
        );
        assert!(ma_cross_signal("EMA", None, &below, &bar(1, dec!(99.5)), &config).is_none());
    }

    #[test]
    fn test_ma_cross_ignores_unstable() {
        let config = SignalConfig::default();
        let prev = MovingAverageOutput {
            stable: false,
            ..ma(dec!(100), dec!(99))
        };
        let curr = ma(dec!(100), dec!(102));
        assert!(
            ma_cross_signal("EMA", Some(&prev), &curr, &bar(1, dec!(102)), &config).is_none()
        );
    }

    fn macd(macd: Decimal, signal: Decimal, valid: bool) -> MacdOutput {
        MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
            valid,
        }
    }

    #[test]
    fn test_macd_crossover() {
        let config = SignalConfig::default();
        let prev = macd(dec!(-0.2), dec!(0.1), true);
        let curr = macd(dec!(0.4), dec!(0.2), true);
        let signal = macd_signal(Some(&prev), &curr, &bar(1, dec!(10)), &config).unwrap();
        assert_eq!(signal.direction, SignalDirection::Buy);
        // 0.5 + 0.5 * (0.2 / 0.4)
        assert_eq!(signal.strength, dec!(0.75));

        let invalid = macd(dec!(0.4), dec!(0.2), false);
        assert!(macd_signal(Some(&prev), &invalid, &bar(1, dec!(10)), &config).is_none());
    }

    #[test]
    fn test_supertrend_flip() {
        let config = SignalConfig::default();
        let curr = SuperTrendOutput {
            value: dec!(12),
            upper: dec!(12),
            lower: dec!(10),
            trend: Trend::Down,
            flipped: true,
            atr: dec!(4),
            close: dec!(8),
        };
        let signal = supertrend_signal(None, &curr, &bar(1, dec!(8)), &config).unwrap();
        assert_eq!(signal.direction, SignalDirection::Sell);
        assert_eq!(signal.trigger, SignalTrigger::TrendFlip);
        // 0.5 + (4 / 4) * 0.25
        assert_eq!(signal.strength, dec!(0.75));

        let steady = SuperTrendOutput {
            flipped: false,
            ..curr
        };
        assert!(supertrend_signal(None, &steady, &bar(1, dec!(8)), &config).is_none());
    }

    #[test]
    fn test_supertrend_flip_with_vanishing_atr_is_full_strength() {
        let config = SignalConfig {
            supertrend_atr_weight: dec!(100),
            ..SignalConfig::default()
        };
        let curr = SuperTrendOutput {
            value: Bar::MAX_PRICE,
            upper: Bar::MAX_PRICE,
            lower: Bar::MIN_PRICE,
            trend: Trend::Down,
            flipped: true,
            atr: dec!(0.0000000000000000000000000001),
            close: Bar::MIN_PRICE,
        };
        let signal =
            supertrend_signal(None, &curr, &bar(1, Bar::MIN_PRICE), &config).unwrap();
        assert_eq!(signal.strength, Decimal::ONE);
    }

    #[test]
    fn test_obv_crossing() {
        let config = SignalConfig::default();
        let prev = ObvOutput {
            obv: dec!(100),
            signal: dec!(150),
        };
        let curr = ObvOutput {
            obv: dec!(200),
            signal: dec!(100),
        };
        let signal = obv_signal(Some(&prev), &curr, &bar(1, dec!(10)), &config).unwrap();
        assert_eq!(signal.direction, SignalDirection::Buy);
        // 0.5 + 0.5 * (100 / 200)
        assert_eq!(signal.strength, dec!(0.75));
    }
}
