use rust_decimal::Decimal;
use thebot_types::{Bar, Signal, SignalDirection, SignalTrigger};

use super::SignalConfig;
use crate::impl_::rsi::{Divergence, RsiOutput, RsiZone};
use crate::math::{checked_ratio, unit};

/// RSI entering an extreme zone, else a newly appeared divergence.
///
/// Entering oversold is a buy, entering overbought a sell, using the zones
/// the RSI classified with its own levels. Threshold strength is `0.5` at
/// the level and grows to `1` at the bound (0 or 100).
#[must_use]
pub fn rsi_signal(
    prev: Option<&RsiOutput>,
    curr: &RsiOutput,
    bar: &Bar,
    config: &SignalConfig,
) -> Option<Signal> {
    let half = Decimal::new(5, 1);

    if prev.is_some_and(|p| p.zone != curr.zone) {
        match curr.zone {
            RsiZone::Oversold => {
                let depth = checked_ratio(curr.oversold - curr.rsi, curr.oversold)
                    .unwrap_or(Decimal::ZERO);
                return Some(threshold(curr, bar, SignalDirection::Buy, half + half * unit(depth)));
            }
            RsiZone::Overbought => {
                let depth = checked_ratio(
                    curr.rsi - curr.overbought,
                    Decimal::ONE_HUNDRED - curr.overbought,
                )
                .unwrap_or(Decimal::ZERO);
                return Some(threshold(
                    curr,
                    bar,
                    SignalDirection::Sell,
                    half + half * unit(depth),
                ));
            }
            RsiZone::Neutral => {}
        }
    }

    let divergence = curr.divergence?;
    if prev.is_some_and(|p| p.divergence == Some(divergence)) {
        return None;
    }
    let direction = match divergence {
        Divergence::Bullish => SignalDirection::Buy,
        Divergence::Bearish => SignalDirection::Sell,
    };
    Some(
        Signal::new(
            "RSI",
            direction,
            config.divergence_strength,
            bar.close,
            bar.timestamp_ns,
            SignalTrigger::Divergence,
        )
        .with_meta("rsi", curr.rsi)
        .with_meta("divergence", divergence.as_str()),
    )
}

fn threshold(curr: &RsiOutput, bar: &Bar, direction: SignalDirection, strength: Decimal) -> Signal {
    Signal::new(
        "RSI",
        direction,
        strength,
        bar.close,
        bar.timestamp_ns,
        SignalTrigger::ThresholdBreach,
    )
    .with_meta("rsi", curr.rsi)
    .with_meta("zone", curr.zone.as_str())
}
