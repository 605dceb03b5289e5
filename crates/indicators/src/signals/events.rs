//! Event rules: squeeze release, breakout and candle patterns fire on the
//! bar of the event itself and do not need the previous output.

use rust_decimal::Decimal;
use thebot_types::{Bar, Signal, SignalDirection, SignalTrigger};

use super::SignalConfig;
use crate::impl_::breakout::{BreakoutDirection, BreakoutOutput};
use crate::impl_::candle_patterns::{CandlePattern, CandlePatternOutput};
use crate::impl_::squeeze::SqueezeOutput;
use crate::math::{checked_ratio, unit};

/// Squeeze release, in the direction of momentum.
///
/// Longer squeezes give stronger signals.
#[must_use]
pub fn squeeze_signal(
    _prev: Option<&SqueezeOutput>,
    curr: &SqueezeOutput,
    bar: &Bar,
    config: &SignalConfig,
) -> Option<Signal> {
    if !curr.released {
        return None;
    }
    let direction = match curr.momentum {
        Some(m) if m > Decimal::ZERO => SignalDirection::Buy,
        Some(m) if m < Decimal::ZERO => SignalDirection::Sell,
        _ => SignalDirection::Neutral,
    };
    let length = checked_ratio(
        Decimal::from(curr.release_length),
        Decimal::from(config.squeeze_full_length),
    )
    .unwrap_or(Decimal::ZERO);
    let mut signal = Signal::new(
        "Squeeze",
        direction,
        unit(config.squeeze_base + length),
        bar.close,
        bar.timestamp_ns,
        SignalTrigger::SqueezeRelease,
    )
    .with_meta("squeeze_length", curr.release_length);
    if let Some(momentum) = curr.momentum {
        signal = signal.with_meta("momentum", momentum);
    }
    Some(signal)
}

/// Breakout beyond support or resistance, with the detector's strength.
#[must_use]
pub fn breakout_signal(
    _prev: Option<&BreakoutOutput>,
    curr: &BreakoutOutput,
    bar: &Bar,
    _config: &SignalConfig,
) -> Option<Signal> {
    let (direction, level) = match curr.direction? {
        BreakoutDirection::Up => (SignalDirection::Buy, curr.resistance),
        BreakoutDirection::Down => (SignalDirection::Sell, curr.support),
    };
    let mut signal = Signal::new(
        "Breakout",
        direction,
        curr.strength,
        bar.close,
        bar.timestamp_ns,
        SignalTrigger::Breakout,
    )
    .with_meta("level", level)
    .with_meta("confirmed", curr.confirmed);
    if let Some(ratio) = curr.volume_ratio {
        signal = signal.with_meta("volume_ratio", ratio);
    }
    Some(signal)
}

/// Net candle-pattern bias; indecision (zero bias) is quiet.
#[must_use]
pub fn pattern_signal(
    _prev: Option<&CandlePatternOutput>,
    curr: &CandlePatternOutput,
    bar: &Bar,
    config: &SignalConfig,
) -> Option<Signal> {
    let direction = match curr.bias {
        b if b > 0 => SignalDirection::Buy,
        b if b < 0 => SignalDirection::Sell,
        _ => return None,
    };
    let bias = Decimal::from(curr.bias.unsigned_abs());
    let names: Vec<&str> = curr.patterns.iter().map(CandlePattern::as_str).collect();
    Some(
        Signal::new(
            "CandlePatterns",
            direction,
            unit(config.pattern_weight * bias + config.pattern_base),
            bar.close,
            bar.timestamp_ns,
            SignalTrigger::Pattern,
        )
        .with_meta("patterns", names.join(",")),
    )
}
