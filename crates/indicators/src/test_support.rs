//! Bar builders shared by the unit tests.

use rust_decimal::Decimal;
use thebot_types::{Bar, Timeframe};

/// Flat bar where open = high = low = close.
pub(crate) fn bar(timestamp_ns: i64, close: Decimal) -> Bar {
    ohlcv(timestamp_ns, close, close, close, close, Decimal::ONE)
}

pub(crate) fn ohlc(timestamp_ns: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
    ohlcv(timestamp_ns, open, high, low, close, Decimal::ONE)
}

pub(crate) fn ohlcv(
    timestamp_ns: i64,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
) -> Bar {
    Bar {
        symbol: "TEST".to_string(),
        timeframe: Timeframe::M1,
        timestamp_ns,
        open,
        high,
        low,
        close,
        volume,
    }
}

/// One flat bar per close, one minute apart.
pub(crate) fn from_closes(closes: &[Decimal]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(minute(i), c))
        .collect()
}

/// Bars spanning `close ± spread` with the open at the previous close.
pub(crate) fn ranged(closes: &[Decimal], spread: Decimal) -> Vec<Bar> {
    let mut prev = closes.first().copied().unwrap_or(Decimal::ONE);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = prev;
            prev = close;
            ohlc(
                minute(i),
                open,
                open.max(close) + spread,
                open.min(close) - spread,
                close,
            )
        })
        .collect()
}

pub(crate) fn minute(i: usize) -> i64 {
    i64::try_from(i).unwrap_or(i64::MAX) * 60_000_000_000
}
