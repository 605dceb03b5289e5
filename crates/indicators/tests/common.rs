use rust_decimal::Decimal;
use thebot_types::{Bar, Timeframe};

pub const SYMBOL: &str = "BTCUSDT";
pub const STEP_NS: i64 = 60_000_000_000;
pub const START_NS: i64 = 1_704_067_200_000_000_000; // 2024-01-01 00:00:00 UTC

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn timestamp(i: usize) -> i64 {
    START_NS + i64::try_from(i).unwrap() * STEP_NS
}

pub fn make_bar(
    i: usize,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
) -> Bar {
    Bar::new(SYMBOL, Timeframe::H1, timestamp(i), open, high, low, close, volume).unwrap()
}

/// Deterministic random walk starting at 100.
pub fn sample_bars(n: usize) -> Vec<Bar> {
    let mut seed = 42u64;
    let mut close = Decimal::from(100);
    let floor = Decimal::new(1, 2);
    (0..n)
        .map(|i| {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1);
            // -0.512 ..= +0.511
            let step = i64::try_from(seed >> 54).unwrap() - 512;
            let open = close;
            close = (close + Decimal::new(step, 3)).max(Decimal::ONE);
            let spread = Decimal::new(i64::try_from((seed >> 40) & 0xff).unwrap(), 3);
            let high = open.max(close) + spread;
            let low = (open.min(close) - spread).max(floor);
            let volume = Decimal::from(1_000 + ((seed >> 20) & 0x3ff));
            make_bar(i, open, high, low, close, volume)
        })
        .collect()
}
