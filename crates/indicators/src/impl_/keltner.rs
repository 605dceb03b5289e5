//! Keltner Channels

use rust_decimal::Decimal;
use thebot_types::Bar;

use crate::impl_::atr::{AtrMode, TrueRangeAverage};
use crate::smoothing::ExpSmoother;

/// Keltner Channels for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeltnerOutput {
    pub upper: Decimal,
    /// EMA of the typical price.
    pub middle: Decimal,
    pub lower: Decimal,
    pub atr: Decimal,
}

/// Keltner Channels: `EMA(typical price) ± multiplier * ATR`.
///
/// Building block for composite calculators; bars are assumed validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeltnerChannels {
    multiplier: Decimal,
    middle: ExpSmoother,
    atr: TrueRangeAverage,
}

impl KeltnerChannels {
    #[must_use]
    pub fn new(period: usize, multiplier: Decimal, atr_period: usize, atr_mode: AtrMode) -> Self {
        Self {
            multiplier,
            middle: ExpSmoother::ema(period),
            atr: TrueRangeAverage::new(atr_period, atr_mode),
        }
    }

    /// Folds in one bar; returns the channel once the ATR is available.
    pub fn push(&mut self, bar: &Bar) -> Option<KeltnerOutput> {
        let middle = self.middle.push(bar.typical_price());
        let atr = self.atr.push(bar);
        let (middle, atr) = (middle?, atr?);
        let width = self.multiplier * atr;
        Some(KeltnerOutput {
            upper: middle + width,
            middle,
            lower: middle - width,
            atr,
        })
    }

    pub fn reset(&mut self) {
        self.middle.reset();
        self.atr.reset();
    }
}
