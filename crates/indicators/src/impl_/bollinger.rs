//! Bollinger Bands

use rust_decimal::Decimal;
use thebot_types::Bar;

use crate::math::checked_ratio;
use crate::window::RollingStats;

/// Bollinger Bands for one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BollingerOutput {
    /// Upper band = SMA + std_factor * std
    pub upper: Decimal,
    /// Middle band = SMA
    pub middle: Decimal,
    /// Lower band = SMA - std_factor * std
    pub lower: Decimal,
    /// `(upper - lower) / middle`.
    pub bandwidth: Decimal,
    /// `(close - lower) / (upper - lower)`; `None` when the bands collapse.
    pub percent_b: Option<Decimal>,
}

/// Bollinger Bands
///
/// Uses the population standard deviation (n, not n-1). This is a building
/// block for composite calculators and does not validate or order bars by
/// itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BollingerBands {
    std_factor: Decimal,
    stats: RollingStats,
}

impl BollingerBands {
    #[must_use]
    pub fn new(period: usize, std_factor: Decimal) -> Self {
        Self {
            std_factor,
            stats: RollingStats::new(period),
        }
    }

    /// Folds in the close of `bar`; returns the bands once `period` closes were seen.
    pub fn push(&mut self, bar: &Bar) -> Option<BollingerOutput> {
        self.stats.push(bar.close);
        let middle = self.stats.mean()?;
        let width = self.std_factor * self.stats.std_dev()?;
        let upper = middle + width;
        let lower = middle - width;
        Some(BollingerOutput {
            upper,
            middle,
            lower,
            bandwidth: checked_ratio(upper - lower, middle).unwrap_or(Decimal::ZERO),
            percent_b: checked_ratio(bar.close - lower, upper - lower),
        })
    }

    pub fn reset(&mut self) {
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::from_closes;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bollinger_population_std() {
        // mean 5, population variance 4
        let closes = [
            dec!(2),
            dec!(4),
            dec!(4),
            dec!(4),
            dec!(5),
            dec!(5),
            dec!(7),
            dec!(9),
        ];
        let mut bb = BollingerBands::new(8, dec!(2));
        let outputs: Vec<Option<BollingerOutput>> =
            from_closes(&closes).iter().map(|b| bb.push(b)).collect();

        assert!(outputs[..7].iter().all(Option::is_none));
        let bands = outputs[7].as_ref().unwrap();
        assert_eq!(bands.middle, dec!(5));
        assert_eq!(bands.upper, dec!(9));
        assert_eq!(bands.lower, dec!(1));
        assert_eq!(bands.bandwidth, dec!(1.6));
        assert_eq!(bands.percent_b, Some(dec!(1)));
    }

    #[test]
    fn test_flat_input_collapses_bands() {
        let mut bb = BollingerBands::new(3, dec!(2));
        let last = from_closes(&[dec!(10); 3])
            .iter()
            .map(|b| bb.push(b))
            .last()
            .flatten()
            .unwrap();
        assert_eq!(last.upper, dec!(10));
        assert_eq!(last.lower, dec!(10));
        assert_eq!(last.bandwidth, Decimal::ZERO);
        assert_eq!(last.percent_b, None);
    }

    #[test]
    fn test_reset() {
        let mut bb = BollingerBands::new(2, dec!(2));
        for b in from_closes(&[dec!(1), dec!(2)]) {
            bb.push(&b);
        }
        bb.reset();
        assert_eq!(bb, BollingerBands::new(2, dec!(2)));
    }
}
