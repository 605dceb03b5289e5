//! O(1)-space exponential smoothing shared by the exponential-family
//! calculators (EMA, Wilder-mode ATR, RSI gain/loss averages).

use rust_decimal::Decimal;

/// How the smoother produces its first value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeding {
    /// The first sample is the first value (EMA).
    FirstSample,
    /// The simple mean of the first `period` samples is the first value (Wilder).
    SimpleMean,
}

/// Exponential smoother holding only its previous value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpSmoother {
    period: usize,
    alpha: Decimal,
    seeding: Seeding,
    value: Option<Decimal>,
    seed_sum: Decimal,
    samples: usize,
}

impl ExpSmoother {
    /// Standard EMA: `alpha = 2 / (period + 1)`, ready on the first sample.
    #[must_use]
    pub fn ema(period: usize) -> Self {
        let alpha = Decimal::TWO / Decimal::from(period + 1);
        Self::with_alpha(period, alpha, Seeding::FirstSample)
    }

    /// Wilder smoothing: `alpha = 1 / period`, seeded by the mean of the
    /// first `period` samples.
    #[must_use]
    pub fn wilder(period: usize) -> Self {
        let alpha = if period == 0 {
            Decimal::ONE
        } else {
            Decimal::ONE / Decimal::from(period)
        };
        Self::with_alpha(period, alpha, Seeding::SimpleMean)
    }

    fn with_alpha(period: usize, alpha: Decimal, seeding: Seeding) -> Self {
        Self {
            period,
            alpha,
            seeding,
            value: None,
            seed_sum: Decimal::ZERO,
            samples: 0,
        }
    }

    /// Feeds one sample and returns the smoothed value once available.
    pub fn push(&mut self, sample: Decimal) -> Option<Decimal> {
        self.samples = self.samples.saturating_add(1);
        self.value = match (self.value, self.seeding) {
            (None, Seeding::FirstSample) => Some(sample),
            (None, Seeding::SimpleMean) => {
                self.seed_sum += sample;
                if self.samples >= self.period.max(1) {
                    Some(self.seed_sum / Decimal::from(self.samples))
                } else {
                    None
                }
            }
            (Some(prev), Seeding::SimpleMean) => {
                // (prev * (n - 1) + x) / n keeps one rounding step per update
                let n = Decimal::from(self.period.max(1));
                Some((prev * (n - Decimal::ONE) + sample) / n)
            }
            (Some(prev), Seeding::FirstSample) => {
                // alpha * x + (1 - alpha) * prev, written so a flat input stays exact
                Some(prev + self.alpha * (sample - prev))
            }
        };
        self.value
    }

    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        self.value
    }

    #[must_use]
    pub fn alpha(&self) -> Decimal {
        self.alpha
    }

    #[must_use]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of samples pushed since construction or the last reset.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// True once at least `period` samples were pushed.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.value.is_some() && self.samples >= self.period
    }

    pub fn reset(&mut self) {
        self.value = None;
        self.seed_sum = Decimal::ZERO;
        self.samples = 0;
    }
}
