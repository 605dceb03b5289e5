//! Rolling volume profile: point of control and value area.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thebot_types::{Bar, IndicatorResult};

use crate::config::{require_period, require_range};
use crate::error::IndicatorError;
use crate::gate::BarGate;
use crate::traits::{Indicator, ToIndicatorResult};
use crate::window::RingBuffer;

/// Volume profile configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeProfileConfig {
    pub lookback: usize,
    pub bins: usize,
    /// Share of the window's volume, in percent, inside the value area.
    pub value_area_pct: Decimal,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            lookback: 50,
            bins: 24,
            value_area_pct: Decimal::from(70),
        }
    }
}

impl VolumeProfileConfig {
    /// # Errors
    /// Zero look-back or bin count, or a value area outside `(0, 100]`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        require_period("VolumeProfile lookback", self.lookback)?;
        require_period("VolumeProfile bins", self.bins)?;
        require_range(
            "VolumeProfile value_area_pct",
            self.value_area_pct,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;
        if self.value_area_pct.is_zero() {
            return Err(IndicatorError::invalid_params(
                "VolumeProfile value_area_pct must be > 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeProfileOutput {
    /// Center of the bin with the most volume.
    pub poc: Decimal,
    pub value_area_high: Decimal,
    pub value_area_low: Decimal,
    pub total_volume: Decimal,
    /// Volume per bin, lowest price first.
    pub bins: Vec<Decimal>,
}

impl ToIndicatorResult for VolumeProfileOutput {
    fn to_result(&self, name: &str, timestamp_ns: i64) -> IndicatorResult {
        IndicatorResult::new(name, timestamp_ns, self.poc)
            .with_meta("value_area_high", self.value_area_high)
            .with_meta("value_area_low", self.value_area_low)
            .with_meta("total_volume", self.total_volume)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Sample {
    high: Decimal,
    low: Decimal,
    typical: Decimal,
    volume: Decimal,
}

/// Volume profile over the last `lookback` bars.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProfile {
    config: VolumeProfileConfig,
    gate: BarGate,
    window: RingBuffer<Sample>,
    last: Option<VolumeProfileOutput>,
}

impl VolumeProfile {
    /// # Errors
    /// See [`VolumeProfileConfig::validate`].
    pub fn new(config: VolumeProfileConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            window: RingBuffer::new(config.lookback),
            config,
            gate: BarGate::new(),
            last: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &VolumeProfileConfig {
        &self.config
    }

    fn bin_index(&self, price: Decimal, floor: Decimal, width: Decimal) -> usize {
        if width.is_zero() {
            return 0;
        }
        let index = ((price - floor) / width)
            .floor()
            .to_usize()
            .unwrap_or(0);
        index.min(self.config.bins - 1)
    }

    fn build(&self) -> Option<VolumeProfileOutput> {
        let floor = self.window.iter().map(|s| s.low).min()?;
        let ceiling = self.window.iter().map(|s| s.high).max()?;
        let width = (ceiling - floor) / Decimal::from(self.config.bins);

        let mut bins = vec![Decimal::ZERO; self.config.bins];
        for sample in self.window.iter() {
            bins[self.bin_index(sample.typical, floor, width)] += sample.volume;
        }
        let total_volume: Decimal = bins.iter().copied().sum();

        // first bin wins ties
        let mut poc_index = 0;
        for (i, volume) in bins.iter().enumerate() {
            if *volume > bins[poc_index] {
                poc_index = i;
            }
        }

        let target = total_volume * self.config.value_area_pct / Decimal::ONE_HUNDRED;
        let (mut low_index, mut high_index) = (poc_index, poc_index);
        let mut covered = bins[poc_index];
        while covered < target {
            let above = bins.get(high_index + 1).copied();
            let below = low_index.checked_sub(1).map(|i| bins[i]);
            match (above, below) {
                (Some(a), Some(b)) if a >= b => {
                    high_index += 1;
                    covered += a;
                }
                (_, Some(b)) => {
                    low_index -= 1;
                    covered += b;
                }
                (Some(a), None) => {
                    high_index += 1;
                    covered += a;
                }
                (None, None) => break,
            }
        }

        let edge = |i: usize| floor + width * Decimal::from(i);
        Some(VolumeProfileOutput {
            poc: edge(poc_index) + width / Decimal::TWO,
            value_area_high: edge(high_index + 1),
            value_area_low: edge(low_index),
            total_volume,
            bins,
        })
    }
}

impl Indicator for VolumeProfile {
    type Output = VolumeProfileOutput;

    fn name(&self) -> &'static str {
        "VolumeProfile"
    }

    fn warmup_periods(&self) -> usize {
        self.config.lookback
    }

    fn update(&mut self, bar: &Bar) -> Result<Option<Self::Output>, IndicatorError> {
        self.gate.admit(bar)?;

        self.window.push_back(Sample {
            high: bar.high,
            low: bar.low,
            typical: bar.typical_price(),
            volume: bar.volume,
        });
        if !self.window.is_full() {
            return Ok(None);
        }
        let output = self.build();
        if let Some(output) = &output {
            self.last = Some(output.clone());
        }
        Ok(output)
    }

    fn last(&self) -> Option<&Self::Output> {
        self.last.as_ref()
    }

    fn reset(&mut self) {
        tracing::debug!(indicator = "VolumeProfile", "reset");
        self.gate.reset();
        self.window.clear();
        self.last = None;
    }
}
