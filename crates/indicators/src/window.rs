//! Fixed-capacity windows used by the rolling calculators.
//!
//! Every window is sized at construction to the look-back its calculator
//! needs and never reallocates afterwards.

use rust_decimal::{Decimal, MathematicalOps};

/// Fixed-capacity circular buffer.
///
/// Index 0 is the oldest element. Pushing into a full buffer evicts and
/// returns the oldest element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` elements.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    fn slot(&self, offset: usize) -> usize {
        (self.head + offset) % self.capacity()
    }

    /// Appends `value`, returning the evicted oldest element when full.
    pub fn push_back(&mut self, value: T) -> Option<T> {
        if self.capacity() == 0 {
            return Some(value);
        }
        if self.is_full() {
            let idx = self.head;
            self.head = self.slot(1);
            return self.slots[idx].replace(value);
        }
        let idx = self.slot(self.len);
        self.slots[idx] = Some(value);
        self.len += 1;
        None
    }

    /// Removes and returns the oldest element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let idx = self.head;
        self.head = self.slot(1);
        self.len -= 1;
        self.slots[idx].take()
    }

    /// Removes and returns the newest element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let idx = self.slot(self.len - 1);
        self.len -= 1;
        self.slots[idx].take()
    }

    /// Element at `index` counted from the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.slot(index)].as_ref()
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Drops every element and rewinds to the initial layout.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

/// Rolling window with a running sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingSum {
    window: RingBuffer<Decimal>,
    sum: Decimal,
}

impl RollingSum {
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self {
            window: RingBuffer::new(period),
            sum: Decimal::ZERO,
        }
    }

    /// Pushes `value` and returns the mean once the window is full.
    pub fn push(&mut self, value: Decimal) -> Option<Decimal> {
        if let Some(evicted) = self.window.push_back(value) {
            self.sum -= evicted;
        }
        self.sum += value;
        self.mean()
    }

    /// Mean of the window, only when full.
    #[must_use]
    pub fn mean(&self) -> Option<Decimal> {
        if self.window.is_full() && !self.window.is_empty() {
            Some(self.sum / Decimal::from(self.window.len()))
        } else {
            None
        }
    }

    #[must_use]
    pub fn sum(&self) -> Decimal {
        self.sum
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.window.is_full()
    }

    #[must_use]
    pub fn period(&self) -> usize {
        self.window.capacity()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Decimal> + '_ {
        self.window.iter()
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.sum = Decimal::ZERO;
    }
}

/// Rolling mean and population standard deviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingStats {
    window: RollingSum,
    sum_sq: Decimal,
}

impl RollingStats {
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self {
            window: RollingSum::new(period),
            sum_sq: Decimal::ZERO,
        }
    }

    pub fn push(&mut self, value: Decimal) {
        if self.window.is_full()
            && let Some(&oldest) = self.window.values().next()
        {
            self.sum_sq -= oldest * oldest;
        }
        self.window.push(value);
        self.sum_sq += value * value;
    }

    #[must_use]
    pub fn mean(&self) -> Option<Decimal> {
        self.window.mean()
    }

    /// Population variance (divides by `n`), only when full.
    #[must_use]
    pub fn variance(&self) -> Option<Decimal> {
        let mean = self.mean()?;
        let n = Decimal::from(self.window.len());
        let variance = self.sum_sq / n - mean * mean;
        Some(variance.max(Decimal::ZERO))
    }

    /// Population standard deviation, only when full.
    #[must_use]
    pub fn std_dev(&self) -> Option<Decimal> {
        self.variance().map(|v| v.sqrt().unwrap_or(Decimal::ZERO))
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.window.is_full()
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.sum_sq = Decimal::ZERO;
    }
}

/// Which extreme a [`RollingExtreme`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

/// Rolling maximum or minimum over the last `period` values.
///
/// Monotonic queue of `(sequence, value)` pairs; each value enters and
/// leaves the queue at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingExtreme {
    kind: Extreme,
    period: usize,
    queue: RingBuffer<(u64, Decimal)>,
    next_seq: u64,
}

impl RollingExtreme {
    #[must_use]
    pub fn new(kind: Extreme, period: usize) -> Self {
        Self {
            kind,
            period,
            queue: RingBuffer::new(period),
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn max(period: usize) -> Self {
        Self::new(Extreme::Max, period)
    }

    #[must_use]
    pub fn min(period: usize) -> Self {
        Self::new(Extreme::Min, period)
    }

    fn dominates(&self, new: Decimal, old: Decimal) -> bool {
        match self.kind {
            Extreme::Max => new >= old,
            Extreme::Min => new <= old,
        }
    }

    pub fn push(&mut self, value: Decimal) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let period = self.period as u64;

        // Expire first so the queue never exceeds `period` entries.
        while let Some(&(front_seq, _)) = self.queue.front() {
            if front_seq + period <= seq {
                self.queue.pop_front();
            } else {
                break;
            }
        }
        while let Some(&(_, back)) = self.queue.back() {
            if self.dominates(value, back) {
                self.queue.pop_back();
            } else {
                break;
            }
        }
        self.queue.push_back((seq, value));
    }

    /// Current extreme, available once `period` values were pushed.
    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        if self.is_full() {
            self.queue.front().map(|&(_, v)| v)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.period > 0 && self.next_seq >= self.period as u64
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.next_seq = 0;
    }
}
