//! Streaming indicators fed one close at a time.

/// Exponential moving average seeded with the simple average of the first `period`
/// values, then `value = alpha * price + (1 - alpha) * prev` with `alpha = 2 / (period + 1)`.
///
/// `value()` is `None` until `period` prices have been seen.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    count: usize,
    seed_sum: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            count: 0,
            seed_sum: 0.0,
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn update(&mut self, price: f64) -> Option<f64> {
        self.count += 1;
        match self.value {
            Some(prev) => {
                self.value = Some(self.alpha * price + (1.0 - self.alpha) * prev);
            }
            None => {
                self.seed_sum += price;
                if self.count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Sign of a cross between two lines: `1` when `fast` moves from below to above `slow`,
/// `-1` for the reverse, `0` otherwise. Touching without crossing keeps the last side,
/// so a later move across still counts.
#[derive(Debug, Clone, Default)]
pub struct CrossOver {
    last_side: Option<f64>,
}

impl CrossOver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, fast: f64, slow: f64) -> i8 {
        let diff = fast - slow;
        if diff == 0.0 || diff.is_nan() {
            return 0;
        }
        let signal = match self.last_side {
            Some(prev) if prev < 0.0 && diff > 0.0 => 1,
            Some(prev) if prev > 0.0 && diff < 0.0 => -1,
            _ => 0,
        };
        self.last_side = Some(diff);
        signal
    }
}
