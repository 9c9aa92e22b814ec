use std::time::Instant;

/// Floor for the elapsed-time denominator so a degenerate zero interval
/// yields a finite value instead of a division fault.
const MIN_ELAPSED_SECS: f64 = 1e-9;

/// Smoothed throughput estimator over a fixed-size ring of
/// (timestamp, cumulative value) pairs.
///
/// Each call compares the current cumulative counter against the sample
/// stored N positions back, then overwrites the oldest slot. The ring is
/// always full; `reset` reinitializes every slot.
#[derive(Debug)]
pub struct RateEstimator {
    times: Vec<Instant>,
    values: Vec<f64>,
    /// Write cursor. Negative while warming up after a reset, during
    /// which the reference sample is the reset baseline.
    pos: isize,
}

impl RateEstimator {
    /// Recommended ring size for the inventory display.
    pub const DEFAULT_WINDOW: usize = 6;

    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let now = Instant::now();
        Self {
            times: vec![now; size],
            values: vec![0.0; size],
            pos: -(size as isize),
        }
    }

    pub fn window(&self) -> usize {
        self.times.len()
    }

    /// Smoothed rate (units/second) given the current cumulative value.
    pub fn sample(&mut self, value: f64) -> f64 {
        self.sample_at(Instant::now(), value)
    }

    /// `sample` with an explicit clock, for deterministic tests.
    pub fn sample_at(&mut self, now: Instant, value: f64) -> f64 {
        let size = self.times.len();
        let (ref_pos, read_index) = if self.pos >= 0 {
            let ref_pos = (self.pos + 1) % size as isize;
            (ref_pos, ref_pos as usize)
        } else {
            // Warming up: measure against the reset baseline
            (self.pos + 1, size - 1)
        };

        let prev_time = self.times[read_index];
        let prev_value = self.values[read_index];

        let elapsed = now
            .saturating_duration_since(prev_time)
            .as_secs_f64()
            .max(MIN_ELAPSED_SECS);
        let speed = (value - prev_value) / elapsed;

        let write_index = ref_pos.rem_euclid(size as isize) as usize;
        self.times[write_index] = now;
        self.values[write_index] = value;
        self.pos = ref_pos;

        speed
    }

    /// Discard history and reinitialize every slot to (now, default).
    pub fn reset(&mut self, default_value: f64) {
        self.reset_at(Instant::now(), default_value);
    }

    pub fn reset_at(&mut self, now: Instant, default_value: f64) {
        let size = self.times.len();
        self.times.fill(now);
        self.values.fill(default_value);
        self.pos = -(size as isize);
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}
