use std::collections::VecDeque;

/// Rolling statistics of a [`SlidingWindow`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowStats {
    pub cpu_mean: f64,
    pub cpu_stddev: f64,
    pub rps_mean: f64,
    pub rps_stddev: f64,
    pub len: usize,
}

/// Fixed-capacity FIFO history of one device's readings.
///
/// CPU values, request-rate values and timestamps are kept in three parallel
/// sequences that always have the same length. Once `len == capacity`, every
/// append evicts the oldest sample from each sequence. The buffers are
/// allocated up front, so a full window appends without touching the heap.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    cpu: VecDeque<f64>,
    rps: VecDeque<f64>,
    timestamps: VecDeque<u64>,
    capacity: usize,
}

impl SlidingWindow {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        // One spare slot: the push happens before the trim.
        Self {
            cpu: VecDeque::with_capacity(capacity + 1),
            rps: VecDeque::with_capacity(capacity + 1),
            timestamps: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn append(&mut self, cpu: f64, rps: f64, timestamp: u64) {
        self.cpu.push_back(cpu);
        self.rps.push_back(rps);
        self.timestamps.push_back(timestamp);

        if self.cpu.len() > self.capacity {
            self.cpu.pop_front();
            self.rps.pop_front();
            self.timestamps.pop_front();
        }
    }

    pub fn stats(&self) -> WindowStats {
        let cpu_mean = mean(&self.cpu);
        let rps_mean = mean(&self.rps);
        WindowStats {
            cpu_mean,
            cpu_stddev: stddev(&self.cpu, cpu_mean),
            rps_mean,
            rps_stddev: stddev(&self.rps, rps_mean),
            len: self.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cpu_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cpu.iter().copied()
    }

    pub fn rps_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rps.iter().copied()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.timestamps.iter().copied()
    }

    pub fn oldest_timestamp(&self) -> Option<u64> {
        self.timestamps.front().copied()
    }

    pub fn latest_timestamp(&self) -> Option<u64> {
        self.timestamps.back().copied()
    }
}

/// Arithmetic mean, 0 for an empty sequence.
pub fn mean<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0_f64, 0usize), |(sum, n), v| (sum + *v, n + 1));
    if n == 0 {
        return 0.0;
    }
    sum / n as f64
}

/// Population standard deviation (divisor `n`), 0 for an empty sequence.
pub fn stddev<'a>(values: impl IntoIterator<Item = &'a f64>, mean: f64) -> f64 {
    let (sq_sum, n) = values.into_iter().fold((0.0_f64, 0usize), |(acc, n), v| {
        let diff = *v - mean;
        (acc + diff * diff, n + 1)
    });
    if n == 0 {
        return 0.0;
    }
    (sq_sum / n as f64).sqrt()
}
