use hdrhistogram::Histogram;
use std::time::{Duration, Instant};

// 1ns to 1,000s, 3 significant figures.
const LOWEST_NANOS: u64 = 1;
const HIGHEST_NANOS: u64 = 1_000_000_000_000;

/// Latency percentiles in nanoseconds.
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub p999: u64,
}

/// Times the enclosed scope when the owning measurer decided to sample it.
pub struct LatencyGuard<'a> {
    measurer: &'a mut LatencyMeasurer,
    start: Option<Instant>,
}

impl Drop for LatencyGuard<'_> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            self.measurer.record(start.elapsed());
        }
    }
}

/// Sampling latency recorder backed by an HdrHistogram.
///
/// Only one in every `sample_rate` calls is timed, which keeps the overhead
/// on the per-reading path to a counter increment.
pub struct LatencyMeasurer {
    histogram: Histogram<u64>,
    sample_rate: u64,
    step: u64,
}

impl LatencyMeasurer {
    pub fn new(sample_rate: u64) -> Self {
        assert!(sample_rate > 0, "sample_rate must be positive");
        let histogram = Histogram::<u64>::new_with_bounds(LOWEST_NANOS, HIGHEST_NANOS, 3)
            .expect("constant histogram bounds are valid");
        Self {
            histogram,
            sample_rate,
            step: 0,
        }
    }

    /// Starts timing if this step is sampled; the guard records on drop.
    pub fn measure_with_guard(&mut self) -> LatencyGuard<'_> {
        self.step += 1;
        let start = self
            .step
            .is_multiple_of(self.sample_rate)
            .then(Instant::now);
        LatencyGuard {
            measurer: self,
            start,
        }
    }

    fn record(&mut self, duration: Duration) {
        let nanos = (duration.as_nanos() as u64).clamp(LOWEST_NANOS, HIGHEST_NANOS);
        self.histogram.saturating_record(nanos);
    }

    pub fn get_stats(&self) -> LatencyStats {
        let count = self.histogram.len();
        if count == 0 {
            return LatencyStats::default();
        }

        LatencyStats {
            count,
            min: self.histogram.min(),
            max: self.histogram.max(),
            mean: self.histogram.mean(),
            p50: self.histogram.value_at_quantile(0.5),
            p90: self.histogram.value_at_quantile(0.9),
            p99: self.histogram.value_at_quantile(0.99),
            p999: self.histogram.value_at_quantile(0.999),
        }
    }

    pub fn format_stats(&self) -> String {
        let stats = self.get_stats();
        if stats.count == 0 {
            return "no samples".into();
        }

        format!(
            "samples={}, min={}, mean={}, p50={}, p90={}, p99={}, p999={}, max={}",
            stats.count,
            format_duration(stats.min as f64),
            format_duration(stats.mean),
            format_duration(stats.p50 as f64),
            format_duration(stats.p90 as f64),
            format_duration(stats.p99 as f64),
            format_duration(stats.p999 as f64),
            format_duration(stats.max as f64),
        )
    }
}

fn format_duration(nanos: f64) -> String {
    if nanos < 1000.0 {
        format!("{:.1}ns", nanos)
    } else if nanos < 1_000_000.0 {
        format!("{:.1}us", nanos / 1000.0)
    } else if nanos < 1_000_000_000.0 {
        format!("{:.1}ms", nanos / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos / 1_000_000_000.0)
    }
}
