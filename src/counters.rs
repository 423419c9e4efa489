use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

/// Monotonic counters shared by the submitter and every worker.
#[derive(Debug, Default)]
pub struct EngineCounters {
    submitted: AtomicU64,
    dropped_readings: AtomicU64,
    processed: AtomicU64,
    published: AtomicU64,
    dropped_results: AtomicU64,
    anomalies: AtomicU64,
}

/// Point-in-time copy of [`EngineCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub submitted: u64,
    pub dropped_readings: u64,
    pub processed: u64,
    pub published: u64,
    pub dropped_results: u64,
    pub anomalies: u64,
}

impl EngineCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[inline(always)]
    pub(crate) fn record_submit(&self, accepted: bool) {
        self.submitted.fetch_add(1, Relaxed);
        if !accepted {
            // Published after `submitted`, so a reader that sees the drop sees the submit too.
            self.dropped_readings.fetch_add(1, Release);
        }
    }

    #[inline(always)]
    pub(crate) fn record_processed(&self, anomaly: bool) {
        self.processed.fetch_add(1, Relaxed);
        if anomaly {
            self.anomalies.fetch_add(1, Relaxed);
        }
    }

    #[inline(always)]
    pub(crate) fn record_publish(&self, accepted: bool) {
        if accepted {
            self.published.fetch_add(1, Relaxed);
        } else {
            self.dropped_results.fetch_add(1, Relaxed);
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let dropped_readings = self.dropped_readings.load(Acquire);
        CounterSnapshot {
            submitted: self.submitted.load(Relaxed),
            dropped_readings,
            processed: self.processed.load(Relaxed),
            published: self.published.load(Relaxed),
            dropped_results: self.dropped_results.load(Relaxed),
            anomalies: self.anomalies.load(Relaxed),
        }
    }
}

impl CounterSnapshot {
    /// Readings that made it into the ingestion queue.
    pub fn accepted(&self) -> u64 {
        self.submitted.saturating_sub(self.dropped_readings)
    }

    /// Accepted readings no worker has finished yet.
    pub fn in_flight(&self) -> u64 {
        self.accepted().saturating_sub(self.processed)
    }
}
