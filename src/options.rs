use crate::error::{EngineError, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Samples retained per device.
    pub window_size: usize,
    /// Z-score magnitude above which a reading is flagged.
    pub anomaly_threshold: f64,
    pub workers: usize,
    pub ingest_capacity: usize,
    pub result_capacity: usize,
    /// Upper bound on how long an idle worker waits before re-checking the stop flag.
    pub poll_interval: Duration,
    /// Pin worker `i` to core `i % cores`.
    pub pin_cores: bool,
    /// Record one in every N analysis latencies per worker; `None` disables sampling.
    pub latency_sample_rate: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            window_size: 50,
            anomaly_threshold: 2.0,
            workers: 4,
            ingest_capacity: 1000,
            result_capacity: 1000,
            poll_interval: Duration::from_millis(50),
            pin_cores: false,
            latency_sample_rate: None,
        }
    }
}

impl EngineOptions {
    pub fn validate(&self) -> Result<()> {
        positive("window_size", self.window_size)?;
        positive("workers", self.workers)?;
        positive("ingest_capacity", self.ingest_capacity)?;
        positive("result_capacity", self.result_capacity)?;

        if !self.anomaly_threshold.is_finite() || self.anomaly_threshold <= 0.0 {
            return Err(invalid(
                "anomaly_threshold",
                format!("must be a positive finite number, got {}", self.anomaly_threshold),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval", "must be non-zero".into()));
        }
        if self.latency_sample_rate == Some(0) {
            return Err(invalid("latency_sample_rate", "must be positive".into()));
        }
        Ok(())
    }
}

fn positive(option: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(invalid(option, "must be greater than 0".into()));
    }
    Ok(())
}

fn invalid(option: &'static str, reason: String) -> EngineError {
    EngineError::InvalidOption { option, reason }
}
