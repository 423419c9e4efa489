use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// One telemetry sample for a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub device_id: String,
    /// Unix epoch milliseconds.
    pub timestamp: u64,
    pub cpu: f64,
    pub rps: f64,
}

impl Reading {
    pub fn new(device_id: impl Into<String>, timestamp: u64, cpu: f64, rps: f64) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            cpu,
            rps,
        }
    }

    /// Builds a reading stamped with the current wall clock time.
    pub fn now(device_id: impl Into<String>, cpu: f64, rps: f64) -> Self {
        Self::new(device_id, unix_millis(), cpu, rps)
    }
}

/// Classification label attached to every analysis result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnomalyKind {
    #[default]
    None,
    CpuSpike,
    CpuDrop,
    RpsSpike,
    RpsDrop,
    Multiple,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 6] = [
        AnomalyKind::None,
        AnomalyKind::CpuSpike,
        AnomalyKind::CpuDrop,
        AnomalyKind::RpsSpike,
        AnomalyKind::RpsDrop,
        AnomalyKind::Multiple,
    ];

    /// Stable label used by downstream consumers. Empty for [`AnomalyKind::None`].
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::None => "",
            AnomalyKind::CpuSpike => "CPU_SPIKE",
            AnomalyKind::CpuDrop => "CPU_DROP",
            AnomalyKind::RpsSpike => "RPS_SPIKE",
            AnomalyKind::RpsDrop => "RPS_DROP",
            AnomalyKind::Multiple => "MULTIPLE_ANOMALY",
        }
    }

    pub fn is_anomaly(&self) -> bool {
        !matches!(self, AnomalyKind::None)
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::None => write!(f, "NONE"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Outcome of analysing a single [`Reading`] against its device window.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub device_id: String,
    pub timestamp: u64,
    pub rolling_avg_cpu: f64,
    pub rolling_avg_rps: f64,
    pub is_anomaly: bool,
    /// Larger of the two z-score magnitudes.
    pub anomaly_score: f64,
    pub anomaly_kind: AnomalyKind,
    /// Larger of the two signal standard deviations.
    pub standard_dev: f64,
    pub z_cpu: f64,
    pub z_rps: f64,
}

pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
