use crate::reading::{AnalysisResult, AnomalyKind, Reading};
use crate::window::WindowStats;

/// Z-score of `value`, or 0 when the window has no spread.
#[inline(always)]
pub fn z_score(value: f64, mean: f64, stddev: f64) -> f64 {
    if stddev > 0.0 {
        (value - mean) / stddev
    } else {
        0.0
    }
}

/// Scores `reading` against `stats` and labels the outcome.
///
/// `stats` must already include `reading` itself; the value is scored against
/// the window it has just joined. With fewer than two samples both deviations
/// are 0, so nothing can be flagged until the window has some history.
pub fn classify(reading: &Reading, stats: &WindowStats, threshold: f64) -> AnalysisResult {
    let z_cpu = z_score(reading.cpu, stats.cpu_mean, stats.cpu_stddev);
    let z_rps = z_score(reading.rps, stats.rps_mean, stats.rps_stddev);

    let cpu_hit = z_cpu.abs() > threshold;
    let rps_hit = z_rps.abs() > threshold;

    let anomaly_kind = match (cpu_hit, rps_hit) {
        (true, true) => AnomalyKind::Multiple,
        (true, false) if z_cpu > 0.0 => AnomalyKind::CpuSpike,
        (true, false) => AnomalyKind::CpuDrop,
        (false, true) if z_rps > 0.0 => AnomalyKind::RpsSpike,
        (false, true) => AnomalyKind::RpsDrop,
        (false, false) => AnomalyKind::None,
    };

    AnalysisResult {
        device_id: reading.device_id.clone(),
        timestamp: reading.timestamp,
        rolling_avg_cpu: stats.cpu_mean,
        rolling_avg_rps: stats.rps_mean,
        is_anomaly: cpu_hit || rps_hit,
        anomaly_score: z_cpu.abs().max(z_rps.abs()),
        anomaly_kind,
        standard_dev: stats.cpu_stddev.max(stats.rps_stddev),
        z_cpu,
        z_rps,
    }
}
