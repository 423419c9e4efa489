use clap::Parser;
use rand::Rng;
use spdlog::{error, info, warn};
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use windowpulse::{AnomalyKind, EngineOptions, Reading, WindowEngine};

/// Drives the window analytics engine with a synthetic device fleet.
#[derive(Parser, Debug)]
#[command(name = "windowpulse", version, about)]
struct Cli {
    /// Samples retained per device window.
    #[arg(long, env = "WINDOW_SIZE", default_value_t = 50)]
    window_size: usize,

    /// Z-score magnitude above which a reading is flagged.
    #[arg(long, env = "ANOMALY_THRESHOLD", default_value_t = 2.0)]
    threshold: f64,

    #[arg(long, env = "WORKERS", default_value_t = 4)]
    workers: usize,

    #[arg(long, env = "INGEST_CAPACITY", default_value_t = 1000)]
    ingest_capacity: usize,

    #[arg(long, env = "RESULT_CAPACITY", default_value_t = 1000)]
    result_capacity: usize,

    /// Number of simulated devices.
    #[arg(long, default_value_t = 100)]
    devices: usize,

    /// Target readings per second across all devices.
    #[arg(long, default_value_t = 10_000)]
    rate: u64,

    #[arg(long, default_value_t = 10)]
    duration_secs: u64,

    /// Inject a spike every N readings (0 disables injection).
    #[arg(long, default_value_t = 500)]
    spike_every: u64,

    #[arg(long, default_value_t = 5)]
    stats_interval_secs: u64,

    /// Pin worker threads to CPU cores.
    #[arg(long)]
    pin_cores: bool,

    /// Sample one in N analysis latencies per worker.
    #[arg(long)]
    latency_sample_rate: Option<u64>,
}

impl Cli {
    fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            window_size: self.window_size,
            anomaly_threshold: self.threshold,
            workers: self.workers,
            ingest_capacity: self.ingest_capacity,
            result_capacity: self.result_capacity,
            pin_cores: self.pin_cores,
            latency_sample_rate: self.latency_sample_rate,
            ..Default::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = spdlog::init_env_level() {
        eprintln!("ignoring SPDLOG_RUST_LEVEL: {}", err);
    }

    if cli.devices == 0 || cli.rate == 0 {
        error!("--devices and --rate must be greater than 0");
        return ExitCode::FAILURE;
    }

    let engine = match WindowEngine::start_with(cli.engine_options()) {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            error!("Failed to start engine: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let consumer = spawn_result_consumer(&engine);
    let reporting = Arc::new(AtomicBool::new(true));
    let reporter = spawn_stats_reporter(
        engine.clone(),
        reporting.clone(),
        Duration::from_secs(cli.stats_interval_secs.max(1)),
    );

    let started = Instant::now();
    let submitted = generate_load(&engine, &cli);
    let elapsed = started.elapsed();

    reporting.store(false, Ordering::Relaxed);
    engine.stop();

    let by_kind = consumer.join().unwrap_or_default();
    if reporter.join().is_err() {
        warn!("Stats reporter panicked");
    }

    let counters = engine.counters();
    info!(
        "Done in {:.2}s: submitted={}, throughput={}/s, processed={}, dropped_readings={}, dropped_results={}, anomalies={}",
        elapsed.as_secs_f64(),
        submitted,
        format_count(counters.processed as f64 / elapsed.as_secs_f64()),
        counters.processed,
        counters.dropped_readings,
        counters.dropped_results,
        counters.anomalies
    );
    for kind in AnomalyKind::ALL {
        if let Some(count) = by_kind.get(&kind) {
            info!("  {:<16} {}", kind.to_string(), count);
        }
    }

    ExitCode::SUCCESS
}

/// Drains the result stream until the engine closes it.
fn spawn_result_consumer(engine: &WindowEngine) -> thread::JoinHandle<HashMap<AnomalyKind, u64>> {
    let results = engine.results();
    thread::spawn(move || {
        let mut by_kind: HashMap<AnomalyKind, u64> = HashMap::new();
        for result in results.iter() {
            if result.is_anomaly {
                warn!(
                    "ANOMALY DETECTED: device={}, type={}, score={:.2}, avg_cpu={:.2}, avg_rps={:.2}",
                    result.device_id,
                    result.anomaly_kind,
                    result.anomaly_score,
                    result.rolling_avg_cpu,
                    result.rolling_avg_rps
                );
            }
            *by_kind.entry(result.anomaly_kind).or_default() += 1;
        }
        by_kind
    })
}

fn spawn_stats_reporter(
    engine: Arc<WindowEngine>,
    reporting: Arc<AtomicBool>,
    interval: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_report = Instant::now();
        while reporting.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(50));
            if last_report.elapsed() < interval {
                continue;
            }
            last_report = Instant::now();

            let stats = engine.stats();
            let counters = engine.counters();
            info!(
                "[Stats] devices={}, queue_depth={}, result_queue_depth={}, processed={}, dropped_readings={}, anomalies={}",
                stats.tracked_devices,
                stats.queue_depth,
                stats.result_queue_depth,
                format_count(counters.processed as f64),
                counters.dropped_readings,
                counters.anomalies
            );
        }
    })
}

/// Paces synthetic readings at `cli.rate` for `cli.duration_secs`.
fn generate_load(engine: &WindowEngine, cli: &Cli) -> u64 {
    let mut rng = rand::thread_rng();
    let baselines: Vec<(f64, f64)> = (0..cli.devices)
        .map(|_| (rng.gen_range(10.0..60.0), rng.gen_range(50.0..500.0)))
        .collect();

    let deadline = Instant::now() + Duration::from_secs(cli.duration_secs);
    let batch = (cli.rate / 100).max(1);
    let tick = Duration::from_secs_f64(batch as f64 / cli.rate as f64);
    let mut submitted = 0u64;

    while Instant::now() < deadline {
        let tick_start = Instant::now();
        for _ in 0..batch {
            let device = (submitted % cli.devices as u64) as usize;
            let (cpu_base, rps_base) = baselines[device];
            let mut cpu = cpu_base * (1.0 + rng.gen_range(-0.05..0.05));
            let mut rps = rps_base * (1.0 + rng.gen_range(-0.05..0.05));

            if cli.spike_every > 0 && submitted > 0 && submitted.is_multiple_of(cli.spike_every) {
                match rng.gen_range(0..3) {
                    0 => cpu *= 3.0,
                    1 => rps *= 4.0,
                    _ => {
                        cpu *= 3.0;
                        rps *= 0.1;
                    }
                }
            }

            engine.submit(Reading::now(format!("device-{:04}", device), cpu, rps));
            submitted += 1;
        }

        if let Some(rest) = tick.checked_sub(tick_start.elapsed()) {
            thread::sleep(rest);
        }
    }
    submitted
}

fn format_count(val: f64) -> String {
    if val < 1000.0 {
        format!("{:.0}", val)
    } else if val < 1_000_000.0 {
        format!("{:.2}k", val / 1000.0)
    } else {
        format!("{:.2}m", val / 1_000_000.0)
    }
}
