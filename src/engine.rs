use crate::analyzer::Analyzer;
use crate::counters::{CounterSnapshot, EngineCounters};
use crate::error::{EngineError, Result};
use crate::measure::LatencyMeasurer;
use crate::options::EngineOptions;
use crate::queue::{Offer, bounded};
use crate::reading::{AnalysisResult, Reading};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use spdlog::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Read-only view of the engine for telemetry exporters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStats {
    pub tracked_devices: usize,
    pub window_size: usize,
    pub anomaly_threshold: f64,
    /// Readings waiting in the ingestion queue.
    pub queue_depth: usize,
    pub result_queue_depth: usize,
}

enum Lifecycle {
    Idle,
    Running(Vec<thread::JoinHandle<()>>),
    Stopped,
}

/// Multi-threaded sliding-window analytics engine.
///
/// Readings go through a bounded ingestion queue to a fixed pool of worker
/// threads; each worker updates the reading's device window, classifies it and
/// offers the result to a bounded result queue. Both queues drop on full.
///
/// `stop` raises the shared stop flag, joins every worker and only then closes
/// the queues, so the result stream ends after the last in-flight reading has
/// been published.
pub struct WindowEngine {
    options: EngineOptions,
    analyzer: Arc<Analyzer>,
    counters: Arc<EngineCounters>,
    running: Arc<AtomicBool>,
    ingest_tx: RwLock<Option<Sender<Reading>>>,
    ingest_rx: Receiver<Reading>,
    result_tx: Mutex<Option<Sender<AnalysisResult>>>,
    result_rx: Receiver<AnalysisResult>,
    lifecycle: Mutex<Lifecycle>,
}

impl WindowEngine {
    pub fn new(options: EngineOptions) -> Result<Self> {
        options.validate()?;

        let (ingest_tx, ingest_rx) = bounded(options.ingest_capacity);
        let (result_tx, result_rx) = bounded(options.result_capacity);

        Ok(Self {
            analyzer: Arc::new(Analyzer::new(
                options.window_size,
                options.anomaly_threshold,
            )),
            counters: EngineCounters::new(),
            running: Arc::new(AtomicBool::new(true)),
            ingest_tx: RwLock::new(Some(ingest_tx)),
            ingest_rx,
            result_tx: Mutex::new(Some(result_tx)),
            result_rx,
            lifecycle: Mutex::new(Lifecycle::Idle),
            options,
        })
    }

    /// Builds an engine and starts its worker pool.
    pub fn start_with(options: EngineOptions) -> Result<Self> {
        let engine = Self::new(options)?;
        engine.start()?;
        Ok(engine)
    }

    /// Spawns `options.workers` worker threads.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running(_) => return Err(EngineError::AlreadyStarted),
            Lifecycle::Stopped => return Err(EngineError::Stopped),
        }

        let results = self
            .result_tx
            .lock()
            .clone()
            .ok_or(EngineError::Stopped)?;

        let mut handlers = Vec::with_capacity(self.options.workers);
        for worker_id in 0..self.options.workers {
            match self.spawn_worker(worker_id, results.clone()) {
                Ok(handler) => handlers.push(handler),
                Err(err) => {
                    // Already spawned workers are joined by `stop`.
                    *lifecycle = Lifecycle::Running(handlers);
                    return Err(err);
                }
            }
        }
        *lifecycle = Lifecycle::Running(handlers);

        info!(
            "[Engine] Started {} workers (window_size={}, threshold={:.2}, ingest_capacity={}, result_capacity={})",
            self.options.workers,
            self.options.window_size,
            self.options.anomaly_threshold,
            self.options.ingest_capacity,
            self.options.result_capacity
        );
        Ok(())
    }

    fn spawn_worker(
        &self,
        worker_id: usize,
        results: Sender<AnalysisResult>,
    ) -> Result<thread::JoinHandle<()>> {
        let running = self.running.clone();
        let analyzer = self.analyzer.clone();
        let counters = self.counters.clone();
        let readings = self.ingest_rx.clone();
        let poll_interval = self.options.poll_interval;
        let pin_cores = self.options.pin_cores;
        let mut measurer = self.options.latency_sample_rate.map(LatencyMeasurer::new);

        thread::Builder::new()
            .name(format!("windowpulse-worker-{}", worker_id))
            .spawn(move || {
                if pin_cores {
                    if let Some(core_ids) = core_affinity::get_core_ids() {
                        if let Some(core_id) = core_ids.get(worker_id % core_ids.len()) {
                            core_affinity::set_for_current(*core_id);
                        }
                    }
                }

                while running.load(Ordering::Relaxed) {
                    let reading = match readings.recv_timeout(poll_interval) {
                        Ok(reading) => reading,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    };

                    // A dequeued reading always runs to completion.
                    let result = match measurer.as_mut() {
                        Some(measurer) => {
                            let _guard = measurer.measure_with_guard();
                            analyzer.analyze(&reading)
                        }
                        None => analyzer.analyze(&reading),
                    };
                    counters.record_processed(result.is_anomaly);
                    counters.record_publish(results.offer(result));
                }

                if let Some(measurer) = measurer {
                    info!("[Latency/Worker:{}] {}", worker_id, measurer.format_stats());
                }
                debug!("[Worker:{}] Exited", worker_id);
            })
            .map_err(|err| EngineError::WorkerSpawn {
                worker: worker_id,
                reason: err.to_string(),
            })
    }

    /// Offers a reading to the ingestion queue without blocking.
    ///
    /// Returns `false` when the reading was dropped: the queue is full or the
    /// engine has been stopped.
    pub fn submit(&self, reading: Reading) -> bool {
        let accepted = self
            .ingest_tx
            .read()
            .as_ref()
            .is_some_and(|tx| tx.offer(reading));
        self.counters.record_submit(accepted);
        accepted
    }

    /// Submits every reading and returns how many were accepted.
    pub fn submit_batch(&self, readings: impl IntoIterator<Item = Reading>) -> usize {
        readings
            .into_iter()
            .map(|reading| self.submit(reading))
            .filter(|accepted| *accepted)
            .count()
    }

    /// Stream of analysis results.
    ///
    /// Receivers returned by separate calls share one queue; each result is
    /// delivered to exactly one of them. Iteration ends once the engine has
    /// stopped and the queue is drained.
    pub fn results(&self) -> Receiver<AnalysisResult> {
        self.result_rx.clone()
    }

    /// Raises the stop flag, joins all workers, then closes both queues.
    ///
    /// Idempotent. Readings still waiting in the ingestion queue are discarded.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped);
        let handlers = match previous {
            Lifecycle::Stopped => return,
            Lifecycle::Idle => Vec::new(),
            Lifecycle::Running(handlers) => handlers,
        };

        self.running.store(false, Ordering::Relaxed);
        for handler in handlers {
            if handler.join().is_err() {
                warn!("[Engine] A worker panicked before shutdown");
            }
        }

        // Every worker has exited: nothing can send on these any more.
        self.ingest_tx.write().take();
        self.result_tx.lock().take();

        let counters = self.counters.snapshot();
        info!(
            "[Engine] Stopped: submitted={}, dropped_readings={}, processed={}, published={}, dropped_results={}, unprocessed={}",
            counters.submitted,
            counters.dropped_readings,
            counters.processed,
            counters.published,
            counters.dropped_results,
            self.ingest_rx.len()
        );
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock(), Lifecycle::Running(_))
    }

    /// Waits until every accepted reading has been processed, or `timeout`.
    ///
    /// Returns `true` if the engine went idle in time.
    pub fn await_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.counters.snapshot().in_flight() == 0 {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            sleep(Duration::from_millis(1));
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            tracked_devices: self.analyzer.registry().tracked_devices(),
            window_size: self.options.window_size,
            anomaly_threshold: self.options.anomaly_threshold,
            queue_depth: self.ingest_rx.len(),
            result_queue_depth: self.result_rx.len(),
        }
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }
}

impl Drop for WindowEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(workers: usize) -> EngineOptions {
        EngineOptions {
            window_size: 8,
            workers,
            poll_interval: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_twice_fails() {
        let engine = WindowEngine::start_with(options(1)).unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.start(), Err(EngineError::AlreadyStarted));
    }

    #[test]
    fn test_start_after_stop_fails() {
        let engine = WindowEngine::new(options(1)).unwrap();
        engine.stop();
        assert_eq!(engine.start(), Err(EngineError::Stopped));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_submit_after_stop_is_dropped() {
        let engine = WindowEngine::start_with(options(2)).unwrap();
        engine.stop();
        assert!(!engine.submit(Reading::new("d", 1, 1.0, 1.0)));
        let counters = engine.counters();
        assert_eq!(counters.submitted, 1);
        assert_eq!(counters.dropped_readings, 1);
    }

    #[test]
    fn test_stats_reflect_configuration() {
        let engine = WindowEngine::new(options(1)).unwrap();
        engine.submit(Reading::new("d", 1, 1.0, 1.0));
        let stats = engine.stats();
        assert_eq!(stats.window_size, 8);
        assert_eq!(stats.anomaly_threshold, 2.0);
        assert_eq!(stats.queue_depth, 1);
        assert_eq!(stats.tracked_devices, 0);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let result = WindowEngine::new(EngineOptions {
            workers: 0,
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(EngineError::InvalidOption {
                option: "workers",
                ..
            })
        ));
    }

    #[test]
    fn test_latency_sampling_worker_runs() {
        let engine = WindowEngine::start_with(EngineOptions {
            latency_sample_rate: Some(1),
            ..options(1)
        })
        .unwrap();
        assert!(engine.submit(Reading::new("d", 1, 1.0, 1.0)));
        assert!(engine.await_idle(Duration::from_secs(5)));
        engine.stop();
        assert_eq!(engine.results().iter().count(), 1);
    }
}
