use crate::classifier::classify;
use crate::reading::{AnalysisResult, Reading};
use crate::registry::WindowRegistry;

/// Shared state the workers run readings through.
pub struct Analyzer {
    registry: WindowRegistry,
    threshold: f64,
}

impl Analyzer {
    pub fn new(window_size: usize, threshold: f64) -> Self {
        Self {
            registry: WindowRegistry::new(window_size),
            threshold,
        }
    }

    /// Appends `reading` to its device window and classifies it.
    ///
    /// The registry lock is released before the window lock is taken.
    pub fn analyze(&self, reading: &Reading) -> AnalysisResult {
        let window = self.registry.get_or_create(&reading.device_id);
        let stats = {
            let mut window = window.lock();
            window.append(reading.cpu, reading.rps, reading.timestamp);
            window.stats()
        };
        classify(reading, &stats, self.threshold)
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }
}
