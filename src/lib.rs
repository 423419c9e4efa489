mod analyzer;
mod classifier;
mod counters;
mod engine;
mod error;
pub mod measure;
mod options;
mod queue;
mod reading;
mod registry;
mod window;

pub use crate::analyzer::Analyzer;
pub use crate::classifier::{classify, z_score};
pub use crate::counters::{CounterSnapshot, EngineCounters};
pub use crate::engine::{EngineStats, WindowEngine};
pub use crate::error::{EngineError, Result};
pub use crate::options::EngineOptions;
pub use crate::queue::{Offer, bounded};
pub use crate::reading::{AnalysisResult, AnomalyKind, Reading, unix_millis};
pub use crate::registry::{SharedWindow, WindowRegistry};
pub use crate::window::{SlidingWindow, WindowStats, mean, stddev};
