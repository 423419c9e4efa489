use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid option `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },
    #[error("engine workers are already running")]
    AlreadyStarted,
    #[error("engine has been stopped")]
    Stopped,
    #[error("failed to spawn worker {worker}: {reason}")]
    WorkerSpawn { worker: usize, reason: String },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
