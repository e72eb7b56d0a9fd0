use crate::history::HistoryError;
use crate::scheduler::InvalidConcurrency;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Inputs could not be read; nothing was dispatched
    #[error("Failed to load inputs: {0}")]
    Load(#[source] BoxError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl EngineError {
    pub fn load(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        EngineError::Load(Box::new(error))
    }
}

impl From<InvalidConcurrency> for EngineError {
    fn from(error: InvalidConcurrency) -> Self {
        EngineError::Config(error.to_string())
    }
}
