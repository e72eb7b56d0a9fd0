pub mod breaker;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod history;
pub mod outcome;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod worker;

#[cfg(test)]
mod testing;

pub use breaker::RateLimitBreaker;
pub use engine::{
    deduplicate, BuildSummary, EngineState, ListTarget, PreparedRun, RunInputs, TerminalState,
    TransferEngine, TransferOptions, TransferResult,
};
pub use error::EngineError;
pub use fingerprint::{fingerprint, Fingerprint};
pub use history::{HistoryError, HistoryLedger, PendingHistory, RunKey};
pub use outcome::{ItemError, Outcome};
pub use progress::{LogProgress, NoProgress, ProgressObserver};
pub use report::{Aggregator, FailureEntry, KindSummary, TransferReport};
pub use scheduler::{Concurrency, InvalidConcurrency, WorkerPool};
pub use worker::TransferWorker;
