use filmsync_models::{ActionKind, ExternalId, WorkItem};
use serde::Serialize;
use thiserror::Error;

/// Why a single work item failed. Never aborts the run on its own, except
/// `Authentication`, which the engine treats as terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ItemError {
    #[error("Cannot find external title")]
    NotFound,

    #[error("{0}")]
    Remote(String),

    #[error("Rate limited by IMDb")]
    RateLimited,

    #[error("Skipped because IMDb is rate limiting")]
    Skipped,

    #[error("Failed to authenticate with cookie")]
    Authentication,
}

impl ItemError {
    /// Short stable label, used for grouping in logs
    pub fn category(&self) -> &'static str {
        match self {
            ItemError::NotFound => "not_found",
            ItemError::Remote(_) => "remote",
            ItemError::RateLimited => "rate_limited",
            ItemError::Skipped => "skipped",
            ItemError::Authentication => "authentication",
        }
    }
}

/// What became of one work item
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { item: WorkItem, external_id: ExternalId },
    Failure { item: WorkItem, error: ItemError },
}

impl Outcome {
    pub fn failure(item: WorkItem, error: ItemError) -> Self {
        Outcome::Failure { item, error }
    }

    pub fn item(&self) -> &WorkItem {
        match self {
            Outcome::Success { item, .. } | Outcome::Failure { item, .. } => item,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.item().kind()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn error(&self) -> Option<&ItemError> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }
}
