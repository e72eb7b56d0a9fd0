use crate::breaker::RateLimitBreaker;
use crate::error::EngineError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::history::{HistoryLedger, PendingHistory, RunKey};
use crate::outcome::ItemError;
use crate::progress::ProgressObserver;
use crate::report::{Aggregator, TransferReport};
use crate::scheduler::{Concurrency, WorkerPool};
use crate::worker::TransferWorker;
use filmsync_config::{Config, PathManager};
use filmsync_models::{
    Action, ActionKind, ImdbRating, LetterboxdExport, ListId, Record, WorkItem, ORIGIN_FIELD,
    RATING_FIELD,
};
use filmsync_sources::SourceSet;
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Where a run currently is. Terminal states end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Loading,
    Deduplicating,
    Dispatching,
    Draining,
    Persisting,
    Finished(TerminalState),
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Loading => f.write_str("loading"),
            EngineState::Deduplicating => f.write_str("deduplicating"),
            EngineState::Dispatching => f.write_str("dispatching"),
            EngineState::Draining => f.write_str("draining"),
            EngineState::Persisting => f.write_str("persisting"),
            EngineState::Finished(terminal) => write!(f, "{}", terminal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Done,
    RateLimited,
    Interrupted,
    AuthenticationFailed,
}

impl TerminalState {
    /// Process exit status for this ending. Load failures exit with 1.
    pub fn exit_code(self) -> u8 {
        match self {
            TerminalState::Done => 0,
            TerminalState::RateLimited => 2,
            TerminalState::AuthenticationFailed => 3,
            TerminalState::Interrupted => 130,
        }
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminalState::Done => "done",
            TerminalState::RateLimited => "rate_limited",
            TerminalState::Interrupted => "interrupted",
            TerminalState::AuthenticationFailed => "authentication_failed",
        };
        f.write_str(name)
    }
}

/// Name and description of the IMDb list that receives watched, unrated films
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTarget {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub concurrency: Concurrency,
    /// Rating given to watched films that have none. `None` leaves them out.
    pub unrated_rating: Option<ImdbRating>,
    pub watchlist: bool,
    pub list: Option<ListTarget>,
    /// `None` runs without reading or writing history
    pub history: Option<HistoryLedger>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::default(),
            unrated_rating: None,
            watchlist: false,
            list: None,
            history: None,
        }
    }
}

impl TransferOptions {
    pub fn from_config(config: &Config, paths: &PathManager) -> Result<Self, EngineError> {
        let transfer = &config.transfer;
        let unrated_rating = transfer
            .unrated_rating
            .map(|value| {
                ImdbRating::new(value).ok_or_else(|| {
                    EngineError::Config(format!("unrated rating must be between 1 and 10, got {}", value))
                })
            })
            .transpose()?;

        let history = config.history.enabled.then(|| {
            let dir = config.history.dir.clone().unwrap_or_else(|| paths.history_dir());
            HistoryLedger::new(dir)
        });

        Ok(Self {
            concurrency: Concurrency::new(transfer.parallel)?,
            unrated_rating,
            watchlist: transfer.watchlist,
            list: transfer.list.as_ref().map(|list| ListTarget {
                name: list.name.clone(),
                description: list.description.clone(),
            }),
            history,
        })
    }
}

/// Files a run reads. Their content identifies the run's history.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub archive: PathBuf,
    pub cookie_file: PathBuf,
}

/// What the export contained and what became of it before dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub rated: usize,
    pub watched_unrated: usize,
    pub watchlist: usize,
    /// Watched, unrated films left out because no rating or list applies
    pub watched_ignored: usize,
    pub watchlist_ignored: usize,
    /// Rated films whose rating could not be converted
    pub invalid_ratings: usize,
    pub already_transferred: usize,
    pub duplicates: usize,
    pub list_unavailable: bool,
    pub queued: usize,
}

/// A loaded, deduplicated run waiting to be dispatched
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub run_key: RunKey,
    pub build: BuildSummary,
    pub items: Vec<WorkItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub terminal: TerminalState,
    pub run_key: RunKey,
    pub build: BuildSummary,
    pub report: TransferReport,
    /// New ledger entries written by this run
    pub persisted: usize,
    pub history_error: Option<String>,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl TransferResult {
    pub fn exit_code(&self) -> u8 {
        self.terminal.exit_code()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

/// Drives one transfer from export to ledger
pub struct TransferEngine {
    sources: SourceSet,
    options: TransferOptions,
}

impl TransferEngine {
    pub fn new(sources: SourceSet) -> Self {
        Self {
            sources,
            options: TransferOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Load, build and deduplicate, then dispatch
    pub async fn run(
        &self,
        inputs: &RunInputs,
        progress: &mut dyn ProgressObserver,
        interrupt: &CancellationToken,
    ) -> Result<TransferResult, EngineError> {
        let prepared = self.prepare(inputs).await?;
        Ok(self.execute(prepared, progress, interrupt).await)
    }

    /// Everything up to dispatch. Fails only while loading.
    #[instrument(skip_all, fields(archive = ?inputs.archive))]
    pub async fn prepare(&self, inputs: &RunInputs) -> Result<PreparedRun, EngineError> {
        self.enter(EngineState::Loading);
        let (run_key, history, export) = self.load(inputs).await?;
        info!(
            operation = "load",
            run_key = %run_key,
            rated = export.rated.len(),
            watched = export.watched.len(),
            watchlist = export.watchlist.len(),
            history = history.len(),
            "Loaded Letterboxd export"
        );

        self.enter(EngineState::Deduplicating);
        let (items, mut build) = self.build_work_items(&export).await;
        let items = deduplicate(items, &history, &mut build);

        if build.already_transferred > 0 {
            info!(
                "Skipping {} items already transferred by a previous run",
                build.already_transferred
            );
        }
        if build.duplicates > 0 {
            debug!("Dropped {} duplicate items", build.duplicates);
        }

        Ok(PreparedRun {
            run_key,
            build,
            items,
        })
    }

    async fn load(
        &self,
        inputs: &RunInputs,
    ) -> Result<(RunKey, HashSet<Fingerprint>, LetterboxdExport), EngineError> {
        let parser = self.sources.parser.clone();
        let ledger = self.options.history.clone();
        let archive = inputs.archive.clone();
        let cookie_file = inputs.cookie_file.clone();

        tokio::task::spawn_blocking(move || {
            let run_key = RunKey::from_files(&[cookie_file.as_path(), archive.as_path()]).map_err(EngineError::load)?;
            let history = match &ledger {
                Some(ledger) => ledger.load(&run_key).map_err(EngineError::load)?,
                None => HashSet::new(),
            };
            let export = parser.parse(&archive).map_err(EngineError::load)?;
            Ok::<_, EngineError>((run_key, history, export))
        })
        .await
        .map_err(EngineError::load)?
    }

    /// Turn the export into work items and count what was left out
    pub async fn build_work_items(&self, export: &LetterboxdExport) -> (Vec<WorkItem>, BuildSummary) {
        let mut items = Vec::new();
        let mut build = BuildSummary {
            rated: export.rated.len(),
            watchlist: export.watchlist.len(),
            ..BuildSummary::default()
        };

        for record in &export.rated {
            match record.star_rating().and_then(ImdbRating::from_stars) {
                Some(rating) => items.push(origin(record, Action::Rate { rating }, "ratings")),
                None => {
                    warn!("Skipping {}: rating {:?} is not usable", record.display_title(), record.get(RATING_FIELD));
                    build.invalid_ratings += 1;
                }
            }
        }

        let unrated = export.watched_unrated();
        build.watched_unrated = unrated.len();

        if let Some(rating) = self.options.unrated_rating {
            items.extend(unrated.iter().map(|r| origin(r, Action::Rate { rating }, "watched")));
        }

        let list_id = match &self.options.list {
            Some(target) if !unrated.is_empty() => self.resolve_list(target, &mut build).await,
            _ => None,
        };
        if let Some(list_id) = &list_id {
            items.extend(unrated.iter().map(|r| {
                origin(r, Action::AddToList { list_id: list_id.clone() }, "watched")
            }));
        }

        if self.options.unrated_rating.is_none() && list_id.is_none() {
            build.watched_ignored = unrated.len();
        }

        if self.options.watchlist {
            items.extend(export.watchlist.iter().map(|r| origin(r, Action::AddToWatchlist, "watchlist")));
        } else {
            build.watchlist_ignored = export.watchlist.len();
        }

        info!(
            operation = "build",
            items = items.len(),
            watched_ignored = build.watched_ignored,
            watchlist_ignored = build.watchlist_ignored,
            "Built work items"
        );
        (items, build)
    }

    async fn resolve_list(&self, target: &ListTarget, build: &mut BuildSummary) -> Option<ListId> {
        match self.sources.lists.find_or_create(&target.name, &target.description).await {
            Ok(id) => {
                info!("Adding watched films to IMDb list '{}' ({})", target.name, id);
                Some(id)
            }
            Err(e) => {
                warn!("Could not find or create IMDb list '{}', skipping list items: {}", target.name, e);
                build.list_unavailable = true;
                None
            }
        }
    }

    /// Dispatch, drain and persist. Never fails: problems end up in the
    /// report, the terminal state or `history_error`.
    #[instrument(skip_all, fields(run_key = %prepared.run_key, items = prepared.items.len()))]
    pub async fn execute(
        &self,
        prepared: PreparedRun,
        progress: &mut dyn ProgressObserver,
        interrupt: &CancellationToken,
    ) -> TransferResult {
        let start = Instant::now();
        let PreparedRun {
            run_key,
            mut build,
            items,
        } = prepared;
        build.queued = items.len();

        let breaker = Arc::new(RateLimitBreaker::new());
        let worker = TransferWorker::new(
            self.sources.resolver.clone(),
            self.sources.client.clone(),
            breaker.clone(),
        );
        let mut pending = PendingHistory::new(self.options.history.clone(), run_key.clone());
        let mut aggregator = Aggregator::new();
        if self.options.list.is_some() {
            aggregator.include_kind(ActionKind::List);
        }

        self.enter(EngineState::Dispatching);
        progress.start(items.len());

        let mut authentication_failed = false;
        {
            let mut outcomes = WorkerPool::new(self.options.concurrency).run(
                items,
                move |item| {
                    let worker = worker.clone();
                    async move { worker.execute(item).await }
                },
                &breaker,
                interrupt,
            );

            let mut draining = false;
            while let Some(outcome) = outcomes.next().await {
                if !draining && breaker.is_tripped() {
                    draining = true;
                    self.enter(EngineState::Draining);
                }
                if outcome.is_success() {
                    pending.record(fingerprint(outcome.item()));
                }
                aggregator.record(&outcome);
                progress.advance(&outcome);

                if outcome.error() == Some(&ItemError::Authentication) {
                    error!("Failed to authenticate with cookie, abandoning the run");
                    authentication_failed = true;
                    break;
                }
            }
            // Dropping the stream here abandons whatever is still in flight
        }
        progress.finish();

        let terminal = if authentication_failed {
            TerminalState::AuthenticationFailed
        } else if breaker.is_tripped() {
            TerminalState::RateLimited
        } else if interrupt.is_cancelled() {
            TerminalState::Interrupted
        } else {
            TerminalState::Done
        };

        self.enter(EngineState::Persisting);
        let recorded = pending.len();
        let (persisted, history_error) = match pending.commit() {
            Ok(added) => (added, None),
            Err(e) => {
                error!("Failed to save history for {} successful items: {}", recorded, e);
                (0, Some(e.to_string()))
            }
        };

        self.enter(EngineState::Finished(terminal));
        let report = aggregator.finish();
        info!(
            operation = "transfer",
            terminal = %terminal,
            succeeded = report.total_succeeded(),
            failed = report.total_failed(),
            persisted,
            duration_ms = start.elapsed().as_millis() as u64,
            "Transfer finished"
        );

        TransferResult {
            terminal,
            run_key,
            build,
            report,
            persisted,
            history_error,
            duration: start.elapsed(),
        }
    }

    fn enter(&self, state: EngineState) {
        match state {
            EngineState::Finished(TerminalState::Done) => debug!(state = %state, "Engine state"),
            EngineState::Finished(_) => warn!(state = %state, "Engine stopped early"),
            _ => debug!(state = %state, "Engine state"),
        }
    }
}

fn origin(record: &Record, action: Action, branch: &str) -> WorkItem {
    WorkItem::new(record.clone(), action).with_extra(ORIGIN_FIELD, branch)
}

/// Drop items whose fingerprint is in `history` or already queued
pub fn deduplicate(
    items: Vec<WorkItem>,
    history: &HashSet<Fingerprint>,
    build: &mut BuildSummary,
) -> Vec<WorkItem> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut queued = Vec::with_capacity(items.len());

    for item in items {
        let fp = fingerprint(&item);
        if history.contains(&fp) {
            build.already_transferred += 1;
        } else if !seen.insert(fp) {
            build.duplicates += 1;
        } else {
            queued.push(item);
        }
    }
    queued
}
