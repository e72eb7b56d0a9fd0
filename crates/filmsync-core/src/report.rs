use crate::outcome::Outcome;
use filmsync_models::ActionKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// A failed item as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub title: String,
    pub year: Option<u32>,
    pub detail: String,
}

impl FailureEntry {
    /// `Title (Year): detail`
    pub fn line(&self) -> String {
        match &self.year {
            Some(year) => format!("{} ({}): {}", self.title, year, self.detail),
            None => format!("{}: {}", self.title, self.detail),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub succeeded: usize,
    pub failures: Vec<FailureEntry>,
}

/// Per action kind: how many succeeded and which failed, with details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    by_kind: BTreeMap<ActionKind, KindSummary>,
}

impl TransferReport {
    pub fn kind(&self, kind: ActionKind) -> Option<&KindSummary> {
        self.by_kind.get(&kind)
    }

    pub fn succeeded(&self, kind: ActionKind) -> usize {
        self.kind(kind).map_or(0, |s| s.succeeded)
    }

    pub fn failures(&self, kind: ActionKind) -> &[FailureEntry] {
        self.kind(kind).map(|s| s.failures.as_slice()).unwrap_or(&[])
    }

    pub fn total_succeeded(&self) -> usize {
        self.by_kind.values().map(|s| s.succeeded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.by_kind.values().map(|s| s.failures.len()).sum()
    }

    /// Human summary: success counts first, then each kind's errors with one
    /// indented line per failure. Lists only appear when a list was in play.
    pub fn summary_lines(&self) -> Vec<String> {
        let include_list = self.by_kind.contains_key(&ActionKind::List);
        let kinds: Vec<ActionKind> = ActionKind::ALL
            .into_iter()
            .filter(|k| *k != ActionKind::List || include_list)
            .collect();

        let mut lines: Vec<String> = kinds
            .iter()
            .map(|k| format!("Successfully {}: {}", success_phrase(*k), self.succeeded(*k)))
            .collect();

        for kind in &kinds {
            let failures = self.failures(*kind);
            lines.push(format!("{} {} errors", failures.len(), error_noun(*kind)));
            lines.extend(failures.iter().map(|f| format!("\t{}", f.line())));
        }
        lines
    }
}

fn success_phrase(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Rate => "rated",
        ActionKind::Watchlist => "added to watchlist",
        ActionKind::List => "added to list",
    }
}

fn error_noun(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Rate => "rating",
        ActionKind::Watchlist => "watchlist",
        ActionKind::List => "list",
    }
}

/// Folds outcomes into a report as they arrive
#[derive(Debug, Default)]
pub struct Aggregator {
    report: TransferReport,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &Outcome) {
        let summary = self.report.by_kind.entry(outcome.kind()).or_default();
        match outcome {
            Outcome::Success { .. } => summary.succeeded += 1,
            Outcome::Failure { item, error } => summary.failures.push(FailureEntry {
                title: item.record().title().to_string(),
                year: item.record().year(),
                detail: error.to_string(),
            }),
        }
    }

    /// Make sure a kind shows up in the report even with no outcomes
    pub fn include_kind(&mut self, kind: ActionKind) {
        self.report.by_kind.entry(kind).or_default();
    }

    pub fn report(&self) -> &TransferReport {
        &self.report
    }

    pub fn finish(self) -> TransferReport {
        self.report
    }
}
