use crate::action::{Action, ActionKind};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extra field naming the export branch a work item was built from
pub const ORIGIN_FIELD: &str = "Origin";

/// One record paired with one remote action. Built once by the engine and
/// handed to exactly one worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItem {
    record: Record,
    action: Action,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, String>,
}

impl WorkItem {
    pub fn new(record: Record, action: Action) -> Self {
        Self {
            record,
            action,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }
}
