//! In-memory collaborators for engine tests

use async_trait::async_trait;
use filmsync_models::{ExternalId, ImdbRating, LetterboxdExport, ListId};
use filmsync_sources::{ActionResponse, ExportParser, IdResolver, ListResolver, RemoteActionClient, SourceError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub struct MockParser {
    export: Option<LetterboxdExport>,
}

impl MockParser {
    pub fn new(export: LetterboxdExport) -> Self {
        Self { export: Some(export) }
    }

    pub fn missing() -> Self {
        Self { export: None }
    }
}

impl ExportParser for MockParser {
    fn parse(&self, _path: &Path) -> Result<LetterboxdExport, SourceError> {
        self.export
            .clone()
            .ok_or_else(|| SourceError::MissingEntry("ratings.csv".to_string()))
    }
}

#[derive(Default)]
pub struct MockResolver {
    ids: HashMap<String, ExternalId>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, id: &str) -> Self {
        self.ids.insert(uri.to_string(), ExternalId::new(id));
        self
    }
}

#[async_trait]
impl IdResolver for MockResolver {
    async fn resolve(&self, source_uri: &str) -> Option<ExternalId> {
        self.ids.get(source_uri).cloned()
    }
}

/// Answers `Success` unless told otherwise for a title id, and records
/// every call it receives in dispatch order
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, ActionResponse>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, id: &str, response: ActionResponse) -> Self {
        self.responses.insert(id.to_string(), response);
        self
    }

    pub fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: String, id: &ExternalId) -> ActionResponse {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delays.get(id.as_str()) {
            tokio::time::sleep(*delay).await;
        }
        self.responses
            .get(id.as_str())
            .cloned()
            .unwrap_or(ActionResponse::Success)
    }
}

#[async_trait]
impl RemoteActionClient for MockClient {
    async fn rate(&self, id: &ExternalId, rating: ImdbRating) -> ActionResponse {
        self.answer(format!("rate {} {}", id, rating.value()), id).await
    }

    async fn add_to_watchlist(&self, id: &ExternalId) -> ActionResponse {
        self.answer(format!("watchlist {}", id), id).await
    }

    async fn add_to_list(&self, list: &ListId, id: &ExternalId) -> ActionResponse {
        self.answer(format!("list {} {}", list, id), id).await
    }
}

pub struct MockLists {
    id: Option<ListId>,
    lookups: Mutex<Vec<String>>,
}

impl MockLists {
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(ListId::new(id)),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            id: None,
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListResolver for MockLists {
    async fn find_or_create(&self, name: &str, _description: &str) -> Result<ListId, SourceError> {
        self.lookups.lock().unwrap().push(name.to_string());
        self.id.clone().ok_or_else(|| SourceError::Api {
            service: "IMDb",
            message: "list creation refused".to_string(),
        })
    }
}
