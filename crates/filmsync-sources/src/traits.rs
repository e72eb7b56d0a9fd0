use crate::error::SourceError;
use crate::response::ActionResponse;
use async_trait::async_trait;
use filmsync_models::{ExternalId, ImdbRating, LetterboxdExport, ListId};
use std::path::Path;

/// Reads the record collections of a catalog export
pub trait ExportParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<LetterboxdExport, SourceError>;
}

/// Maps a source page URI to the destination service's title identifier.
///
/// Returns `None` both when no mapping exists and when the lookup itself
/// failed; callers cannot tell the two apart.
#[async_trait]
pub trait IdResolver: Send + Sync {
    async fn resolve(&self, source_uri: &str) -> Option<ExternalId>;
}

/// Remote writes on the destination service, one per action kind
#[async_trait]
pub trait RemoteActionClient: Send + Sync {
    async fn rate(&self, id: &ExternalId, rating: ImdbRating) -> ActionResponse;
    async fn add_to_watchlist(&self, id: &ExternalId) -> ActionResponse;
    async fn add_to_list(&self, list: &ListId, id: &ExternalId) -> ActionResponse;
}

/// Finds a user list by name, creating it when it does not exist yet
#[async_trait]
pub trait ListResolver: Send + Sync {
    async fn find_or_create(&self, name: &str, description: &str) -> Result<ListId, SourceError>;
}
