//! Builds the concrete collaborators from configuration.

use crate::error::SourceError;
use crate::imdb::ImdbClient;
use crate::letterboxd::{LetterboxdArchive, LetterboxdResolver};
use crate::traits::{ExportParser, IdResolver, ListResolver, RemoteActionClient};
use filmsync_config::{HttpSettings, ImdbCookie};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Shared HTTP client. The timeout applies to every resolver and IMDb call.
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, SourceError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .user_agent(settings.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// The collaborators the transfer engine talks to
pub struct SourceSet {
    pub parser: Arc<dyn ExportParser>,
    pub resolver: Arc<dyn IdResolver>,
    pub client: Arc<dyn RemoteActionClient>,
    pub lists: Arc<dyn ListResolver>,
}

impl SourceSet {
    /// Letterboxd export in, IMDb out
    pub fn letterboxd_to_imdb(settings: &HttpSettings, cookie: ImdbCookie) -> Result<Self, SourceError> {
        let http = build_http_client(settings)?;
        let imdb = Arc::new(ImdbClient::new(http.clone(), cookie));

        Ok(Self {
            parser: Arc::new(LetterboxdArchive),
            resolver: Arc::new(LetterboxdResolver::new(http)?),
            client: imdb.clone(),
            lists: imdb,
        })
    }
}
