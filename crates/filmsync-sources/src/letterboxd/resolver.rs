use crate::error::SourceError;
use crate::traits::IdResolver;
use async_trait::async_trait;
use filmsync_models::ExternalId;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, trace};

/// Film pages link to IMDb as `.../title/tt0113277/maindetails`
const IMDB_LINK_PATTERN: &str = r#"href="[^"]*title/(tt\d+)/maindetails""#;

/// Finds the IMDb identifier by scraping the Letterboxd film page
pub struct LetterboxdResolver {
    client: Client,
    imdb_link: Regex,
}

impl LetterboxdResolver {
    pub fn new(client: Client) -> Result<Self, SourceError> {
        Ok(Self {
            client,
            imdb_link: Regex::new(IMDB_LINK_PATTERN)?,
        })
    }

    /// First IMDb title linked from the page, if any
    pub fn extract_imdb_id(&self, html: &str) -> Option<ExternalId> {
        self.imdb_link
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| ExternalId::new(m.as_str()))
    }
}

#[async_trait]
impl IdResolver for LetterboxdResolver {
    async fn resolve(&self, source_uri: &str) -> Option<ExternalId> {
        let response = match self.client.get(source_uri).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Letterboxd lookup failed for {}: {}", source_uri, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!("Letterboxd returned {} for {}", status, source_uri);
            return None;
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                debug!("Failed to read Letterboxd page {}: {}", source_uri, e);
                return None;
            }
        };

        let id = self.extract_imdb_id(&html);
        trace!("Resolved {} -> {:?}", source_uri, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LetterboxdResolver {
        LetterboxdResolver::new(Client::new()).unwrap()
    }

    #[test]
    fn test_extract_imdb_id() {
        let html = r#"<p class="text-link text-footer">
            More at <a href="http://www.imdb.com/title/tt0113277/maindetails" class="micro-button track-event" data-track-action="IMDb">IMDb</a>
            <a href="https://www.themoviedb.org/movie/949/" class="micro-button">TMDb</a></p>"#;

        assert_eq!(resolver().extract_imdb_id(html), Some(ExternalId::new("tt0113277")));
    }

    #[test]
    fn test_first_link_wins() {
        let html = r#"<a href="https://www.imdb.com/title/tt0000001/maindetails">a</a>
            <a href="https://www.imdb.com/title/tt0000002/maindetails">b</a>"#;

        assert_eq!(resolver().extract_imdb_id(html), Some(ExternalId::new("tt0000001")));
    }

    #[test]
    fn test_no_link() {
        let html = r#"<a href="https://www.imdb.com/title/tt0113277/">no maindetails suffix</a>"#;
        assert_eq!(resolver().extract_imdb_id(html), None);
    }
}
