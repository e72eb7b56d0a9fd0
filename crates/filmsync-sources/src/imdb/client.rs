use crate::error::SourceError;
use crate::imdb::graphql::{self, GraphQlResponse};
use crate::response::ActionResponse;
use crate::traits::{ListResolver, RemoteActionClient};
use async_trait::async_trait;
use filmsync_config::ImdbCookie;
use filmsync_models::{ExternalId, ImdbRating, ListId};
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, info, trace};

pub const GRAPHQL_URL: &str = "https://api.graphql.imdb.com/";
pub const WEB_URL: &str = "https://www.imdb.com";

/// IMDb writes authenticated with the user's session cookie.
///
/// The cookie is fixed at construction; every request made through this
/// client carries it.
pub struct ImdbClient {
    http: Client,
    cookie: ImdbCookie,
    graphql_url: String,
    web_url: String,
}

impl ImdbClient {
    pub fn new(http: Client, cookie: ImdbCookie) -> Self {
        Self {
            http,
            cookie,
            graphql_url: GRAPHQL_URL.to_string(),
            web_url: WEB_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoints(mut self, graphql_url: impl Into<String>, web_url: impl Into<String>) -> Self {
        self.graphql_url = graphql_url.into();
        self.web_url = web_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn watchlist_url(&self, id: &ExternalId) -> String {
        format!("{}/watchlist/{}", self.web_url, id)
    }

    async fn post_graphql(&self, body: &Value) -> Result<(reqwest::StatusCode, String), reqwest::Error> {
        let response = self
            .http
            .post(&self.graphql_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, self.cookie.as_str())
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    async fn mutation(&self, body: Value, context: &str) -> ActionResponse {
        match self.post_graphql(&body).await {
            Ok((status, text)) => graphql::classify_graphql(status, &text, context),
            // Timeouts and connection errors are ordinary per-item failures
            Err(e) => ActionResponse::OtherFailure(format!("Error {}: {}", context, e)),
        }
    }

    /// Run a query whose `data` we need, failing on any GraphQL error
    async fn query_data(&self, body: Value, context: &'static str) -> Result<Value, SourceError> {
        let (status, text) = self.post_graphql(&body).await?;
        if let Some(response) = graphql::classify_status(status, context) {
            return Err(SourceError::Api {
                service: "IMDb",
                message: format!("{:?}", response),
            });
        }

        let parsed: GraphQlResponse = serde_json::from_str(&text).map_err(|e| SourceError::Api {
            service: "IMDb",
            message: format!("malformed response {}: {}", context, e),
        })?;

        if let Some(error) = parsed.errors.first() {
            return Err(SourceError::Api {
                service: "IMDb",
                message: error.message.clone(),
            });
        }

        parsed.data.ok_or_else(|| SourceError::Api {
            service: "IMDb",
            message: format!("no data {}", context),
        })
    }
}

#[async_trait]
impl RemoteActionClient for ImdbClient {
    async fn rate(&self, id: &ExternalId, rating: ImdbRating) -> ActionResponse {
        trace!("Rating {} {}", id, rating);
        let body = graphql::rate_title_body(id.as_str(), rating.value());
        self.mutation(body, "rating on IMDb").await
    }

    async fn add_to_watchlist(&self, id: &ExternalId) -> ActionResponse {
        trace!("Adding {} to watchlist", id);
        let context = "adding to IMDb watchlist";
        let response = self
            .http
            .put(self.watchlist_url(id))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, self.cookie.as_str())
            .send()
            .await;

        match response {
            Ok(response) => graphql::classify_rest(response.status(), context),
            Err(e) => ActionResponse::OtherFailure(format!("Error {}: {}", context, e)),
        }
    }

    async fn add_to_list(&self, list: &ListId, id: &ExternalId) -> ActionResponse {
        trace!("Adding {} to list {}", id, list);
        let body = graphql::add_to_list_body(list.as_str(), id.as_str());
        self.mutation(body, "adding to IMDb list").await
    }
}

#[async_trait]
impl ListResolver for ImdbClient {
    async fn find_or_create(&self, name: &str, description: &str) -> Result<ListId, SourceError> {
        let data = self
            .query_data(graphql::user_lists_body(), "listing IMDb lists")
            .await?;

        let lists = graphql::parse_user_lists(&data);
        if let Some(id) = graphql::find_list_id(&lists, name) {
            debug!("Using existing IMDb list '{}' ({})", name, id);
            return Ok(ListId::new(id));
        }

        let data = self
            .query_data(graphql::create_list_body(name, description), "creating IMDb list")
            .await?;
        let id = graphql::created_list_id(&data)?;

        info!("Created IMDb list '{}' ({})", name, id);
        Ok(ListId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchlist_url() {
        let client = ImdbClient::new(Client::new(), ImdbCookie::new("c"))
            .with_endpoints("http://localhost:9000/graphql", "http://localhost:9000/");
        assert_eq!(
            client.watchlist_url(&ExternalId::new("tt0113277")),
            "http://localhost:9000/watchlist/tt0113277"
        );
    }
}
