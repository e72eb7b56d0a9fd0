use crate::breaker::RateLimitBreaker;
use crate::outcome::{ItemError, Outcome};
use filmsync_models::{Action, WorkItem};
use filmsync_sources::{ActionResponse, IdResolver, RemoteActionClient};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Carries one work item through resolution and the remote write
#[derive(Clone)]
pub struct TransferWorker {
    resolver: Arc<dyn IdResolver>,
    client: Arc<dyn RemoteActionClient>,
    breaker: Arc<RateLimitBreaker>,
}

impl TransferWorker {
    pub fn new(
        resolver: Arc<dyn IdResolver>,
        client: Arc<dyn RemoteActionClient>,
        breaker: Arc<RateLimitBreaker>,
    ) -> Self {
        Self {
            resolver,
            client,
            breaker,
        }
    }

    /// Never fails: every path ends in an outcome for this item
    #[instrument(skip_all, fields(title = %item.record().display_title(), action = %item.kind()))]
    pub async fn execute(&self, item: WorkItem) -> Outcome {
        let Some(uri) = item.record().source_uri() else {
            debug!("Record has no source URI");
            return Outcome::failure(item, ItemError::NotFound);
        };

        let Some(external_id) = self.resolver.resolve(uri).await else {
            debug!("No external title for {}", uri);
            return Outcome::failure(item, ItemError::NotFound);
        };

        if self.breaker.is_tripped() {
            return Outcome::failure(item, ItemError::Skipped);
        }

        let response = match item.action() {
            Action::Rate { rating } => self.client.rate(&external_id, *rating).await,
            Action::AddToWatchlist => self.client.add_to_watchlist(&external_id).await,
            Action::AddToList { list_id } => self.client.add_to_list(list_id, &external_id).await,
        };

        match response {
            ActionResponse::Success => {
                debug!("Transferred as {}", external_id);
                Outcome::Success { item, external_id }
            }
            ActionResponse::RateLimited => {
                self.breaker.trip();
                Outcome::failure(item, ItemError::RateLimited)
            }
            ActionResponse::AuthenticationFailure => {
                warn!("IMDb rejected the session cookie");
                Outcome::failure(item, ItemError::Authentication)
            }
            ActionResponse::OtherFailure(detail) => {
                debug!("Remote failure: {}", detail);
                Outcome::failure(item, ItemError::Remote(detail))
            }
        }
    }
}
