use crate::breaker::RateLimitBreaker;
use crate::outcome::Outcome;
use filmsync_models::WorkItem;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parallel requests must be between {min} and {max}, got {value}", min = Concurrency::MIN, max = Concurrency::MAX)]
pub struct InvalidConcurrency {
    pub value: usize,
}

/// Number of work items in flight at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(usize);

impl Concurrency {
    pub const MIN: usize = 1;
    pub const MAX: usize = 20;

    pub fn new(value: usize) -> Result<Self, InvalidConcurrency> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidConcurrency { value })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<usize> for Concurrency {
    type Error = InvalidConcurrency;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Bounded fan-out of work items to an async per-item function
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    concurrency: Concurrency,
}

impl WorkerPool {
    pub fn new(concurrency: Concurrency) -> Self {
        Self { concurrency }
    }

    /// Run `per_item` over `items` with at most `concurrency` in flight.
    ///
    /// Outcomes come out in completion order. Once the breaker trips no further
    /// items are pulled, while those already started run to completion. When
    /// `interrupt` fires the stream ends on its next poll and unfinished work
    /// is dropped.
    pub fn run<'a, F, Fut>(
        &self,
        items: Vec<WorkItem>,
        per_item: F,
        breaker: &RateLimitBreaker,
        interrupt: &CancellationToken,
    ) -> BoxStream<'a, Outcome>
    where
        F: FnMut(WorkItem) -> Fut + Send + 'a,
        Fut: Future<Output = Outcome> + Send + 'a,
    {
        let tripped = breaker.token();
        let stop_pulling = {
            let interrupt = interrupt.clone();
            async move {
                tokio::select! {
                    _ = tripped.cancelled() => {}
                    _ = interrupt.cancelled() => {}
                }
            }
        };

        stream::iter(items)
            .take_until(stop_pulling)
            .map(per_item)
            .buffer_unordered(self.concurrency.get())
            .take_until(interrupt.clone().cancelled_owned())
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ItemError;
    use filmsync_models::{Action, ExternalId, Record};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn item(name: &str) -> WorkItem {
        WorkItem::new(Record::from_fields([("Name", name)]), Action::AddToWatchlist)
    }

    fn items(count: usize) -> Vec<WorkItem> {
        (0..count).map(|i| item(&format!("Film {}", i))).collect()
    }

    fn success(item: WorkItem) -> Outcome {
        Outcome::Success {
            item,
            external_id: ExternalId::new("tt0000001"),
        }
    }

    #[test]
    fn test_concurrency_bounds() {
        assert!(Concurrency::new(0).is_err());
        assert_eq!(Concurrency::new(1).unwrap().get(), 1);
        assert_eq!(Concurrency::new(20).unwrap().get(), 20);
        assert_eq!(Concurrency::new(21), Err(InvalidConcurrency { value: 21 }));
        assert_eq!(Concurrency::default().get(), 5);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(Concurrency::new(3).unwrap());

        let outcomes: Vec<Outcome> = pool
            .run(
                items(12),
                {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    move |item| {
                        let in_flight = in_flight.clone();
                        let peak = peak.clone();
                        async move {
                            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                            success(item)
                        }
                    }
                },
                &RateLimitBreaker::new(),
                &CancellationToken::new(),
            )
            .collect()
            .await;

        assert_eq!(outcomes.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2, "work should overlap");
    }

    #[tokio::test]
    async fn test_outcomes_arrive_in_completion_order() {
        let pool = WorkerPool::new(Concurrency::new(3).unwrap());
        let delays = [("slow", 60u64), ("fast", 0), ("medium", 25)];

        let outcomes: Vec<Outcome> = pool
            .run(
                delays.iter().map(|(name, _)| item(name)).collect(),
                move |item| async move {
                    let delay = delays
                        .iter()
                        .find(|(name, _)| *name == item.record().title())
                        .map(|(_, ms)| *ms)
                        .unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    success(item)
                },
                &RateLimitBreaker::new(),
                &CancellationToken::new(),
            )
            .collect()
            .await;

        let order: Vec<&str> = outcomes.iter().map(|o| o.item().record().title()).collect();
        assert_eq!(order, vec!["fast", "medium", "slow"]);
    }

    #[tokio::test]
    async fn test_no_new_items_after_trip() {
        let breaker = Arc::new(RateLimitBreaker::new());
        let started = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(Concurrency::new(1).unwrap());

        let outcomes: Vec<Outcome> = pool
            .run(
                items(10),
                {
                    let breaker = breaker.clone();
                    let started = started.clone();
                    move |item| {
                        let breaker = breaker.clone();
                        let started = started.clone();
                        async move {
                            if started.fetch_add(1, Ordering::SeqCst) == 2 {
                                breaker.trip();
                                return Outcome::failure(item, ItemError::RateLimited);
                            }
                            success(item)
                        }
                    }
                },
                &breaker,
                &CancellationToken::new(),
            )
            .collect()
            .await;

        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[2].error(), Some(&ItemError::RateLimited));
    }

    #[tokio::test]
    async fn test_in_flight_items_drain_after_trip() {
        let breaker = Arc::new(RateLimitBreaker::new());
        let pool = WorkerPool::new(Concurrency::new(4).unwrap());

        let outcomes: Vec<Outcome> = pool
            .run(
                items(4),
                {
                    let breaker = breaker.clone();
                    move |item| {
                        let breaker = breaker.clone();
                        async move {
                            if item.record().title() == "Film 0" {
                                breaker.trip();
                                return Outcome::failure(item, ItemError::RateLimited);
                            }
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            success(item)
                        }
                    }
                },
                &breaker,
                &CancellationToken::new(),
            )
            .collect()
            .await;

        assert_eq!(outcomes.len(), 4, "items already started must finish");
        assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 3);
    }

    #[tokio::test]
    async fn test_interrupt_ends_stream_promptly() {
        let interrupt = CancellationToken::new();
        let pool = WorkerPool::new(Concurrency::new(2).unwrap());

        let mut outcomes = pool.run(
            vec![item("fast"), item("stuck"), item("never")],
            |item| async move {
                if item.record().title() != "fast" {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                success(item)
            },
            &RateLimitBreaker::new(),
            &interrupt,
        );

        let first = outcomes.next().await.unwrap();
        assert_eq!(first.item().record().title(), "fast");

        interrupt.cancel();
        let rest = tokio::time::timeout(Duration::from_secs(1), outcomes.next())
            .await
            .expect("interrupt should end the stream");
        assert!(rest.is_none());
    }

    #[tokio::test]
    async fn test_interrupt_before_start_dispatches_nothing() {
        let interrupt = CancellationToken::new();
        interrupt.cancel();
        let started = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(Concurrency::default());

        let outcomes: Vec<Outcome> = pool
            .run(
                items(5),
                {
                    let started = started.clone();
                    move |item| {
                        started.fetch_add(1, Ordering::SeqCst);
                        async move { success(item) }
                    }
                },
                &RateLimitBreaker::new(),
                &interrupt,
            )
            .collect()
            .await;

        assert!(outcomes.is_empty());
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }
}
