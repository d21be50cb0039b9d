// src/enrich/fanout.rs
use std::future::Future;
use std::sync::Arc;

use futures::future::{try_join_all, FutureExt};
use tokio::sync::Semaphore;

use crate::enrich::types::Post;
use crate::error::PipelineError;

/// Caps outbound fetches across every enricher holding a clone of it.
#[derive(Clone, Debug)]
pub struct FetchLimit {
    permits: Arc<Semaphore>,
}

impl FetchLimit {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Run `fut` while holding one permit.
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        // The semaphore is never closed, so acquire only fails in theory.
        let _permit = self.permits.acquire().await;
        fut.await
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Run `task` once per post and collect every result, in listing order.
///
/// Resolves only after all branches finished, or on the first error. On error the
/// remaining branches are dropped, which cancels their in-flight fetches.
/// Concurrency is bounded by the `FetchLimit` the tasks use, not here.
pub async fn fan_out<'a, T, F, Fut>(posts: &'a [Post], task: F) -> Result<Vec<T>, PipelineError>
where
    F: FnMut(&'a Post) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>> + Send + 'a,
    T: Send + 'a,
{
    // Built up front and boxed so no closure lives in the awaited state.
    let tasks: Vec<_> = posts.iter().map(task).map(FutureExt::boxed).collect();
    try_join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn posts(n: u64) -> Vec<Post> {
        (1..=n).map(|id| Post::new(id, format!("a{id}"))).collect()
    }

    #[tokio::test]
    async fn shared_limit_caps_two_fan_outs_together() {
        let limit = FetchLimit::new(3);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let ps = posts(10);

        let branch = |p: &Post| {
            let limit = limit.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            let id = p.id;
            async move {
                limit
                    .run(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
                Ok(id)
            }
        };

        let (a, b) = tokio::try_join!(fan_out(&ps, branch), fan_out(&ps, branch)).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(b.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 3, "peak {}", peak.load(Ordering::SeqCst));
        assert_eq!(limit.available(), 3);
    }

    #[tokio::test]
    async fn results_keep_listing_order() {
        let ps = posts(4);
        let out = fan_out(&ps, |p| {
            let id = p.id;
            async move {
                // Later posts finish first.
                tokio::time::sleep(Duration::from_millis(20 - id * 4)).await;
                Ok(id)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn first_error_cancels_siblings() {
        let finished = Arc::new(AtomicUsize::new(0));
        let ps = posts(4);

        let res: Result<Vec<u64>, _> = fan_out(&ps, |p| {
            let finished = finished.clone();
            let id = p.id;
            async move {
                if id == 1 {
                    return Err(PipelineError::network("a1", "boom"));
                }
                tokio::time::sleep(Duration::from_secs(30)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(id)
            }
        })
        .await;

        assert!(res.is_err());
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_limit_still_allows_one() {
        assert_eq!(FetchLimit::new(0).available(), 1);
    }
}
