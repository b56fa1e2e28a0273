//! Bounded concurrent fan-out

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Run `f` over every item with at most `limit` futures in flight.
///
/// Results come back in input order.
pub async fn fan_out_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));

    let tasks = items.into_iter().map(|item| {
        let semaphore = Arc::clone(&semaphore);
        let fut = f(item);
        async move {
            // Never closed, so a permit is always granted
            let _permit = semaphore.acquire().await.ok();
            fut.await
        }
    });

    join_all(tasks).await
}
