use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Latency budget for a single partner provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_millis(4000);

/// Resolves to the future's output, or to `default` once `timeout` elapses.
///
/// This bounds latency only. The losing future is dropped at its current
/// suspension point, so work it already started elsewhere (a request in
/// flight, a spawned task) is not undone.
pub async fn race_with_timeout<F>(future: F, default: F::Output, timeout: Duration) -> F::Output
where
    F: Future,
{
    tokio::time::timeout(timeout, future)
        .await
        .unwrap_or(default)
}

/// Like [`race_with_timeout`] for fallible futures: an error resolves to
/// `default` as well. Both outcomes are logged under `label`.
pub async fn recover_with_timeout<F, T, E>(
    future: F,
    default: T,
    timeout: Duration,
    label: &str,
) -> T
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match race_with_timeout(async { Some(future.await) }, None, timeout).await {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            warn!("{} failed, using fallback: {}", label, e);
            default
        }
        None => {
            warn!("{} timed out after {:?}, using fallback", label, timeout);
            default
        }
    }
}
