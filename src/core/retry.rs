//! Bounded exponential-backoff retry around a single remote call.

use std::future::Future;

use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::core::NpiError;
use crate::core::client::RetryConfig;

/// Runs `attempt` until it succeeds, fails fatally, runs out of retries, or `cancel` fires.
///
/// `attempt` receives the 0-based attempt number. Each failure is classified through
/// [`NpiError::is_retryable`]:
///
/// - a fatal failure is returned as-is after that single attempt;
/// - a transient failure is retried after [`RetryConfig::delay_for`] while budget remains;
/// - once `max_retries` retries have failed, the last failure is wrapped in
///   [`NpiError::RetriesExhausted`].
///
/// No new attempt starts after `cancel` fires. Both the backoff wait and an in-flight
/// attempt race the token; whichever loses is dropped and [`NpiError::Cancelled`] is
/// returned, counting only the attempts that were actually started.
pub(crate) async fn execute<T, F, Fut>(
    policy: &RetryConfig,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, NpiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, NpiError>>,
{
    let mut n: u32 = 0;
    loop {
        if n > 0 {
            let delay = policy.delay_for(n);
            #[cfg(feature = "tracing")]
            tracing::debug!(retry = n, delay_ms = delay.as_millis() as u64, "retrying after backoff");
            select! {
                biased;
                () = cancel.cancelled() => return Err(NpiError::Cancelled { attempts: n, npi: None }),
                () = tokio::time::sleep(delay) => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(NpiError::Cancelled { attempts: n, npi: None });
        }

        let outcome = select! {
            biased;
            () = cancel.cancelled() => return Err(NpiError::Cancelled { attempts: n + 1, npi: None }),
            r = attempt(n) => r,
        };

        let err = match outcome {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };

        if !err.is_retryable() {
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt = n + 1, error = %err, "non-retryable error");
            return Err(err);
        }

        if n >= policy.max_retries {
            #[cfg(feature = "tracing")]
            tracing::warn!(attempts = n + 1, error = %err, "max retries exceeded");
            return Err(NpiError::RetriesExhausted {
                attempts: n + 1,
                npi: None,
                last: Box::new(err),
            });
        }

        n += 1;
    }
}
