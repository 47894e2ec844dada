//! Bounded exponential backoff around a single API request, on top of the
//! `backoff` crate.

use backoff::future::retry_notify;
use backoff::{Error as BackoffError, ExponentialBackoff};
use log::warn;
use nsx::{ApiError, NetworkError, RetryPolicy};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Outcome of one attempt that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Worth trying again after a pause.
    Transient(NetworkError),
    /// Returned to the caller as is.
    Fatal(ApiError),
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Failure::Fatal(err)
    }
}

impl From<NetworkError> for Failure {
    fn from(err: NetworkError) -> Self {
        Failure::Transient(err)
    }
}

/// Whether a request may be sent again after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Reads, `PUT` with `_revision`, deletes and the EULA acceptance.
    Safe,
    /// Object creation. Only a failure to connect is retried; after a timeout or a
    /// 5xx the server may already hold the object.
    ConnectOnly,
}

impl Replay {
    fn allows(self, err: &NetworkError) -> bool {
        match self {
            Replay::Safe => true,
            Replay::ConnectOnly => matches!(err, NetworkError::Connect(_)),
        }
    }
}

/// Exponential schedule for `policy`: doubling from the initial interval, capped at
/// the maximum, no overall deadline. The attempt ceiling is enforced by
/// [`with_backoff`].
pub fn schedule(policy: &RetryPolicy) -> ExponentialBackoff {
    let initial = Duration::from_millis(policy.initial_backoff_ms);
    ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        multiplier: 2.0,
        max_interval: Duration::from_millis(policy.max_backoff_ms),
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}

/// Runs `attempt` until it succeeds, fails fatally or `policy.max_attempts` is spent.
///
/// The closure receives the 1-based attempt number. Each retried failure is logged
/// at `warn` with the delay chosen by [`schedule`].
///
/// # Returns
///
/// * `Ok(T)` from the first successful attempt.
/// * `Err(ApiError)` from a fatal failure, [`ApiError::RetriesExhausted`] carrying
///   the last transient error, or [`ApiError::Unconfirmed`] when `replay` forbids
///   sending the request again.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    replay: Replay,
    mut attempt: F,
) -> Result<T, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let attempts = AtomicU32::new(0);

    let operation = || {
        let number = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let pending = attempt(number);
        async move {
            match pending.await {
                Ok(value) => Ok(value),
                Err(Failure::Fatal(err)) => Err(BackoffError::permanent(Failure::Fatal(err))),
                Err(Failure::Transient(last)) if !replay.allows(&last) => {
                    Err(BackoffError::permanent(Failure::Fatal(ApiError::Unconfirmed {
                        request: label.to_string(),
                        last,
                    })))
                }
                Err(Failure::Transient(last)) if number >= max_attempts => {
                    warn!("{}: giving up after {} attempts: {}", label, number, last);
                    Err(BackoffError::permanent(Failure::Fatal(
                        ApiError::RetriesExhausted {
                            attempts: number,
                            last,
                        },
                    )))
                }
                Err(transient) => Err(BackoffError::transient(transient)),
            }
        }
    };
    let notify = |failure: Failure, delay: Duration| {
        if let Failure::Transient(err) = failure {
            warn!(
                "{}: attempt {}/{} failed ({}), retrying in {:?}",
                label,
                attempts.load(Ordering::SeqCst),
                max_attempts,
                err,
                delay
            );
        }
    };

    retry_notify(schedule(policy), operation, notify)
        .await
        .map_err(|failure| match failure {
            Failure::Fatal(err) => err,
            Failure::Transient(last) => ApiError::RetriesExhausted {
                attempts: attempts.load(Ordering::SeqCst),
                last,
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::backoff::Backoff;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, 1, 2)
    }

    #[test]
    fn test_schedule_follows_policy() {
        let mut backoff = schedule(&RetryPolicy::new(5, 100, 1_000));
        assert_eq!(backoff.initial_interval, Duration::from_millis(100));
        assert_eq!(backoff.max_interval, Duration::from_millis(1_000));
        assert_eq!(backoff.multiplier, 2.0);
        assert!(backoff.max_elapsed_time.is_none());

        for _ in 0..20 {
            let delay = backoff.next_backoff().expect("no deadline");
            assert!(delay <= Duration::from_millis(1_500));
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(&fast(3), "GET /x", Replay::Safe, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(Failure::Transient(NetworkError::Timeout))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let result: Result<(), ApiError> =
            with_backoff(&fast(2), "GET /x", Replay::Safe, |n| async move {
                Err(Failure::Transient(NetworkError::ServerError {
                    status: 503,
                    body: format!("attempt {}", n),
                }))
            })
            .await;

        assert_eq!(
            result,
            Err(ApiError::RetriesExhausted {
                attempts: 2,
                last: NetworkError::ServerError {
                    status: 503,
                    body: "attempt 2".into()
                },
            })
        );
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), ApiError> = with_backoff(&fast(5), "POST /x", Replay::Safe, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Failure::Fatal(ApiError::InvalidResponse("bad".into()))) }
        })
        .await;

        assert_eq!(result, Err(ApiError::InvalidResponse("bad".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_is_sent_once_after_timeout_or_server_error() {
        for failure in [
            NetworkError::Timeout,
            NetworkError::ServerError {
                status: 502,
                body: "bad gateway".into(),
            },
        ] {
            let calls = AtomicU32::new(0);
            let result: Result<(), ApiError> = with_backoff(
                &fast(5),
                "POST /api/v1/transport-nodes",
                Replay::ConnectOnly,
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let failure = failure.clone();
                    async move { Err(Failure::Transient(failure)) }
                },
            )
            .await;

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(
                result,
                Err(ApiError::Unconfirmed {
                    request: "POST /api/v1/transport-nodes".into(),
                    last: failure,
                })
            );
        }
    }

    #[tokio::test]
    async fn test_create_is_retried_when_the_connection_failed() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(&fast(3), "POST /x", Replay::ConnectOnly, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 1 {
                    Err(Failure::Transient(NetworkError::Connect("refused".into())))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
