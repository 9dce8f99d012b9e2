//! Bounded retry around a session attempt.
//!
//! Only link failures (`ConnectFailed`, `UnexpectedDisconnect`) are retried,
//! with a fixed backoff. Every give-up also waits one backoff, so a caller
//! that immediately tries again does not hammer the radio.

use std::future::Future;
use std::time::Duration;

use crate::domain::{DriverError, DriverResult};
use crate::ports::{DriverEvent, EventSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }
}

/// Run `attempt` (called with the 1-based attempt number) until it succeeds,
/// fails with a non-retryable error, or the budget is spent.
///
/// Returns the value and the number of attempts it took.
pub async fn run_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    events: &dyn EventSink,
    mut attempt: F,
) -> DriverResult<(T, u32)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DriverResult<T>>,
{
    let mut remaining = policy.max_retries;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let error = match attempt(attempts).await {
            Ok(value) => return Ok((value, attempts)),
            Err(error) => error,
        };

        if error.is_retryable() && remaining > 0 {
            events.emit(DriverEvent::RetryScheduled {
                error,
                remaining,
                attempt: attempts,
            });
            remaining -= 1;
            tokio::time::sleep(policy.backoff).await;
            continue;
        }

        events.emit(DriverEvent::GaveUp {
            error: error.clone(),
            attempts,
        });
        tokio::time::sleep(policy.backoff).await;
        return Err(if error.is_retryable() {
            DriverError::RetriesExhausted {
                attempts,
                source: Box::new(error),
            }
        } else {
            error
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemorySink;
    use std::cell::Cell;

    const BACKOFF: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn always_failing_connect_is_tried_four_times() {
        let sink = MemorySink::new();
        let calls = Cell::new(0u32);
        let result: DriverResult<((), u32)> =
            run_with_retry(RetryPolicy::new(3, BACKOFF), &sink, |_| {
                calls.set(calls.get() + 1);
                async { Err(DriverError::ConnectFailed("ESP_GATT_CONN_FAIL_ESTABLISH".into())) }
            })
            .await;

        assert_eq!(calls.get(), 4);
        match result {
            Err(DriverError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(*source, DriverError::ConnectFailed(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(sink.count(|e| matches!(e, DriverEvent::RetryScheduled { .. })), 3);
        assert_eq!(sink.count(|e| matches!(e, DriverEvent::GaveUp { .. })), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_disconnect() {
        let sink = MemorySink::new();
        let (value, attempts) = run_with_retry(RetryPolicy::new(3, BACKOFF), &sink, |n| async move {
            if n < 3 {
                Err(DriverError::UnexpectedDisconnect("Disconnected".into()))
            } else {
                Ok(n * 10)
            }
        })
        .await
        .unwrap();

        assert_eq!((value, attempts), (30, 3));
        assert_eq!(sink.count(|e| matches!(e, DriverEvent::GaveUp { .. })), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_is_not_retried() {
        let sink = MemorySink::new();
        let calls = Cell::new(0u32);
        let err = run_with_retry::<(), _, _>(RetryPolicy::new(3, BACKOFF), &sink, |_| {
            calls.set(calls.get() + 1);
            async { Err(DriverError::LinkUnavailable("AA:BB".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert_eq!(err, DriverError::LinkUnavailable("AA:BB".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_between_attempts_and_before_giving_up() {
        let sink = MemorySink::new();
        let start = tokio::time::Instant::now();
        let _ = run_with_retry::<(), _, _>(RetryPolicy::new(2, BACKOFF), &sink, |_| async {
            Err(DriverError::ConnectFailed("refused".into()))
        })
        .await;

        // two retry waits plus the final one
        assert_eq!(start.elapsed(), BACKOFF * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_numbers_are_reported() {
        let sink = MemorySink::new();
        let _ = run_with_retry::<(), _, _>(RetryPolicy::new(2, BACKOFF), &sink, |_| async {
            Err(DriverError::UnexpectedDisconnect("Disconnected".into()))
        })
        .await;

        let scheduled: Vec<(u32, u32)> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                DriverEvent::RetryScheduled {
                    remaining, attempt, ..
                } => Some((attempt, remaining)),
                _ => None,
            })
            .collect();
        assert_eq!(scheduled, vec![(1, 2), (2, 1)]);
    }
}
