//! Attempt accounting of the retry wrapper against store errors.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use paper_engine::resilience::execute;
use paper_engine::{EngineError, ErrorCode, RetryConfig, RetryError, StoreError};
use tokio_util::sync::CancellationToken;

fn config(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_secs(5),
        backoff_factor: 2.0,
        jitter_factor: 0.0,
    }
}

/// Operation that always fails with `error` and counts its calls.
fn failing(
    calls: &Arc<AtomicU32>,
    error: fn() -> StoreError,
) -> impl FnMut() -> std::future::Ready<Result<(), StoreError>> {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Err(error()))
    }
}

fn refused() -> StoreError {
    StoreError::Unavailable("dial tcp 10.0.0.1:5432: connection refused".to_string())
}

fn missing() -> StoreError {
    StoreError::NotFound {
        entity: "position",
        id: "p-1".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn terminal_error_runs_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let token = CancellationToken::new();

    let err = execute(&token, &config(3), failing(&calls, missing))
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, RetryError::Terminal(StoreError::NotFound { .. })));
}

#[tokio::test(start_paused = true)]
async fn retryable_error_exhausts_every_attempt() {
    let calls = Arc::new(AtomicU32::new(0));
    let token = CancellationToken::new();
    let started = tokio::time::Instant::now();

    let err = execute(&token, &config(3), failing(&calls, refused))
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(err.attempts(), 4);
    assert!(err.to_string().contains("after 4 attempts"));
    assert!(err.to_string().contains("connection refused"));
    // 100 + 200 + 400
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(700) && waited < Duration::from_millis(710));

    let mapped = EngineError::from(&err);
    assert_eq!(mapped.code(), ErrorCode::StoreUnavailable);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_stops_early() {
    let calls = Arc::new(AtomicU32::new(0));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        canceller.cancel();
    });

    let err = execute(&token, &config(5), failing(&calls, refused))
        .await
        .unwrap_err();

    let attempts = calls.load(Ordering::SeqCst);
    assert!(attempts < 6);
    assert_eq!(attempts, 2);
    let RetryError::Cancelled { attempts, last } = err else {
        panic!("expected cancellation, got {err:?}");
    };
    assert_eq!(attempts, 2);
    assert!(last.is_some());
}

#[tokio::test(start_paused = true)]
async fn recovers_after_transient_failures() {
    let calls = Arc::new(AtomicU32::new(0));
    let token = CancellationToken::new();

    let counter = Arc::clone(&calls);
    let value = execute(&token, &config(3), move || {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if attempt < 3 {
                Err(StoreError::Unavailable("HTTP 503 Service Unavailable".to_string()))
            } else {
                Ok(attempt)
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(value, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
