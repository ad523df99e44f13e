// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bounded retry with a fixed delay between attempts.

use std::future::Future;
use std::time::Duration;

use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Runs `op` until it succeeds or `max_attempts` is spent. The last error is
/// surfaced inside `RetryExhausted`, never swallowed.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngineResult<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt >= attempts => {
                return Err(EngineError::RetryExhausted {
                    attempts,
                    last: Box::new(e),
                })
            }
            Err(e) => {
                tracing::debug!("Attempt {}/{} failed: {}. Retrying in {:?}", attempt, attempts, e, policy.delay);
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy { max_attempts: 3, delay: Duration::from_millis(1) };
        let v = retry(&policy, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(EngineError::Network("down".into()))
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(v, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy { max_attempts: 2, delay: Duration::from_millis(1) };
        let err = retry(&policy, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(EngineError::Network("down".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match err {
            EngineError::RetryExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, EngineError::Network(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
