//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap outbound calls (resolver, file host, SMS API) with a deadline
//! - Cancel the in-flight future cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future aborts the request
//! - Timeout errors are distinct from other errors
//! - Timed-out resolver calls return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

/// Returned when a call does not finish within its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {}ms exceeded", .limit.as_millis())]
pub struct DeadlineExceeded {
    pub limit: Duration,
}

/// Run `fut` to completion or give up after `limit`.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded { limit })
}
