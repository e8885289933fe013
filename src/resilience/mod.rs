//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver call / file fetch / SMS forward:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On file fetch failure: delivery::stream falls back to a redirect
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: each upstream is called at most once per request

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineExceeded};
