//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → source.rs (validate the share URL before any upstream call)
//!     → resolver / file host
//!     → headers.rs (strip blocking headers, add CORS, force download)
//!     → Client
//! ```
//!
//! # Design Decisions
//! - Fail closed: an unrecognized share host is rejected before the resolver is called
//! - Relayed responses never carry the upstream's CSP or frame restrictions

pub mod headers;
pub mod source;

pub use headers::{content_disposition, cors_layer, sanitize_headers, SanitizeOptions};
pub use source::validate_source;
