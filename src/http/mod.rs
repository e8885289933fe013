//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, live config snapshot)
//!     → request.rs (request ID)
//!     → download.rs (validate, log, resolve, deliver)
//!       sms.rs (relay to SMS gateway)
//!     → response.rs (error rendering, text or JSON)
//!     → Send to client
//! ```

pub mod download;
pub mod request;
pub mod response;
pub mod server;
pub mod sms;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError, Snapshot};
