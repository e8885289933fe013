//! Network layer subsystem.
//!
//! Plain TCP listeners come straight from tokio; this module only adds
//! optional TLS termination through `axum-server`.

pub mod tls;

pub use tls::load_tls_config;
