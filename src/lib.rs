//! Link resolution and streaming download proxy.

pub mod config;
pub mod delivery;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod resilience;
pub mod resolver;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use delivery::LinkProxy;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
