//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, CORS, timeout)
//! - Hold the live configuration snapshot and swap it on reload
//! - Serve plain HTTP or TLS until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ProxyConfig, TlsConfig};
use crate::delivery::LinkProxy;
use crate::error::SetupError;
use crate::http::download::download_handler;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::sms::{sms_json_handler, sms_query_handler};
use crate::net::tls::load_tls_config;
use crate::observability::SearchLog;
use crate::relay::SmsRelay;
use crate::security::cors_layer;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a request needs, built from one configuration.
#[derive(Debug)]
pub struct Snapshot {
    pub config: ProxyConfig,
    pub proxy: LinkProxy,
    pub search_log: Option<Arc<SearchLog>>,
    pub sms: Option<SmsRelay>,
}

impl Snapshot {
    /// Build from `config`. The request log is reused from `previous` when its
    /// settings are unchanged, so appends stay serialized across reloads.
    pub fn build(config: ProxyConfig, previous: Option<&Snapshot>) -> Result<Self, SetupError> {
        let proxy = LinkProxy::from_config(&config)?;

        let search_log = if config.search_log.enabled {
            let reusable = previous
                .filter(|p| {
                    p.config.search_log.path == config.search_log.path
                        && p.config.search_log.max_bytes == config.search_log.max_bytes
                })
                .and_then(|p| p.search_log.clone());
            Some(reusable.unwrap_or_else(|| Arc::new(SearchLog::new(&config.search_log))))
        } else {
            None
        };

        let sms = if config.sms.enabled {
            Some(SmsRelay::from_config(&config.sms)?)
        } else {
            None
        };

        Ok(Self {
            config,
            proxy,
            search_log,
            sms,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<ArcSwap<Snapshot>>,
}

impl AppState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    /// The configuration snapshot current at the time of the call.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Swap in a new configuration. A config that fails to build is dropped.
    pub fn apply(&self, config: ProxyConfig) {
        let current = self.snapshot();
        if config.listener.bind_address != current.config.listener.bind_address
            || config.listener.tls.is_some() != current.config.listener.tls.is_some()
        {
            tracing::warn!("Listener settings changed; they take effect after restart");
        }

        match Snapshot::build(config, Some(&current)) {
            Ok(next) => {
                self.snapshot.store(Arc::new(next));
                tracing::info!("Configuration reloaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Reloaded configuration rejected, keeping current");
            }
        }
    }
}

/// HTTP server for the link proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
    tls: Option<TlsConfig>,
    shutdown_grace: Duration,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let tls = config.listener.tls.clone();
        let shutdown_grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);

        let state = AppState::new(Snapshot::build(config, None)?);
        let router = Self::build_router(request_timeout, state.clone());

        Ok(Self {
            router,
            state,
            tls,
            shutdown_grace,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The CORS layer answers `OPTIONS` before routing, so preflights on
    /// unknown paths succeed too. A request outliving `request_timeout` is a
    /// 504 like any other upstream deadline.
    fn build_router(request_timeout: Duration, state: AppState) -> Router {
        Router::new()
            .route("/", get(download_handler))
            .route("/download", get(download_handler))
            .route("/sms", get(sms_query_handler).post(sms_json_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(propagate_request_id_layer())
                    .layer(cors_layer())
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::GATEWAY_TIMEOUT,
                        request_timeout,
                    )),
            )
    }

    /// The router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` are swapped in live; the
    /// server drains and returns once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.tls.is_some(),
            "HTTP server starting"
        );

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.apply(config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        match self.tls {
            Some(tls) => {
                let rustls = load_tls_config(&tls).await?;
                let handle = axum_server::Handle::new();

                let drain = handle.clone();
                let grace = self.shutdown_grace;
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    tracing::info!(grace_secs = grace.as_secs(), "Shutdown signal received");
                    drain.graceful_shutdown(Some(grace));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                        tracing::info!("Shutdown signal received");
                    })
                    .await?;
            }
        }

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
