//! Shared utilities for integration testing.
//!
//! Mock resolver and file host are small axum routers on ephemeral ports; the
//! proxy itself runs through `HttpServer::run` exactly as the binary does.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header::{
    CONTENT_RANGE, CONTENT_SECURITY_POLICY, CONTENT_TYPE, ETAG, IF_RANGE, RANGE, REFERER,
    X_FRAME_OPTIONS,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use link_proxy::config::ProxyConfig;
use link_proxy::http::HttpServer;
use link_proxy::lifecycle::Shutdown;

/// Serve `router` on 127.0.0.1 with an OS-assigned port.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Deterministic non-text payload served by the mock file host.
pub fn file_bytes() -> Vec<u8> {
    (0..=255u8).cycle().take(64 * 1024 + 17).collect()
}

#[derive(Clone)]
struct ResolverState {
    status: StatusCode,
    body: String,
    delay: Duration,
    hits: Arc<AtomicUsize>,
    last_source: Arc<Mutex<Option<String>>>,
}

/// Handle to a running mock resolver.
pub struct MockResolver {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    last_source: Arc<Mutex<Option<String>>>,
}

impl MockResolver {
    /// Resolver that always answers `status` with `body` after `delay`.
    pub async fn start(status: StatusCode, body: impl Into<String>, delay: Duration) -> Self {
        let state = ResolverState {
            status,
            body: body.into(),
            delay,
            hits: Arc::new(AtomicUsize::new(0)),
            last_source: Arc::new(Mutex::new(None)),
        };
        let hits = state.hits.clone();
        let last_source = state.last_source.clone();

        let router = Router::new()
            .route("/dl", get(resolver_handler))
            .with_state(state);

        Self {
            addr: spawn_router(router).await,
            hits,
            last_source,
        }
    }

    pub async fn json(body: serde_json::Value) -> Self {
        Self::start(StatusCode::OK, body.to_string(), Duration::ZERO).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/dl", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// The `url` query value of the most recent call, decoded.
    pub fn last_source(&self) -> Option<String> {
        self.last_source.lock().unwrap().clone()
    }
}

async fn resolver_handler(
    State(state): State<ResolverState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_source.lock().unwrap() = query.get("url").cloned();
    tokio::time::sleep(state.delay).await;
    (state.status, [(CONTENT_TYPE, "application/json")], state.body.clone()).into_response()
}

/// ETag of `file_bytes()` as served by the mock file host.
pub const FILE_ETAG: &str = "\"v1\"";

/// How long `/slow` holds back its response headers.
pub const SLOW_HEADERS_DELAY: Duration = Duration::from_secs(3);

/// Handle to a running mock file host.
///
/// `/file.bin` serves `file_bytes()` with headers a browser would refuse to
/// frame, honoring single `bytes=a-b` ranges unless `If-Range` names another
/// entity. `/slow` is `/file.bin` after `SLOW_HEADERS_DELAY`. `/missing` is a 404.
pub struct MockFileHost {
    pub addr: SocketAddr,
    state: FileHostState,
}

#[derive(Clone)]
struct FileHostState {
    hits: Arc<AtomicUsize>,
    last_referer: Arc<Mutex<Option<String>>>,
    last_if_range: Arc<Mutex<Option<String>>>,
}

impl MockFileHost {
    pub async fn start() -> Self {
        let state = FileHostState {
            hits: Arc::new(AtomicUsize::new(0)),
            last_referer: Arc::new(Mutex::new(None)),
            last_if_range: Arc::new(Mutex::new(None)),
        };

        let router = Router::new()
            .route("/file.bin", get(file_handler))
            .route("/slow", get(slow_handler))
            .route("/missing", get(missing_handler))
            .with_state(state.clone());

        Self {
            addr: spawn_router(router).await,
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_referer(&self) -> Option<String> {
        self.state.last_referer.lock().unwrap().clone()
    }

    pub fn last_if_range(&self) -> Option<String> {
        self.state.last_if_range.lock().unwrap().clone()
    }
}

fn header_string(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn slow_handler(state: State<FileHostState>, headers: HeaderMap) -> Response {
    tokio::time::sleep(SLOW_HEADERS_DELAY).await;
    file_handler(state, headers).await
}

async fn file_handler(State(state): State<FileHostState>, headers: HeaderMap) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_referer.lock().unwrap() = header_string(&headers, REFERER);
    let if_range = header_string(&headers, IF_RANGE);
    *state.last_if_range.lock().unwrap() = if_range.clone();

    let bytes = file_bytes();
    let total = bytes.len();
    let common = [
        (CONTENT_TYPE, "application/octet-stream".to_string()),
        (CONTENT_SECURITY_POLICY, "default-src 'none'".to_string()),
        (X_FRAME_OPTIONS, "DENY".to_string()),
        (ETAG, FILE_ETAG.to_string()),
    ];

    let current = if_range.as_deref().map_or(true, |tag| tag == FILE_ETAG);
    let range = headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("bytes="))
        .and_then(|v| v.split_once('-'))
        .and_then(|(a, b)| Some((a.parse::<usize>().ok()?, b.parse::<usize>().ok()?)))
        .filter(|(a, b)| current && a <= b && *b < total);

    match range {
        Some((start, end)) => (
            StatusCode::PARTIAL_CONTENT,
            common,
            [(CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, total))],
            bytes[start..=end].to_vec(),
        )
            .into_response(),
        None => (StatusCode::OK, common, bytes).into_response(),
    }
}

async fn missing_handler(State(state): State<FileHostState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, "gone").into_response()
}

/// Mock SMS gateway that echoes the JSON it received under `received`.
pub async fn start_sms_gateway(status: StatusCode) -> SocketAddr {
    let router = Router::new().route(
        "/api/sms/send-sms",
        post(move |Json(body): Json<serde_json::Value>| async move {
            (status, Json(serde_json::json!({ "received": body })))
        }),
    );
    spawn_router(router).await
}

/// Proxy config pointing at the given resolver.
pub fn proxy_config(resolver: &MockResolver) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.resolver.base_url = resolver.base_url();
    config
}

/// A running proxy. Dropping it leaves the server task to the runtime.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

/// Client that never follows redirects, so 302s can be asserted.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
