//! HTTP front end: bounded accept loop, hyper HTTP/1 sessions and the axum
//! router that forwards every request into the [`Dispatcher`].

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, StatusCode, Uri, Version};
use axum::middleware::{self, Next};
use axum::response::Response;
use hyper::body::Incoming;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower::Service;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, error, info};

use crate::deadline::WriteDeadline;
use crate::dispatch::{Dispatcher, HttpRequest, HttpResponse};

/// Pause after a failed `accept`, so a persistent error such as EMFILE does
/// not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Session limits.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Concurrent connections; further clients wait in the accept backlog.
    pub max_connections: usize,
    /// How long a client may take to send a complete request head.
    pub header_read_timeout: Duration,
    /// Upper bound on handling one request.
    pub request_timeout: Duration,
    /// How long a response write may stall on a peer that is not reading.
    pub write_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            max_connections: 256,
            header_read_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the router: a single fallback that hands every request to `dispatcher`.
pub fn app(dispatcher: Arc<Dispatcher>, request_timeout: Duration) -> Router {
    Router::new()
        .fallback(dispatch_request)
        .with_state(dispatcher)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(access_log))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

async fn dispatch_request(
    State(dispatcher): State<Arc<Dispatcher>>,
    method: Method,
    version: Version,
    uri: Uri,
    headers: HeaderMap,
) -> HttpResponse {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let keep_alive = keep_alive(version, &headers);
    dispatcher.dispatch(HttpRequest::new(method, target, version, keep_alive))
}

/// HTTP/1.1 keeps the connection open unless told otherwise; HTTP/1.0 closes
/// unless asked to keep it.
fn keep_alive(version: Version, headers: &HeaderMap) -> bool {
    let connection = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .collect::<Vec<_>>();

    if connection.iter().any(|t| t == "close") {
        return false;
    }
    match version {
        Version::HTTP_09 | Version::HTTP_10 => connection.iter().any(|t| t == "keep-alive"),
        _ => true,
    }
}

async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Runs `accept` until it succeeds, logging each failure and sleeping
/// `backoff` before the next attempt.
async fn accept_with_backoff<T, F, Fut>(backoff: Duration, mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(conn) => return conn,
            Err(e) => {
                error!(error = %e, "accept failed");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Accepts connections forever.
///
/// A permit is taken before each accept and held by the session task, so at
/// most `max_connections` sessions are live at once. A session ends when the
/// peer goes quiet while sending headers or stops draining a response.
pub async fn serve(listener: TcpListener, app: Router, config: ListenerConfig) {
    let semaphore = Arc::new(Semaphore::new(config.max_connections));
    let mut session_id: u64 = 0;

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, max_connections = config.max_connections, "listening");
    }

    loop {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            return;
        };

        let (stream, peer) =
            accept_with_backoff(ACCEPT_ERROR_BACKOFF, || listener.accept()).await;

        session_id += 1;
        let tower_service = app.clone();
        let header_read_timeout = config.header_read_timeout;
        let write_timeout = config.write_timeout;

        tokio::spawn(async move {
            let _permit = permit;
            debug!(session_id, %peer, "session started");

            let hyper_service = hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
                tower_service.clone().call(request)
            });

            let result = hyper::server::conn::http1::Builder::new()
                .timer(TokioTimer::new())
                .header_read_timeout(header_read_timeout)
                .serve_connection(
                    TokioIo::new(WriteDeadline::new(stream, write_timeout)),
                    hyper_service,
                )
                .await;

            if let Err(e) = result {
                error!(session_id, error = %e, "session failed");
            }
            debug!(session_id, "session closed");
        });
    }
}
