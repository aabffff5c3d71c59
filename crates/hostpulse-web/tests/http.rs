use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tower::ServiceExt;

use hostpulse_core::Store;
use hostpulse_core::collector::{Collector, CollectorConfig, MockFs};
use hostpulse_core::models::ProcessSnapshot;
use hostpulse_web::{ListenerConfig, api_dispatcher, app, serve};

fn swept_store() -> Arc<Store> {
    let store = Arc::new(Store::new());
    Collector::new(
        MockFs::typical_system(),
        store.clone(),
        CollectorConfig::default(),
    )
    .sweep();
    store
}

async fn start_server(config: ListenerConfig) -> SocketAddr {
    start_server_with(swept_store(), config).await
}

async fn start_server_with(store: Arc<Store>, config: ListenerConfig) -> SocketAddr {
    let router = app(Arc::new(api_dispatcher(store)), config.request_timeout);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, router, config));
    addr
}

async fn exchange(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8(buf).unwrap()
}

// ============================================================
// Router (in-process)
// ============================================================

#[tokio::test]
async fn test_router_serves_json_with_cors() {
    let router = app(Arc::new(api_dispatcher(swept_store())), Duration::from_secs(10));

    let response = router
        .oneshot(Request::get("/v0/mem").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_memory_kB"], 16384000);
}

#[tokio::test]
async fn test_router_unmatched_is_400_with_cors() {
    let router = app(Arc::new(api_dispatcher(swept_store())), Duration::from_secs(10));

    let response = router
        .oneshot(Request::get("/v1/nothing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Bad request");
}

#[tokio::test]
async fn test_router_wrong_method_is_400() {
    let router = app(Arc::new(api_dispatcher(swept_store())), Duration::from_secs(10));

    let response = router
        .oneshot(Request::post("/v0/uptime").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================
// Listener (real TCP)
// ============================================================

#[tokio::test]
async fn test_tcp_request_and_close() {
    let addr = start_server(ListenerConfig::default()).await;

    let response = exchange(
        addr,
        "GET /V0/Uptime/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    let lower = response.to_ascii_lowercase();

    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(lower.contains("access-control-allow-origin: *"), "{response}");
    assert!(lower.contains("connection: close"), "{response}");
    assert!(response.contains("\"formatted\":\"03:25:45\""), "{response}");
}

#[tokio::test]
async fn test_tcp_unmatched_route() {
    let addr = start_server(ListenerConfig::default()).await;

    let response = exchange(
        addr,
        "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 400 Bad Request"), "{response}");
    assert!(response.ends_with("Bad request"), "{response}");
}

#[tokio::test]
async fn test_tcp_keep_alive_serves_multiple_requests() {
    let addr = start_server(ListenerConfig::default()).await;

    let response = exchange(
        addr,
        "GET /v0/cpus HTTP/1.1\r\nHost: localhost\r\n\r\n\
         GET /v0/procs HTTP/1.1\r\nHost: localhost\r\n\r\n\
         GET /v0/mem HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert_eq!(response.matches("HTTP/1.1 200 OK").count(), 3, "{response}");
    assert!(response.contains("\"id\":\"cpu0\""));
    assert!(response.contains("\"name\":\"sshd\""));
    assert!(response.contains("\"free_memory_kB\":8192000"));
}

#[tokio::test]
async fn test_tcp_http10_closes_by_default() {
    let addr = start_server(ListenerConfig::default()).await;

    let response = exchange(addr, "GET /v0/mem HTTP/1.0\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1."), "{response}");
    assert!(response.contains(" 200 OK"), "{response}");
    assert!(response.to_ascii_lowercase().contains("connection: close"), "{response}");
}

#[tokio::test]
async fn test_connection_ceiling() {
    let addr = start_server(ListenerConfig {
        max_connections: 1,
        ..Default::default()
    })
    .await;

    // Holds the only permit without sending anything.
    let idle = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut waiting = TcpStream::connect(addr).await.unwrap();
    waiting
        .write_all(b"GET /v0/mem HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut buf = Vec::new();
    let blocked =
        tokio::time::timeout(Duration::from_millis(300), waiting.read_to_end(&mut buf)).await;
    assert!(blocked.is_err(), "second connection served past the ceiling");

    drop(idle);
    tokio::time::timeout(Duration::from_secs(5), waiting.read_to_end(&mut buf))
        .await
        .expect("second connection never served")
        .unwrap();
    assert!(String::from_utf8_lossy(&buf).starts_with("HTTP/1.1 200 OK"));
}

#[tokio::test]
async fn test_client_that_never_reads_releases_its_slot() {
    // A /v0/procs body of ~20 MB, far more than the socket buffers hold.
    let store = Arc::new(Store::new());
    let command = "x".repeat(300);
    store.store_process_snapshots(
        (1..=50_000)
            .map(|pid| ProcessSnapshot {
                pid,
                name: format!("worker-{pid}"),
                command: command.clone(),
                ..Default::default()
            })
            .collect(),
    );
    let addr = start_server_with(
        store,
        ListenerConfig {
            max_connections: 1,
            write_timeout: Duration::from_millis(500),
            ..Default::default()
        },
    )
    .await;

    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let mut stalled = socket.connect(addr).await.unwrap();
    stalled
        .write_all(b"GET /v0/procs HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = exchange(
        addr,
        "GET /v0/mem HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");

    drop(stalled);
}
