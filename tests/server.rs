//! Local development server tests over real TCP connections.

use carinsight_gateway::prelude::*;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Echo {
    shutdowns: Arc<AtomicUsize>,
}

impl Application for Echo {
    fn call(&self, mut environ: Environ) -> Result<AppResponse, ApplicationError> {
        let body = String::from_utf8_lossy(&environ.read_body()?).into_owned();
        Ok(AppResponse::new(200)
            .header("Content-Type", "text/plain")
            .body(format!(
                "{} {} {} {}",
                environ.request_method, environ.path_info, environ.query_string, body
            )))
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
    shutdowns: Arc<AtomicUsize>,
}

/// Replies with a header value that cannot go on the wire.
struct BadHeader;

impl Application for BadHeader {
    fn call(&self, _environ: Environ) -> Result<AppResponse, ApplicationError> {
        Ok(AppResponse::new(200)
            .header("X-Trace", "line\r\nbreak")
            .body("unreachable"))
    }
}

async fn start(config: GatewayConfig) -> TestServer {
    let shutdowns = Arc::new(AtomicUsize::new(0));
    let app = Echo {
        shutdowns: shutdowns.clone(),
    };
    start_with(config, app, shutdowns).await
}

async fn start_with(
    config: GatewayConfig,
    app: impl Application + 'static,
    shutdowns: Arc<AtomicUsize>,
) -> TestServer {
    let adapter = Arc::new(Adapter::with_app(config.clone(), app));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = GatewayServer::new(config, adapter);
    let task = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
    });

    TestServer {
        addr,
        stop,
        task,
        shutdowns,
    }
}

async fn send(addr: SocketAddr, request: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

fn request(method: &str, target: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut raw = format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    for (name, value) in headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    raw
}

fn header_line<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    response
        .split("\r\n\r\n")
        .next()?
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = start(GatewayConfig::default()).await;

    let response = send(server.addr, request("GET", "/_health", &[], "")).await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("OK"));

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}

#[tokio::test]
async fn test_request_goes_through_adapter() {
    let server = start(GatewayConfig::default()).await;

    let response = send(
        server.addr,
        request(
            "POST",
            "/api/users/?source=web",
            &[("Origin", "https://carinsight.vercel.app")],
            "hello",
        ),
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("POST /users/ source=web hello"));
    assert_eq!(
        header_line(&response, "access-control-allow-origin"),
        Some("https://carinsight.vercel.app")
    );
    assert_eq!(
        header_line(&response, "access-control-allow-credentials"),
        Some("true")
    );

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}

#[tokio::test]
async fn test_preflight_over_http() {
    let server = start(GatewayConfig::default()).await;

    let response = send(server.addr, request("OPTIONS", "/api/users/", &[], "")).await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert_eq!(header_line(&response, "access-control-allow-origin"), Some("*"));
    assert_eq!(header_line(&response, "access-control-max-age"), Some("3600"));

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = start(GatewayConfig::default().max_body_size(8)).await;

    let response = send(
        server.addr,
        request("POST", "/api/users/", &[], "this body is too long"),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 413"));

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_releases_application() {
    let server = start(GatewayConfig::default()).await;
    send(server.addr, request("GET", "/api/ping", &[], "")).await;

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
    assert_eq!(server.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_response_headers_keep_cors() {
    let server = start_with(GatewayConfig::default(), BadHeader, Arc::default()).await;

    let response = send(
        server.addr,
        request("GET", "/api/report", &[("Origin", "https://carinsight.vercel.app")], ""),
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 500"));
    assert_eq!(
        header_line(&response, "access-control-allow-origin"),
        Some("https://carinsight.vercel.app")
    );
    assert_eq!(header_line(&response, "content-type"), Some("application/json"));
    assert!(response.contains("invalid response headers"));
    assert!(!response.contains("unreachable"));

    server.stop.send(()).unwrap();
    server.task.await.unwrap();
}
