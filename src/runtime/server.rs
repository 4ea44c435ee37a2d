//! Local development gateway.
//!
//! Emulates the serverless platform: each HTTP request becomes a
//! [`GatewayRequest`] event, the adapter handles it on a blocking thread,
//! and the returned [`GatewayResponse`] is written back.

use crate::adapter::{error_response, Adapter, AdapterError};
use crate::bridge::ApplicationError;
use crate::event::GatewayRequest;
use crate::http::{CanonicalResponse, GatewayResponse, StatusCode};
use crate::runtime::GatewayConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// HTTP server that feeds requests through the adapter.
pub struct GatewayServer {
    /// Server configuration.
    config: GatewayConfig,
    /// The adapter every request goes through.
    adapter: Arc<Adapter>,
}

impl GatewayServer {
    /// Create a new server.
    pub fn new(config: GatewayConfig, adapter: Arc<Adapter>) -> Self {
        Self { config, adapter }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Gateway listening on {}", addr);

        self.serve(listener, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", err);
            }
        })
        .await
    }

    /// Serve connections from `listener` until `shutdown` resolves, then
    /// tear the adapter down.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Gateway shutting down");
                    break;
                }
            };
            let io = TokioIo::new(stream);

            let adapter = self.adapter.clone();
            let config = self.config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let adapter = adapter.clone();
                    let config = config.clone();
                    async move { handle_request(req, adapter, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }

        let adapter = self.adapter.clone();
        tokio::task::spawn_blocking(move || adapter.shutdown()).await?;
        Ok(())
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    adapter: Arc<Adapter>,
    config: GatewayConfig,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let origin = req
        .headers()
        .get(hyper::header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    debug!("Handling request: {} {} from {}", req.method(), path, remote_addr);

    if config.enable_health && path == "/_health" {
        return Ok(build_response(
            CanonicalResponse::new(StatusCode::OK)
                .header("Content-Type", "text/plain")
                .body("OK")
                .into(),
            &adapter,
            origin.as_deref(),
        ));
    }

    let event = match convert_request(req, &config).await? {
        Some(event) => event,
        None => {
            warn!("Request body too large from {}", remote_addr);
            return Ok(build_response(
                CanonicalResponse::new(StatusCode::PAYLOAD_TOO_LARGE)
                    .header("Content-Type", "text/plain")
                    .body("Request body too large")
                    .into(),
                &adapter,
                origin.as_deref(),
            ));
        }
    };

    let worker = adapter.clone();
    let response = match tokio::task::spawn_blocking(move || worker.handle(&event)).await {
        Ok(response) => response,
        Err(err) => {
            error!("Adapter task failed: {}", err);
            fallback_response(&adapter, origin.as_deref(), format!("adapter task failed: {err}"))
        }
    };
    Ok(build_response(response, &adapter, origin.as_deref()))
}

/// Convert a hyper request into a gateway event the way the hosting
/// platform does: the path keeps its query suffix and the full URL rides
/// along. `None` when the body exceeds the configured limit.
async fn convert_request(
    req: Request<Incoming>,
    config: &GatewayConfig,
) -> Result<Option<GatewayRequest>, hyper::Error> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let mut event = GatewayRequest::new()
        .method(req.method().as_str())
        .path(path_and_query.clone())
        .url(path_and_query);

    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            event = event.header(name.as_str(), v);
        }
    }

    let body_bytes = req.collect().await?.to_bytes();
    if body_bytes.len() > config.max_body_size {
        return Ok(None);
    }
    if !body_bytes.is_empty() {
        event = event.body(body_bytes);
    }
    Ok(Some(event))
}

/// Build a hyper Response from a gateway response. A response hyper
/// rejects is replaced by the adapter's error response.
fn build_response(
    response: GatewayResponse,
    adapter: &Adapter,
    origin: Option<&str>,
) -> Response<Full<Bytes>> {
    match to_hyper(response) {
        Ok(response) => response,
        Err(err) => {
            error!("Invalid response headers: {}", err);
            let fallback =
                fallback_response(adapter, origin, format!("invalid response headers: {err}"));
            to_hyper(fallback).unwrap_or_else(|_| {
                let body = Full::new(Bytes::from_static(b"Internal Server Error"));
                let mut plain = Response::new(body);
                *plain.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                plain
            })
        }
    }
}

fn to_hyper(response: GatewayResponse) -> Result<Response<Full<Bytes>>, hyper::http::Error> {
    let status = hyper::StatusCode::from_u16(response.status_code).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            response.status_code
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }
    builder.body(Full::new(Bytes::from(response.body)))
}

/// The JSON 500, with CORS headers, for failures outside the adapter.
fn fallback_response(
    adapter: &Adapter,
    origin: Option<&str>,
    message: String,
) -> GatewayResponse {
    let cors = adapter.cors();
    let err = AdapterError::from(ApplicationError::new(message));
    error_response(&err, cors, &cors.decide(origin)).into()
}
