//! The gateway-facing adapter.
//!
//! ```text
//! event ─► normalize ─► OPTIONS? ──yes──► preflight ─────────────┐
//!                          │                                     ▼
//!                          └─no─► bridge::invoke ─► finalize ─► GatewayResponse
//!                                                                ▲
//!            any failure or panic ─► error_response ─────────────┘
//! ```

mod error;
mod finalize;
mod normalize;

pub use error::AdapterError;
pub use finalize::{error_response, finalize};
pub use normalize::{normalize, resolve_headers};

use crate::bridge::{self, Application, ApplicationError};
use crate::cors::CorsPolicy;
use crate::event::{EventSource, JsonEvent};
use crate::http::{CanonicalResponse, GatewayResponse};
use crate::runtime::GatewayConfig;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Boxed error returned by application factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type AppFactory = Box<dyn Fn() -> Result<Arc<dyn Application>, BoxError> + Send + Sync>;

/// Process-scoped slot for the embedded application.
///
/// The factory runs at most once, on first use. Its outcome, failure
/// included, is kept for the life of the process.
pub struct AppCell {
    cell: OnceCell<Result<Arc<dyn Application>, String>>,
    factory: AppFactory,
    shut_down: AtomicBool,
}

impl AppCell {
    /// Build the application lazily on first request.
    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Application>, BoxError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(factory),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Use an already constructed application.
    pub fn ready(app: Arc<dyn Application>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Ok(app));
        Self {
            cell,
            factory: Box::new(|| Err("application already constructed".into())),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Whether the factory has run.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The application, constructing it if this is the first use.
    pub fn get(&self) -> Result<&Arc<dyn Application>, AdapterError> {
        self.cell
            .get_or_init(|| {
                info!("initializing embedded application");
                (self.factory)().map_err(|err| {
                    error!(error = %err, "embedded application failed to initialize");
                    err.to_string()
                })
            })
            .as_ref()
            .map_err(|message| AdapterError::Initialization(message.clone()))
    }

    /// Run the application's teardown hook once, if it was ever built.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(Ok(app)) = self.cell.get() {
            info!("shutting down embedded application");
            app.shutdown();
        }
    }
}

/// HTTP protocol adapter between a serverless gateway and an embedded
/// application.
pub struct Adapter {
    config: GatewayConfig,
    cors: CorsPolicy,
    app: AppCell,
}

impl Adapter {
    /// Create an adapter.
    pub fn new(config: GatewayConfig, app: AppCell) -> Self {
        let cors = CorsPolicy::new(config.cors.clone());
        Self { config, cors, app }
    }

    /// Create an adapter around an already constructed application.
    pub fn with_app(config: GatewayConfig, app: impl Application + 'static) -> Self {
        Self::new(config, AppCell::ready(Arc::new(app)))
    }

    /// The CORS policy applied to every response.
    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// The embedded application slot.
    pub fn app(&self) -> &AppCell {
        &self.app
    }

    /// Handle one inbound event. Never fails and never panics past this
    /// call; every path ends in a well-formed response.
    pub fn handle(&self, event: &dyn EventSource) -> GatewayResponse {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(event)))
            .unwrap_or_else(|payload| {
                Err(ApplicationError::Panicked(panic_message(payload.as_ref())).into())
            });

        match outcome {
            Ok(response) => response.into(),
            Err(err) => {
                error!(kind = err.kind(), error = %err, "request failed");
                let headers = resolve_headers(event);
                let decision = self.cors.decide(headers.get("origin").map(String::as_str));
                error_response(&err, &self.cors, &decision).into()
            }
        }
    }

    /// Handle an event delivered as JSON.
    pub fn handle_json(&self, event: &Value) -> GatewayResponse {
        self.handle(&JsonEvent::new(event))
    }

    /// Release the embedded application. Call once at process shutdown.
    pub fn shutdown(&self) {
        self.app.shutdown();
    }

    fn dispatch(&self, event: &dyn EventSource) -> Result<CanonicalResponse, AdapterError> {
        let request = normalize(event, &self.config.mount_prefix)?;
        debug!(
            method = %request.method,
            path = %request.path,
            query = %request.query_string,
            "normalized inbound event"
        );

        let decision = self.cors.decide(request.origin());
        if request.method.is_preflight() {
            return Ok(self.cors.preflight(&decision));
        }

        let app = self.app.get()?;
        let response = bridge::invoke(app.as_ref(), request)?;
        Ok(finalize(response, &self.cors, &decision))
    }
}

static INSTALLED: OnceCell<Arc<Adapter>> = OnceCell::new();

/// Install the process-wide adapter. The first installation wins.
pub fn install(adapter: Adapter) -> Arc<Adapter> {
    if INSTALLED.get().is_some() {
        warn!("adapter already installed, keeping the existing one");
    }
    INSTALLED.get_or_init(|| Arc::new(adapter)).clone()
}

/// Gateway entry point: handle a JSON event with the installed adapter.
pub fn handler(event: &Value) -> GatewayResponse {
    match INSTALLED.get() {
        Some(adapter) => adapter.handle_json(event),
        None => {
            let cors = CorsPolicy::default();
            let headers = resolve_headers(&JsonEvent::new(event));
            let decision = cors.decide(headers.get("origin").map(String::as_str));
            let err = AdapterError::Initialization("no adapter installed".to_string());
            error!(error = %err, "request failed");
            error_response(&err, &cors, &decision).into()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
