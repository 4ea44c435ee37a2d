//! # CarInsight Gateway - Serverless HTTP Protocol Adapter
//!
//! The CarInsight backend runs as a single serverless function. The hosting
//! platform hands each invocation a loosely shaped event; this crate turns
//! that event into a canonical HTTP request, drives it through the embedded
//! CarInsight API, and hands back a `{statusCode, headers, body}` value with
//! CORS headers laid on top.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 Serverless Gateway (Vercel, ...)                    │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                   │ InboundEvent
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                             Adapter                                 │
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────┐   ┌────────────┐   │
//! │  │ Normalizer │──►│ CORS policy │──►│  Bridge  │──►│ Finalizer  │   │
//! │  └────────────┘   └─────────────┘   └──────────┘   └────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                   │ Environ / AppResponse
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │         CarInsightApp (users, recommendations, AI analysis)         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use carinsight_gateway::prelude::*;
//! use serde_json::json;
//!
//! struct Hello;
//!
//! impl Application for Hello {
//!     fn call(&self, environ: Environ) -> Result<AppResponse, ApplicationError> {
//!         Ok(AppResponse::new(200).body(format!("Hello from {}", environ.path_info)))
//!     }
//! }
//!
//! let adapter = Adapter::with_app(GatewayConfig::default(), Hello);
//! let response = adapter.handle_json(&json!({
//!     "method": "GET",
//!     "path": "/api/hello",
//!     "headers": {"Origin": "https://carinsight.vercel.app"},
//! }));
//! assert_eq!(response.body, "Hello from /hello");
//! ```
//!
//! ## Guarantees
//!
//! - `OPTIONS` requests are answered by the CORS policy and never reach the
//!   application.
//! - Every response carries `Access-Control-Allow-Origin`; CORS headers
//!   overwrite whatever the application set.
//! - Failures and panics become a JSON 500 instead of escaping to the
//!   gateway.

pub mod adapter;
pub mod app;
pub mod bridge;
pub mod cors;
pub mod event;
pub mod http;
pub mod runtime;
pub mod services;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::adapter::{handler, install, Adapter, AdapterError, AppCell};
    pub use crate::bridge::{AppResponse, Application, ApplicationError, BodyChunks, Environ};
    pub use crate::cors::{CorsConfig, CorsDecision, CorsPolicy};
    pub use crate::event::{EventSource, EventValue, GatewayRequest, JsonEvent};
    pub use crate::http::{CanonicalRequest, CanonicalResponse, GatewayResponse, Method, StatusCode};
    pub use crate::runtime::{GatewayConfig, GatewayServer};
}

// Re-export for convenience
pub use adapter::{handler, Adapter, AdapterError};
pub use http::{CanonicalRequest, CanonicalResponse, GatewayResponse};
pub use runtime::{GatewayConfig, GatewayServer};
