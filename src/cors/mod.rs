//! CORS policy applied to every response the adapter emits.
//!
//! The policy is fixed: any non-empty `Origin` is echoed back with
//! credentials allowed, and a missing `Origin` falls back to `*` without
//! credentials. Origins under the deployment platform's domain take their
//! own branch, which produces the same headers as the fallback.

use crate::http::{CanonicalResponse, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// CORS header names.
pub mod header {
    pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
    pub const ACCESS_CONTROL_ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";
    pub const ACCESS_CONTROL_ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
    pub const ACCESS_CONTROL_ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
    pub const ACCESS_CONTROL_EXPOSE_HEADERS: &str = "Access-Control-Expose-Headers";
    pub const ACCESS_CONTROL_MAX_AGE: &str = "Access-Control-Max-Age";
}

/// CORS policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Domain suffix of the hosting platform's deployments.
    pub platform_suffix: String,
    /// Value of `Access-Control-Allow-Methods`.
    pub allow_methods: String,
    /// Value of `Access-Control-Allow-Headers`.
    pub allow_headers: String,
    /// Value of `Access-Control-Expose-Headers`.
    pub expose_headers: String,
    /// Preflight cache lifetime in seconds.
    pub max_age: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            platform_suffix: ".vercel.app".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization".to_string(),
            expose_headers: "Authorization".to_string(),
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    /// Set the platform domain suffix.
    pub fn platform_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.platform_suffix = suffix.into();
        self
    }
}

/// Allow-origin outcome for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    pub allow_origin: String,
    pub allow_credentials: bool,
}

impl CorsDecision {
    fn echo(origin: &str) -> Self {
        Self {
            allow_origin: origin.to_string(),
            allow_credentials: true,
        }
    }

    fn wildcard() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_credentials: false,
        }
    }

    fn credentials_value(&self) -> &'static str {
        if self.allow_credentials {
            "true"
        } else {
            "false"
        }
    }
}

/// Computes CORS headers and preflight responses.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    config: CorsConfig,
}

impl CorsPolicy {
    /// Create a policy from its settings.
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    /// Decide the allow-origin pair for the request's `Origin` header.
    pub fn decide(&self, origin: Option<&str>) -> CorsDecision {
        match origin {
            Some(origin) if self.is_platform_origin(origin) => {
                trace!(origin, "platform origin");
                CorsDecision::echo(origin)
            }
            Some(origin) if is_present(origin) => CorsDecision::echo(origin),
            _ => CorsDecision::wildcard(),
        }
    }

    /// Terminal response for an `OPTIONS` probe.
    pub fn preflight(&self, decision: &CorsDecision) -> CanonicalResponse {
        CanonicalResponse::new(StatusCode::OK)
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, &decision.allow_origin)
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, &self.config.allow_methods)
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS, &self.config.allow_headers)
            .header(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                decision.credentials_value(),
            )
            .header(header::ACCESS_CONTROL_MAX_AGE, self.config.max_age.to_string())
    }

    /// Overlay CORS headers on a real response. Existing headers with the
    /// same names are replaced regardless of case.
    pub fn apply(&self, decision: &CorsDecision, response: &mut CanonicalResponse) {
        response.set_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, &decision.allow_origin);
        response.set_header(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            decision.credentials_value(),
        );
        response.set_header(header::ACCESS_CONTROL_ALLOW_HEADERS, &self.config.allow_headers);
        response.set_header(header::ACCESS_CONTROL_ALLOW_METHODS, &self.config.allow_methods);
        response.set_header(header::ACCESS_CONTROL_EXPOSE_HEADERS, &self.config.expose_headers);
    }

    fn is_platform_origin(&self, origin: &str) -> bool {
        let suffix = self.config.platform_suffix.as_str();
        is_present(origin)
            && !suffix.is_empty()
            && (origin.ends_with(suffix) || origin.ends_with(suffix.trim_start_matches('.')))
    }
}

/// A literal `*` origin is treated like a missing one.
fn is_present(origin: &str) -> bool {
    !origin.is_empty() && origin != "*"
}
