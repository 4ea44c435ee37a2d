//! The CarInsight API, embedded behind the adapter.
//!
//! Routes users, recommendations and AI analyses onto the collaborators in
//! [`crate::services`]. Paths arrive with the mount prefix already removed.

mod analysis;
mod recommendations;
mod users;

use crate::bridge::{AppResponse, Application, ApplicationError, Environ};
use crate::http::{Method, StatusCode};
use crate::services::{AnalysisGateway, RecommendationStore, ServiceError, UserStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_LIMIT: usize = 10;

/// The embedded request handler.
pub struct CarInsightApp {
    users: Arc<dyn UserStore>,
    recommendations: Arc<dyn RecommendationStore>,
    analysis: Option<Arc<dyn AnalysisGateway>>,
}

impl CarInsightApp {
    pub fn new(users: Arc<dyn UserStore>, recommendations: Arc<dyn RecommendationStore>) -> Self {
        Self {
            users,
            recommendations,
            analysis: None,
        }
    }

    /// Attach the language-model gateway. Without one, analysis routes
    /// answer 503.
    pub fn with_analysis(mut self, analysis: Arc<dyn AnalysisGateway>) -> Self {
        self.analysis = Some(analysis);
        self
    }

    fn route(&self, environ: &mut Environ) -> Result<AppResponse, ApplicationError> {
        let method = environ.request_method;
        let path = environ.path_info.clone();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        debug!(%method, path = %path, "routing request");

        match (segments.as_slice(), method) {
            ([] | ["health"], Method::Get) => respond(StatusCode::OK, &json!({"status": "ok"})),

            (["users"], Method::Post) => self.create_user(environ),
            (["users", id], Method::Get) => self.get_user(id),
            (["users", id], Method::Put) => self.update_user(id, environ),
            (["users", id], Method::Delete) => self.delete_user(id),
            (["users", id, "searches"], Method::Post) => self.add_search(id, environ),
            (["users", id, "searches"], Method::Get) => self.list_searches(id, environ),

            (["recommendations"], Method::Post) => self.create_recommendation(environ),
            (["recommendations", "user", id], Method::Get) => {
                self.list_recommendations(id, environ)
            }
            (["recommendations", id], Method::Get) => self.get_recommendation(id),

            (["ai-analysis"], Method::Post) => self.analyze_vehicle(environ),
            (["ai-analysis", "checklist"], Method::Post) => self.build_checklist(environ),
            (["ai-analysis", "insurance"], Method::Post) => self.estimate_insurance(environ),
            (["ai-analysis", "chat"], Method::Post) => self.chat(environ),

            ([] | ["health"], _)
            | (["users"], _)
            | (["users", _], _)
            | (["users", _, "searches"], _)
            | (["recommendations", ..], _)
            | (["ai-analysis", ..], _) => {
                respond_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }

            _ => respond_error(StatusCode::NOT_FOUND, "Not found"),
        }
    }
}

impl Application for CarInsightApp {
    fn call(&self, mut environ: Environ) -> Result<AppResponse, ApplicationError> {
        self.route(&mut environ)
    }
}

fn respond(status: StatusCode, body: &Value) -> Result<AppResponse, ApplicationError> {
    AppResponse::json(status.0, body)
}

fn respond_error(
    status: StatusCode,
    message: impl Into<String>,
) -> Result<AppResponse, ApplicationError> {
    respond(status, &json!({"error": message.into()}))
}

fn service_error(err: ServiceError) -> Result<AppResponse, ApplicationError> {
    match err {
        ServiceError::Validation(message) => respond_error(StatusCode::BAD_REQUEST, message),
        ServiceError::NotFound(_) => respond_error(StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Backend(_) => {
            warn!(error = %err, "collaborator failed");
            respond_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Server error: {err}"))
        }
    }
}

/// Parse the body as JSON. `None` for an empty or malformed body.
fn json_body(environ: &mut Environ) -> Result<Option<Value>, ApplicationError> {
    let body = environ.read_body()?;
    if body.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_slice(&body).ok())
}

fn limit_param(environ: &Environ) -> usize {
    environ
        .query_param("limit")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_LIMIT)
}
