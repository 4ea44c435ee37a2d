use super::{json_body, respond, respond_error, service_error, CarInsightApp};
use crate::bridge::{AppResponse, ApplicationError, Environ};
use crate::http::StatusCode;
use crate::services::{AnalysisGateway, ChatMessage};
use serde_json::{json, Value};
use std::sync::Arc;

impl CarInsightApp {
    pub(super) fn analyze_vehicle(&self, environ: &mut Environ) -> Result<AppResponse, ApplicationError> {
        let (gateway, vehicle) = match self.analysis_input(environ)? {
            Ok(input) => input,
            Err(response) => return Ok(response),
        };
        match gateway.analyze_vehicle(&vehicle) {
            Ok(analysis) => respond(
                StatusCode::OK,
                &json!({
                    "status": "success",
                    "vehicle": {
                        "make": vehicle.get("make"),
                        "model": vehicle.get("model"),
                        "year": vehicle.get("year"),
                    },
                    "aiAnalysis": analysis,
                }),
            ),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn build_checklist(&self, environ: &mut Environ) -> Result<AppResponse, ApplicationError> {
        let (gateway, vehicle) = match self.analysis_input(environ)? {
            Ok(input) => input,
            Err(response) => return Ok(response),
        };
        match gateway.build_checklist(&vehicle) {
            Ok(checklist) => respond(StatusCode::OK, &json!({"status": "success", "checklist": checklist})),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn estimate_insurance(
        &self,
        environ: &mut Environ,
    ) -> Result<AppResponse, ApplicationError> {
        let (gateway, vehicle) = match self.analysis_input(environ)? {
            Ok(input) => input,
            Err(response) => return Ok(response),
        };
        match gateway.estimate_insurance(&vehicle) {
            Ok(estimate) => respond(StatusCode::OK, &json!({"status": "success", "insurance": estimate})),
            Err(err) => service_error(err),
        }
    }

    /// Body: `{"car": {..}, "messages": [{"role": .., "content": ..}]}`.
    pub(super) fn chat(&self, environ: &mut Environ) -> Result<AppResponse, ApplicationError> {
        let (gateway, mut body) = match self.analysis_input(environ)? {
            Ok(input) => input,
            Err(response) => return Ok(response),
        };
        let vehicle = body.get_mut("car").map(Value::take).unwrap_or(Value::Null);
        let history: Vec<ChatMessage> = match body.get_mut("messages").map(Value::take) {
            Some(messages) => match serde_json::from_value(messages) {
                Ok(history) => history,
                Err(err) => return respond_error(StatusCode::BAD_REQUEST, format!("Invalid messages: {err}")),
            },
            None => Vec::new(),
        };

        match gateway.chat(&vehicle, &history) {
            Ok(reply) => respond(StatusCode::OK, &json!({"status": "success", "reply": reply})),
            Err(err) => service_error(err),
        }
    }

    /// The configured gateway and the JSON body, or the response to send
    /// instead.
    fn analysis_input(
        &self,
        environ: &mut Environ,
    ) -> Result<Result<(Arc<dyn AnalysisGateway>, Value), AppResponse>, ApplicationError> {
        let Some(gateway) = self.analysis.clone() else {
            return respond_error(StatusCode::SERVICE_UNAVAILABLE, "AI analysis is not configured").map(Err);
        };
        match json_body(environ)? {
            Some(body) if !body.is_null() => Ok(Ok((gateway, body))),
            _ => respond_error(StatusCode::BAD_REQUEST, "Missing or invalid JSON body").map(Err),
        }
    }
}
