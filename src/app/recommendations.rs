use super::{json_body, limit_param, respond, respond_error, service_error, CarInsightApp};
use crate::bridge::{AppResponse, ApplicationError, Environ};
use crate::http::StatusCode;
use crate::services::NewRecommendation;
use serde_json::json;

impl CarInsightApp {
    pub(super) fn create_recommendation(
        &self,
        environ: &mut Environ,
    ) -> Result<AppResponse, ApplicationError> {
        let Some(data) = json_body(environ)? else {
            return respond_error(StatusCode::BAD_REQUEST, "Missing or invalid JSON body");
        };
        let new_rec: NewRecommendation = match serde_json::from_value(data) {
            Ok(rec) => rec,
            Err(err) => return respond_error(StatusCode::BAD_REQUEST, format!("Invalid recommendation: {err}")),
        };

        match self.recommendations.create_recommendation(new_rec) {
            Ok(rec) => respond(StatusCode::CREATED, &json!({"success": true, "recommendation": rec})),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn list_recommendations(
        &self,
        user_id: &str,
        environ: &mut Environ,
    ) -> Result<AppResponse, ApplicationError> {
        let limit = limit_param(environ);
        match self.recommendations.list_recommendations_by_user(user_id, limit) {
            Ok(recs) => respond(StatusCode::OK, &json!({"success": true, "recommendations": recs})),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn get_recommendation(&self, id: &str) -> Result<AppResponse, ApplicationError> {
        match self.recommendations.get_recommendation(id) {
            Ok(Some(rec)) => respond(StatusCode::OK, &json!({"success": true, "recommendation": rec})),
            Ok(None) => respond_error(StatusCode::NOT_FOUND, "Recommendation not found"),
            Err(err) => service_error(err),
        }
    }
}
