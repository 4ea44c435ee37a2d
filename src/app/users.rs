use super::{json_body, limit_param, respond, respond_error, service_error, CarInsightApp};
use crate::bridge::{AppResponse, ApplicationError, Environ};
use crate::http::StatusCode;
use crate::services::{NewUser, REQUIRED_USER_FIELDS};
use serde_json::json;

impl CarInsightApp {
    pub(super) fn create_user(&self, environ: &mut Environ) -> Result<AppResponse, ApplicationError> {
        let Some(data) = json_body(environ)? else {
            return respond_error(StatusCode::BAD_REQUEST, "Missing or invalid JSON body");
        };

        let missing: Vec<&str> = REQUIRED_USER_FIELDS
            .iter()
            .copied()
            .filter(|field| data.get(field).is_none())
            .collect();
        if !missing.is_empty() {
            return respond_error(
                StatusCode::BAD_REQUEST,
                format!("Missing required fields: {}", missing.join(", ")),
            );
        }

        let new_user: NewUser = match serde_json::from_value(data) {
            Ok(user) => user,
            Err(err) => return respond_error(StatusCode::BAD_REQUEST, format!("Invalid user: {err}")),
        };
        match self.users.create_user(new_user) {
            Ok(user) => respond(StatusCode::CREATED, &json!({"success": true, "user": user})),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn get_user(&self, user_id: &str) -> Result<AppResponse, ApplicationError> {
        match self.users.get_user(user_id) {
            Ok(Some(user)) => respond(StatusCode::OK, &json!({"success": true, "user": user})),
            Ok(None) => respond_error(StatusCode::NOT_FOUND, "User not found"),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn update_user(
        &self,
        user_id: &str,
        environ: &mut Environ,
    ) -> Result<AppResponse, ApplicationError> {
        let updates = match json_body(environ)? {
            Some(serde_json::Value::Object(updates)) if !updates.is_empty() => updates,
            _ => return respond_error(StatusCode::BAD_REQUEST, "No data provided"),
        };

        match self.users.update_user(user_id, &updates) {
            Ok(true) => respond(
                StatusCode::OK,
                &json!({"success": true, "message": "User profile updated successfully"}),
            ),
            Ok(false) => respond_error(StatusCode::NOT_FOUND, "User not found"),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn delete_user(&self, user_id: &str) -> Result<AppResponse, ApplicationError> {
        match self.users.delete_user(user_id) {
            Ok(true) => respond(
                StatusCode::OK,
                &json!({"success": true, "message": "User deleted successfully"}),
            ),
            Ok(false) => respond_error(StatusCode::NOT_FOUND, "User not found"),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn add_search(
        &self,
        user_id: &str,
        environ: &mut Environ,
    ) -> Result<AppResponse, ApplicationError> {
        let filters = json_body(environ)?
            .and_then(|mut data| data.get_mut("filters").map(serde_json::Value::take));
        let Some(filters) = filters else {
            return respond_error(StatusCode::BAD_REQUEST, "Missing 'filters' field");
        };

        match self.users.add_search(user_id, filters) {
            Ok(true) => respond(
                StatusCode::OK,
                &json!({"success": true, "message": "Search added to history"}),
            ),
            Ok(false) => respond_error(StatusCode::NOT_FOUND, "User not found"),
            Err(err) => service_error(err),
        }
    }

    pub(super) fn list_searches(
        &self,
        user_id: &str,
        environ: &mut Environ,
    ) -> Result<AppResponse, ApplicationError> {
        match self.users.list_searches(user_id, limit_param(environ)) {
            Ok(searches) => respond(StatusCode::OK, &json!({"success": true, "searches": searches})),
            Err(err) => service_error(err),
        }
    }
}
