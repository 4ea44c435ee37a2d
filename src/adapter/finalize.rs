//! Response finalizer: CORS overlay and the error path.

use super::AdapterError;
use crate::cors::{CorsDecision, CorsPolicy};
use crate::http::{CanonicalResponse, StatusCode};
use serde_json::json;

/// Lay CORS headers over the application's headers. Status and body pass
/// through unchanged.
pub fn finalize(
    mut response: CanonicalResponse,
    cors: &CorsPolicy,
    decision: &CorsDecision,
) -> CanonicalResponse {
    cors.apply(decision, &mut response);
    response
}

/// The 500 response for any adapter failure.
pub fn error_response(
    err: &AdapterError,
    cors: &CorsPolicy,
    decision: &CorsDecision,
) -> CanonicalResponse {
    let payload = json!({
        "error": err.to_string(),
        "type": err.kind(),
        "traceback": err.trace(),
    });
    finalize(
        CanonicalResponse::json(StatusCode::INTERNAL_SERVER_ERROR, &payload),
        cors,
        decision,
    )
}
