//! Canonical HTTP types shared by the adapter stages.

mod request;
mod response;

pub use request::{CanonicalRequest, Method};
pub use response::{CanonicalResponse, GatewayResponse, StatusCode};
