//! Gateway configuration and the local development gateway.

mod config;
mod server;

pub use config::GatewayConfig;
pub use server::GatewayServer;
