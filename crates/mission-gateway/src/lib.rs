//! mission-gateway: reverse proxy for the Mission Control dashboard.
//!
//! Serves the pre-built dashboard bundle under `/mission` (optionally behind
//! a shared-secret token) and forwards everything else, including WebSocket
//! upgrades, byte-for-byte to the upstream gateway process.

pub mod config;
pub mod error;
pub mod gateway;
pub mod server;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use server::GatewayServer;
