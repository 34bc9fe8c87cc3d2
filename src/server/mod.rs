//! HTTP endpoint layer
//!
//! Serves the viewer page and the MJPEG stream on top of `axum`.

pub mod config;
pub mod listener;
pub mod routes;

pub use config::{parse_bind_addr, ServerConfig, DEFAULT_PORT};
pub use listener::RelayServer;
pub use routes::INDEX_HTML;
