//! Server configuration

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::stream::{MultipartEncoder, SessionConfig};

/// Default port for the HTTP server
pub const DEFAULT_PORT: u16 = 8283;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent stream sessions (0 = unlimited)
    pub max_sessions: usize,

    /// Per-session streaming options
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_sessions: 0, // Unlimited
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum concurrent sessions
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the pause between session ticks
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.session.tick_interval = interval;
        self
    }

    /// Set the multipart boundary token
    pub fn boundary(mut self, boundary: &str) -> Self {
        let content_type = self.session.multipart.part_content_type().to_string();
        self.session.multipart = MultipartEncoder::new(boundary, &content_type);
        self
    }

    /// Set the content type announced for each frame
    ///
    /// Must match the producer's encoder, see [`Producer::content_type`].
    ///
    /// [`Producer::content_type`]: crate::relay::Producer::content_type
    pub fn part_content_type(mut self, content_type: &str) -> Self {
        let boundary = self.session.multipart.boundary().to_string();
        self.session.multipart = MultipartEncoder::new(boundary, content_type);
        self
    }
}

/// Parse a bind address given as `IP:PORT`, `IP` or `localhost`
///
/// A missing port defaults to [`DEFAULT_PORT`].
pub fn parse_bind_addr(arg: &str) -> Result<SocketAddr> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(Error::Config(format!(
        "invalid bind address '{}', expected IP:PORT, IP or 'localhost'",
        arg
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::DEFAULT_TICK_INTERVAL;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8283);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.max_sessions, 0);
        assert_eq!(config.session.tick_interval, DEFAULT_TICK_INTERVAL);
        assert_eq!(config.session.multipart.boundary(), "frame");
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_sessions(4)
            .tick_interval(Duration::from_millis(33))
            .boundary("cam");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_sessions, 4);
        assert_eq!(config.session.tick_interval, Duration::from_millis(33));
        assert_eq!(
            config.session.multipart.content_type(),
            "multipart/x-mixed-replace; boundary=cam"
        );
    }

    #[test]
    fn test_part_content_type_keeps_boundary() {
        let config = ServerConfig::default()
            .boundary("cam")
            .part_content_type("image/png");
        let part = config
            .session
            .multipart
            .part(bytes::Bytes::from_static(b"x"))
            .to_bytes();

        assert!(part.starts_with(b"--cam\r\nContent-Type: image/png\r\n\r\n"));

        // Changing the boundary afterwards keeps the content type
        let config = config.boundary("other");
        assert_eq!(config.session.multipart.part_content_type(), "image/png");
        assert_eq!(config.session.multipart.boundary(), "other");
    }

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(
            parse_bind_addr("127.0.0.1:9000").unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_bind_addr("localhost").unwrap(),
            "127.0.0.1:8283".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(parse_bind_addr("0.0.0.0").unwrap().port(), DEFAULT_PORT);
        assert!(matches!(parse_bind_addr("camera"), Err(Error::Config(_))));
    }
}
