//! Gateway server configuration

use std::net::{Ipv4Addr, SocketAddr};

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Default upper bound for one inbound control frame
pub const DEFAULT_MAX_CONTROL_FRAME: usize = 4 * 1024;

/// Gateway server configuration options
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent viewers (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Application-level read buffer size
    pub read_buffer_size: usize,

    /// Largest control frame a viewer may send
    pub max_control_frame: usize,

    /// Pending control messages per viewer before reads pause
    pub control_queue: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,  // Low latency video
            read_buffer_size: 8 * 1024,
            max_control_frame: DEFAULT_MAX_CONTROL_FRAME,
            control_queue: 16,
        }
    }
}

impl GatewayConfig {
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

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Set the control frame limit
    pub fn max_control_frame(mut self, size: usize) -> Self {
        self.max_control_frame = size;
        self
    }

    pub fn control_queue(mut self, size: usize) -> Self {
        self.control_queue = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();

        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.bind_addr.ip().is_loopback());
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.max_control_frame, DEFAULT_MAX_CONTROL_FRAME);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let config = GatewayConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
    }

    #[test]
    fn test_builder_floors() {
        let config = GatewayConfig::default().read_buffer_size(0).control_queue(0);

        assert_eq!(config.read_buffer_size, 1);
        assert_eq!(config.control_queue, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let config = GatewayConfig::default()
            .bind(addr)
            .max_connections(50)
            .tcp_nodelay(false)
            .max_control_frame(256);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert!(!config.tcp_nodelay);
        assert_eq!(config.max_control_frame, 256);
    }
}
