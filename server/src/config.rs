//! Runtime configuration for the drawing server

use shared::DEFAULT_PORT;

/// Settings the server needs to start listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the WebSocket listener to
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            bind_addr: format!("{}:{}", host, port),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_config_from_host_and_port() {
        let config = ServerConfig::new("0.0.0.0", 8080);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.bind_addr.parse::<std::net::SocketAddr>().is_ok());
    }
}
