//! HTTP server configuration parsing from environment variables.

use std::net::SocketAddr;

/// Server environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    /// Load the artifact at startup rather than on the first request.
    pub preload: bool,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            preload: true,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_address: lookup("SERVER_BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("SERVER_PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse::<u16>()
                .unwrap_or(8000),
            preload: lookup("SERVER_PRELOAD")
                .unwrap_or_else(|| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid server address {}:{}: {}", self.bind_address, self.port, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerEnvConfig::from_lookup(|_| None);
        assert_eq!(config, ServerEnvConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_server_config_falls_back_on_bad_port() {
        let config = ServerEnvConfig::from_lookup(|key| match key {
            "SERVER_PORT" => Some("http".to_string()),
            "SERVER_BIND_ADDRESS" => Some("0.0.0.0".to_string()),
            _ => None,
        });
        assert_eq!(config.port, 8000);
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8000");
    }
}
