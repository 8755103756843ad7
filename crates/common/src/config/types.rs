//! # Configuration Types
//!
//! Common configuration structures shared by the portal service and its
//! external-network clients.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigurationError, PortalError};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Whether to run migrations on startup
    pub run_migrations: bool,

    /// Connection timeout (keep last so the section renders as valid TOML)
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 10,
            min_connections: 1,
            run_migrations: true,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Binding host
    pub host: String,

    /// Binding port
    pub port: u16,

    /// Request timeout
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Get the listening address
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Common configuration validation trait
pub trait ConfigValidation {
    type Error: PortalError;

    /// Validate the configuration
    fn validate(&self) -> Result<(), Self::Error>;

    /// Get configuration warnings (non-fatal issues)
    fn warnings(&self) -> Vec<String> {
        Vec::new()
    }
}

impl ConfigValidation for DatabaseConfig {
    type Error = ConfigurationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.url.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "database.url",
                &self.url,
                "Database URL cannot be empty",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                self.max_connections,
                "Max connections must be greater than 0",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigurationError::invalid_value(
                "database.min_connections",
                self.min_connections,
                "Min connections cannot be greater than max connections",
            ));
        }

        Ok(())
    }
}

impl ConfigValidation for ServerConfig {
    type Error = ConfigurationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.host.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "server.host",
                &self.host,
                "Host cannot be empty",
            ));
        }

        if self.port == 0 {
            return Err(ConfigurationError::invalid_value(
                "server.port",
                self.port,
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_defaults_validate() {
        let config = DatabaseConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_config_rejects_empty_url() {
        let config = DatabaseConfig {
            url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_config_rejects_inverted_pool_bounds() {
        let config = DatabaseConfig {
            min_connections: 20,
            max_connections: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_config_listen_address() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.listen_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_server_config_rejects_zero_port() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
