//! Error handling for the pillar portal
//!
//! Defines the error infrastructure shared by all portal crates:
//! - `PortalError` trait for consistent error handling
//! - Specific error types for the infrastructure domains (network,
//!   configuration, persistence)
//! - Integration with `thiserror` for ergonomic error handling
//!
//! Domain errors (registration, codec decoding) live next to the code
//! that produces them; the enums here cover the concerns every crate
//! shares.

use thiserror::Error;

/// Base trait for all portal-specific errors
///
/// Ensures every portal error is:
/// - Thread-safe (Send + Sync)
/// - Static lifetime (no borrowed data)
/// - Implementing the standard Error trait
pub trait PortalError: std::error::Error + Send + Sync + 'static {}

/// Network-related errors
///
/// These occur during HTTP calls to the external collaborators: the
/// signature verification authority, the pillar source, and the frontier
/// ledger lookup.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection failed to establish
    #[error("Failed to connect to {endpoint}: {source}")]
    ConnectionFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Request timed out
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status
    #[error("HTTP error {status_code}: {message}")]
    HttpError { status_code: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response format: {details}")]
    InvalidResponse { details: String },
}

impl PortalError for NetworkError {}

impl NetworkError {
    /// Create a connection failed error from any error type
    pub fn connection_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(details: impl Into<String>) -> Self {
        Self::InvalidResponse {
            details: details.into(),
        }
    }
}

/// Configuration-related errors
///
/// These occur during configuration loading, parsing, or validation.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// Environment variable error
    #[error("Environment variable error for {var}: {details}")]
    EnvironmentError { var: String, details: String },
}

impl PortalError for ConfigurationError {}

impl ConfigurationError {
    /// Create an invalid value error
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Database and persistence-related errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Database connection failed
    #[error("Database connection failed: {source}")]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Database query failed
    #[error("Database query failed: {details}")]
    QueryFailed { details: String },

    /// Database migration failed
    #[error("Database migration failed: {details}")]
    MigrationFailed { details: String },

    /// Unique constraint violation
    #[error("Database constraint violation: {constraint}")]
    ConstraintViolation { constraint: String },

    /// Record not found
    #[error("Record not found: {details}")]
    NotFound { details: String },

    /// Stored value could not be decoded into its entity type
    #[error("Data corruption detected in {location}: {details}")]
    DataCorruption { location: String, details: String },
}

impl PortalError for PersistenceError {}

impl PersistenceError {
    /// Create a query failed error from any error type
    pub fn query_failed(details: impl ToString) -> Self {
        Self::QueryFailed {
            details: details.to_string(),
        }
    }

    /// Create a data corruption error
    pub fn data_corruption(location: impl Into<String>, details: impl ToString) -> Self {
        Self::DataCorruption {
            location: location.into(),
            details: details.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let network_err = NetworkError::ConnectionFailed {
            endpoint: "localhost:8080".to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Connection refused",
            )),
        };

        let display = format!("{network_err}");
        assert!(display.contains("localhost:8080"));
        assert!(display.contains("Failed to connect"));
    }

    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let network_err = NetworkError::connection_failed("verifier.example:443", io_error);

        assert!(network_err.source().is_some());
    }

    #[test]
    fn test_portal_error_trait() {
        fn assert_portal_error(_: impl PortalError) {}

        assert_portal_error(NetworkError::Timeout { timeout_secs: 30 });
        assert_portal_error(ConfigurationError::FileNotFound {
            path: "config.toml".to_string(),
        });
        assert_portal_error(PersistenceError::NotFound {
            details: "pillar".to_string(),
        });
    }

    #[test]
    fn test_invalid_value_helper() {
        let err = ConfigurationError::invalid_value("server.port", 0, "port must be non-zero");
        let display = format!("{err}");
        assert!(display.contains("server.port"));
        assert!(display.contains("port must be non-zero"));
    }
}
