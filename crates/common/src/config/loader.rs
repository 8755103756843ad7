//! # Configuration Loader
//!
//! Figment-based configuration loading with layered support:
//! 1. Compiled defaults
//! 2. Configuration file (TOML)
//! 3. Environment variable overrides
//!
//! Nested fields map to environment variables with a double underscore,
//! e.g. `PORTAL_DATABASE__URL`.

use crate::error::ConfigurationError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default configuration file name
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable prefix for the portal
const DEFAULT_ENV_PREFIX: &str = "PORTAL";

/// Configuration loading options
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Optional path to configuration file
    pub config_path: Option<PathBuf>,
    /// Environment variable prefix
    pub env_prefix: String,
    /// Whether configuration file is required
    pub require_file: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            require_file: false,
        }
    }
}

/// Load configuration with the default layered approach
///
/// # Configuration Layer Priority (highest to lowest)
/// 1. Environment variables (PORTAL_*)
/// 2. Configuration file (config.toml or PORTAL_CONFIG_PATH)
/// 3. Compiled defaults
pub fn load_config<T>() -> Result<T, ConfigurationError>
where
    T: Default + DeserializeOwned + serde::Serialize,
{
    load_config_with_options::<T>(LoadOptions::default())
}

/// Load configuration from a specific file, with environment overrides
pub fn load_from_file<T>(path: &Path) -> Result<T, ConfigurationError>
where
    T: Default + DeserializeOwned + serde::Serialize,
{
    let options = LoadOptions {
        config_path: Some(path.to_path_buf()),
        env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        require_file: true,
    };
    load_config_with_options::<T>(options)
}

/// Load configuration with custom options
pub fn load_config_with_options<T>(options: LoadOptions) -> Result<T, ConfigurationError>
where
    T: Default + DeserializeOwned + serde::Serialize,
{
    // Start with compiled defaults
    let mut figment = Figment::new().merge(Serialized::defaults(T::default()));

    let config_path = determine_config_path(options.config_path, &options.env_prefix)?;

    if let Some(path) = &config_path {
        if path.exists() {
            info!("Loading configuration from file: {}", path.display());
            figment = figment.merge(Toml::file(path));
        } else if options.require_file {
            return Err(ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            });
        } else {
            warn!(
                "Configuration file not found: {} (using defaults)",
                path.display()
            );
        }
    }

    debug!(
        "Loading environment variables with prefix: {}",
        options.env_prefix
    );
    figment = figment.merge(
        Env::prefixed(&format!("{}_", options.env_prefix))
            .split("__")
            .ignore(&["PATH", "HOME", "USER"]),
    );

    let config: T = figment
        .extract()
        .map_err(|err| ConfigurationError::ParseError {
            details: format!("Failed to parse configuration: {err}"),
        })?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Determine configuration file path with fallback logic
fn determine_config_path(
    override_path: Option<PathBuf>,
    env_prefix: &str,
) -> Result<Option<PathBuf>, ConfigurationError> {
    if let Some(path) = override_path {
        return Ok(Some(path));
    }

    let env_var = format!("{env_prefix}_CONFIG_PATH");
    if let Ok(env_path) = std::env::var(&env_var) {
        let path = PathBuf::from(env_path);
        debug!("Using config path from environment: {}", path.display());
        return Ok(Some(path));
    }

    let current_dir_config = std::env::current_dir()
        .map_err(|e| ConfigurationError::EnvironmentError {
            var: "current_dir".to_string(),
            details: e.to_string(),
        })?
        .join(DEFAULT_CONFIG_FILE);

    if current_dir_config.exists() {
        debug!(
            "Found config file in current directory: {}",
            current_dir_config.display()
        );
        return Ok(Some(current_dir_config));
    }

    debug!("No configuration file found, using defaults");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        name: String,
        nested: NestedConfig,
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct NestedConfig {
        value: u32,
    }

    #[test]
    fn test_defaults_when_no_file_or_env() {
        figment::Jail::expect_with(|_jail| {
            let config: TestConfig = load_config().expect("load defaults");
            assert_eq!(config, TestConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                name = "from-file"

                [nested]
                value = 7
                "#,
            )?;

            let config: TestConfig = load_config().expect("load from file");
            assert_eq!(config.name, "from-file");
            assert_eq!(config.nested.value, 7);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", r#"name = "from-file""#)?;
            jail.set_env("PORTAL_NAME", "from-env");
            jail.set_env("PORTAL_NESTED__VALUE", "42");

            let config: TestConfig = load_config().expect("load with env");
            assert_eq!(config.name, "from-env");
            assert_eq!(config.nested.value, 42);
            Ok(())
        });
    }

    #[test]
    fn test_missing_required_file_fails() {
        figment::Jail::expect_with(|_jail| {
            let options = LoadOptions {
                config_path: Some(PathBuf::from("does-not-exist.toml")),
                require_file: true,
                ..Default::default()
            };
            let result = load_config_with_options::<TestConfig>(options);
            assert!(result.is_err());
            Ok(())
        });
    }
}
