//! Layered configuration loading: embedded defaults, optional user TOML,
//! environment variable overrides.

use super::EngineConfig;
use crate::domain::error::{Error, Result};
use config::{Config as ConfigBuilder, Environment, FileFormat};
use std::path::Path;
use validator::Validate;

/// Embedded default configuration. The single source of truth for default
/// values; works from any working directory because it is compiled into
/// the binary.
const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

/// Returns the embedded default config TOML, for tests that verify parsing
/// of the shipped defaults.
pub fn get_default_config_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

/// Loads [`EngineConfig`] from embedded defaults, an optional user file,
/// and environment variables, in that precedence order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Construct a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Load embedded defaults only, with no user file or environment
    /// layer. Used by tests to verify the shipped defaults parse and
    /// validate on their own.
    pub async fn load_embedded_defaults_only(&self) -> Result<EngineConfig> {
        let built = ConfigBuilder::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG_TOML, FileFormat::Toml))
            .build()
            .map_err(|e| Error::config(format!("failed to build configuration: {e}")))?;

        deserialize_and_validate(built)
    }

    /// Load configuration from embedded defaults, the XDG user config file
    /// if present, and environment variables (highest priority).
    ///
    /// Environment variables use the `CODE_SEARCH` prefix with `__` as the
    /// nesting separator, e.g. `CODE_SEARCH__EMBEDDING__PROVIDER=fastembed`.
    /// `VECTOR_DB_PATH` is read separately by the path registry, not here.
    pub async fn load(&self) -> Result<EngineConfig> {
        let mut builder = ConfigBuilder::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG_TOML, FileFormat::Toml));

        if let Some(dir) = dirs::config_dir() {
            let user_config_path = dir.join("code-search-engine").join("config.toml");
            if user_config_path.exists() {
                builder = builder.add_source(config::File::from(user_config_path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CODE_SEARCH")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build configuration: {e}")))?;

        deserialize_and_validate(built)
    }

    /// Load configuration from embedded defaults, an explicit TOML file,
    /// and environment variables (highest priority).
    pub async fn load_with_file(&self, path: &Path) -> Result<EngineConfig> {
        let builder = ConfigBuilder::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG_TOML, FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .add_source(
                Environment::with_prefix("CODE_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            );

        let built = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build configuration: {e}")))?;

        deserialize_and_validate(built)
    }
}

fn deserialize_and_validate(built: config::Config) -> Result<EngineConfig> {
    let config: EngineConfig = built
        .try_deserialize()
        .map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))?;

    config
        .validate()
        .map_err(|e| Error::config(format!("configuration validation failed: {e}")))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedded_defaults_parse_and_validate() {
        let config = ConfigLoader::new().load_embedded_defaults_only().await.unwrap();
        assert_eq!(config.chunking.chunk_size, 2500);
        assert_eq!(config.indexing.batch_size, 100);
        assert_eq!(config.indexing.max_chunks, 450_000);
        assert_eq!(config.search.rrf_k, 60.0);
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn environment_overrides_take_precedence() {
        std::env::set_var("CODE_SEARCH__INDEXING__BATCH_SIZE", "25");
        let config = ConfigLoader::new().load().await.unwrap();
        std::env::remove_var("CODE_SEARCH__INDEXING__BATCH_SIZE");
        assert_eq!(config.indexing.batch_size, 25);
    }
}
