//! StoreConfig - explicit configuration threaded into RevisionStore.
//!
//! ```toml
//! key_prefix = "/deploy/my-app"
//! allow_overwrite = false
//! retention = 10
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::PathScheme;

pub const DEFAULT_RETENTION: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Namespace every key lives under. Empty means the store root.
    pub key_prefix: String,

    /// Overwrite an existing artifact instead of failing with `NodeExists`.
    pub allow_overwrite: bool,

    /// Maximum number of non-active revisions kept after a trim.
    pub retention: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            allow_overwrite: false,
            retention: DEFAULT_RETENTION,
        }
    }
}

impl StoreConfig {
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    pub fn with_allow_overwrite(mut self, allow_overwrite: bool) -> Self {
        self.allow_overwrite = allow_overwrite;
        self
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention == 0 {
            return Err(ConfigError::Invalid(
                "retention must be at least 1".to_string(),
            ));
        }
        self.path_scheme()?;
        Ok(())
    }

    pub fn path_scheme(&self) -> Result<PathScheme, ConfigError> {
        PathScheme::new(&self.key_prefix).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}
