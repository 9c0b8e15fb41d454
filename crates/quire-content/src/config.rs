//! Site configuration loading.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Site-wide configuration handed to every template.
///
/// The schema is open: whatever keys the YAML document holds are passed
/// through as-is. Missing keys are simply absent inside templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SiteConfig(Mapping);

impl SiteConfig {
    /// Load the configuration document at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let config = Self::parse(&source).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        tracing::debug!("Loaded {} config keys from {}", config.0.len(), path.display());

        Ok(config)
    }

    /// Parse a configuration document from a string.
    fn parse(source: &str) -> Result<Self, String> {
        let value: Value = serde_yaml::from_str(source).map_err(|e| e.to_string())?;

        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(mapping) => Ok(Self(mapping)),
            _ => Err("top level of the configuration must be a mapping".to_string()),
        }
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The underlying mapping.
    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }
}

/// Errors that can occur when loading the site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}
