//! Configuration manager for userbase.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::{DEFAULT_PORT, DEFAULT_SERVICE_NAME};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_HOST: &str = "127.0.0.1";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Failure reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot open `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse `{path}`: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Name the store is published under.
    pub name: String,
    /// Host the service listens on and advertises.
    pub host: String,
    /// Service port, `0` lets the system pick one.
    pub port: u16,
    /// Wrap the store with timing instrumentation.
    pub debug: bool,
    /// Related to the name directory.
    pub directory: Directory,
    /// Related to logs, metrics and traces.
    pub telemetry: Telemetry,
    #[serde(skip_deserializing)]
    pub(crate) version: String,
    #[serde(skip)]
    pub(crate) path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_owned(),
            host: DEFAULT_HOST.to_owned(),
            port: 0,
            debug: false,
            directory: Directory::default(),
            telemetry: Telemetry::default(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
        }
    }
}

/// Directory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directory {
    /// Port of the directory on `host`.
    pub port: u16,
    /// Host the directory inside this process.
    pub embedded: bool,
}

impl Default for Directory {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            embedded: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Telemetry configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    pub log_format: LogFormat,
    /// Expose Prometheus metrics on `/metrics`.
    pub metrics: bool,
    /// Export traces over OTLP (endpoint taken from `OTEL_EXPORTER_OTLP_ENDPOINT`).
    pub otlp: bool,
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Self, ConfigError> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let file = File::open(&file_path).map_err(|source| ConfigError::Io {
            path: file_path.clone(),
            source,
        })?;
        let mut config: Configuration =
            serde_yaml::from_reader(file).map_err(|source| ConfigError::Yaml {
                path: file_path.clone(),
                source,
            })?;

        // set app version.
        config.version = VERSION.to_owned();
        config.path = file_path;

        Ok(config)
    }
}
