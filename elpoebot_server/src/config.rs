// Server configuration.
//
// Loaded from an optional JSON file (`elpoebot serve --config FILE`); every
// field has a default, so a partial file only overrides what it names.
// Command-line flags override the file. The generator's own bounds live in
// the nested `generator` object and are validated on load.
//
//   {
//     "port": 3000,
//     "data_dir": "./data",
//     "publish_interval_secs": 60,
//     "seed": 42,
//     "generator": { "free_lines": { "min": 4, "max": 6 } }
//   }

use std::path::{Path, PathBuf};
use std::time::Duration;

use elpoebot_core::{ConfigError, GeneratorConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed server config: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Generator(#[from] ConfigError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Listen port; 0 lets the OS pick one.
    pub port: u16,
    /// Directory holding `corpus.txt` and `book.json`.
    pub data_dir: PathBuf,
    /// Seconds between scheduled poems; 0 disables the scheduler.
    pub publish_interval_secs: u64,
    /// Fixed RNG seed; `None` seeds from the clock.
    pub seed: Option<u64>,
    pub generator: GeneratorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            data_dir: PathBuf::from("."),
            publish_interval_secs: 60,
            seed: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_json(json: &str) -> Result<Self, ServerConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.generator.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ServerConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ServerConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Scheduler period, or `None` when scheduled publishing is off.
    pub fn publish_interval(&self) -> Option<Duration> {
        (self.publish_interval_secs > 0).then(|| Duration::from_secs(self.publish_interval_secs))
    }
}
