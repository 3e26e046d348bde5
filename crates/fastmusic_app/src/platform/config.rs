//! `fastmusic.ron` loading and CLI overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fastmusic_core::AudioQuality;
use fastmusic_engine::{BackendSettings, EngineConfig};
use fm_logging::fm_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LogDestination;
use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "fastmusic.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub output_dir: PathBuf,
    pub quality: AudioQuality,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_payload_bytes: u64,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        Self {
            backend_url: backend.base_url,
            output_dir: PathBuf::from("./downloads"),
            quality: AudioQuality::default(),
            connect_timeout_secs: backend.connect_timeout.as_secs(),
            request_timeout_secs: backend.request_timeout.as_secs(),
            max_payload_bytes: backend.max_bytes,
            log_destination: LogDestination::Terminal,
            log_file: PathBuf::from("./fastmusic.log"),
        }
    }
}

impl AppConfig {
    /// Reads `explicit`, or `./fastmusic.ron` when none is given.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config = Self::parse(&text).map_err(|message| ConfigError::Parse {
            path: path.clone(),
            message,
        })?;
        fm_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|err| err.to_string())
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(url) = &cli.backend {
            self.backend_url = url.clone();
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(quality) = cli.quality {
            self.quality = quality;
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            backend: BackendSettings {
                base_url: self.backend_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                max_bytes: self.max_payload_bytes,
            },
            output_dir: self.output_dir.clone(),
        }
    }
}
