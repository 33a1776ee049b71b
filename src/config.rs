use crate::clock::Locale;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Locale for the date and time readout.
    pub locale: Locale,
    /// Start with the key click enabled.
    pub audio: bool,
    /// Show the date and time readout.
    pub clock: bool,
    /// Local time offset from UTC.
    pub utc_offset_minutes: i32,
    /// Two `ac` presses closer than this toggle the key click.
    pub double_press_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            locale: Locale::default(),
            audio: false,
            clock: false,
            utc_offset_minutes: 0,
            double_press_ms: 400,
        }
    }
}

impl Config {
    /// Reads `path`, or the per-user config file when it exists.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        Self::load_or_fallback(path, Self::default_path())
    }

    fn load_or_fallback(
        path: Option<&Path>,
        fallback: Option<PathBuf>,
    ) -> Result<Config, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match fallback {
                Some(path) if path.is_file() => path,
                Some(path) => {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    return Ok(Config::default());
                }
                None => {
                    tracing::warn!("no config directory, using defaults");
                    return Ok(Config::default());
                }
            },
        };
        tracing::debug!(path = %path.display(), "loading config");
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deskcalc").join("config.toml"))
    }

    pub fn double_press_window(&self) -> Duration {
        Duration::from_millis(self.double_press_ms)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
