use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::location::WatchOptions;

// ** NAVIGATION CONFIGURATION ** //

/// Proximity radius at which a waypoint counts as reached (meters).
pub const ARRIVAL_THRESHOLD_M: f64 = 15.0;
pub const INITIAL_INSTRUCTION: &str = "Initializing navigation...";
pub const EMPTY_PATH_INSTRUCTION: &str = "No path nodes available";

// ** GPS CONFIGURATION ** //

pub const DEFAULT_GPS_DEVICE: &str = "/dev/serial0";
/// Rough user-equivalent range error used to turn HDOP into meters.
pub const ASSUMED_UERE_M: f64 = 5.0;
/// Fixes worse than this are dropped when high accuracy is requested.
pub const MAX_HIGH_ACCURACY_HDOP: f64 = 5.0;

// ** RUNTIME CONFIGURATION ** //

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level runtime configuration, read from TOML.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GuideConfig {
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LocationConfig {
    /// Serial device or recorded NMEA log (default: /dev/serial0)
    #[serde(default = "default_device")]
    pub device: PathBuf,

    /// Drop low-quality fixes (default: true)
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,

    /// Oldest cached fix a source may hand out, in milliseconds (default: 0)
    #[serde(default)]
    pub maximum_age_ms: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NavigationConfig {
    /// Forget the last known heading when navigation is disabled (default: false)
    #[serde(default)]
    pub reset_heading_on_disable: bool,
}

fn default_device() -> PathBuf {
    PathBuf::from(DEFAULT_GPS_DEVICE)
}

fn default_high_accuracy() -> bool {
    true
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            high_accuracy: default_high_accuracy(),
            maximum_age_ms: 0,
        }
    }
}

impl LocationConfig {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.high_accuracy,
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}

impl GuideConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}
