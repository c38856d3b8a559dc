use thiserror::Error;

use crate::config::ConfigError;
use crate::location::LocationError;
use crate::waypoint::WaypointError;

#[derive(Error, Debug)]
pub enum GuideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Waypoint error: {0}")]
    Waypoint(#[from] WaypointError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GuideError>;
