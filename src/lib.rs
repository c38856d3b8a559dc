pub mod compass;
pub mod config;
pub mod error;
pub mod gps_tracker;
pub mod instruction;
pub mod location;
pub mod locator;
pub mod navigator;
pub mod nmea_source;
pub mod position;
pub mod session;
pub mod waypoint;

// Re-export commonly used types
pub use config::GuideConfig;
pub use error::{GuideError, Result};
pub use location::{LocationError, LocationFix, LocationSource, WatchOptions};
pub use navigator::{NavigationPhase, NavigationState, Navigator};
pub use nmea_source::NmeaLocationSource;
pub use position::Position;
pub use session::NavigationSession;
pub use waypoint::Waypoint;

#[cfg(test)]
pub(crate) mod mocks;
