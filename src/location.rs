use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::position::Position;

/// One reported device location sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationFix {
    pub position: Position,
    /// Estimated horizontal accuracy in meters. Informational only.
    pub accuracy: Option<f64>,
    /// Device heading in degrees, when the device can tell.
    pub heading: Option<f64>,
    /// Ground speed in m/s.
    pub speed: Option<f64>,
    pub satellites: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position::new(latitude, longitude),
            accuracy: None,
            heading: None,
            speed: None,
            satellites: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("timed out waiting for a position")]
    Timeout,

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Preferences passed to the provider when subscribing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WatchOptions {
    /// Prefer precise fixes over fast ones.
    pub high_accuracy: bool,
    /// Oldest cached fix the provider may deliver. Zero means always fresh.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Identifies one live subscription of a [`LocationSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

pub type FixCallback = Box<dyn FnMut(LocationFix) + Send>;
pub type ErrorCallback = Box<dyn FnMut(LocationError) + Send>;

/// A subscription-style location provider.
///
/// Callbacks may be invoked from any thread, one at a time, in the order the
/// provider produced them.
pub trait LocationSource: Send {
    fn start(
        &mut self,
        options: &WatchOptions,
        on_fix: FixCallback,
        on_error: ErrorCallback,
    ) -> Result<SubscriptionHandle, LocationError>;

    fn cancel(&mut self, handle: SubscriptionHandle);
}
