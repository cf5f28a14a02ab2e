pub mod linalg;

pub use linalg::*;

use geo::Point;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// WGS84 coordinate in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// geo uses (x, y) = (lon, lat)
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Location reading from the platform location service
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty (meters)
    pub horizontal_accuracy: f64,
    /// Seconds since UNIX epoch
    pub timestamp: f64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy: f64, timestamp: f64) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy,
            timestamp,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Compass reading, degrees clockwise from magnetic north
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadingFix {
    pub magnetic_heading: f64,
}

impl HeadingFix {
    pub fn new(magnetic_heading: f64) -> Self {
        Self { magnetic_heading }
    }
}

/// Wall-clock time in seconds since UNIX epoch
pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
