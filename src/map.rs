//! Interface to the map view the overlay is registered against
//!
//! The map engine owns its viewport. The overlay only reads it and issues
//! camera retarget commands.

use crate::types::{Coordinate, ViewPoint};
use serde::{Deserialize, Serialize};

/// Map camera state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapCamera {
    /// Coordinate the camera looks at
    pub center: Coordinate,
    /// Eye altitude above the center (meters)
    pub altitude: f64,
    /// Tilt from straight down (degrees)
    pub pitch: f64,
    /// Degrees clockwise from north
    pub heading: f64,
}

/// How a camera change is applied
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraTransition {
    /// Jump without animation
    Immediate,
    /// Animate over the given duration (seconds)
    Animated(f64),
    /// Animate with the map's own default duration
    Default,
}

impl CameraTransition {
    /// Cut for zero durations, animate otherwise
    pub fn with_duration(secs: f64) -> Self {
        if secs <= 0.0 {
            CameraTransition::Immediate
        } else {
            CameraTransition::Animated(secs)
        }
    }
}

/// Zoom limits and interaction flags applied when the overlay takes over a map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub allows_scrolling: bool,
    pub allows_rotating: bool,
    pub allows_tilting: bool,
    pub allows_zooming: bool,
    /// Built-in user dot, compass, logo and attribution
    pub shows_decorations: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            zoom: 18.0,
            min_zoom: 17.0,
            max_zoom: 19.0,
            allows_scrolling: false,
            allows_rotating: true,
            allows_tilting: false,
            allows_zooming: true,
            shows_decorations: false,
        }
    }
}

/// Map view the overlay follows
///
/// Implementations are called from sensor callbacks and the render tick
/// concurrently, so they synchronize internally.
pub trait MapView: Send + Sync {
    fn center_coordinate(&self) -> Coordinate;

    fn camera(&self) -> MapCamera;

    /// Real-world meters covered by one screen point at `latitude`
    fn meters_per_point(&self, latitude: f64) -> f64;

    /// Geographic coordinate to view point (top-left origin)
    fn convert(&self, coordinate: Coordinate) -> ViewPoint;

    fn set_camera(&self, camera: MapCamera, transition: CameraTransition);

    fn apply_settings(&self, settings: &MapSettings);
}
