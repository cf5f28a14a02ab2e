//! Geo-anchored 3D overlay on top of a live map view
//!
//! A player model follows the filtered device location and a spinning
//! landmark sits at a fixed coordinate. Both are re-projected through the
//! map every render tick so they stay glued to the map while it pans,
//! rotates and zooms.

pub mod camera_sync;
pub mod config;
pub mod error;
pub mod heading;
pub mod live_status;
pub mod location_gate;
pub mod map;
pub mod projector;
pub mod rerun_logger;
pub mod scene;
pub mod sensors;
pub mod session;
pub mod sim;
pub mod tap;
pub mod types;

pub use camera_sync::{CameraSynchronizer, FrameInputs, FrameReport};
pub use config::OverlayConfig;
pub use error::{OverlayError, OverlayResult};
pub use location_gate::{GateDecision, LocationGate};
pub use map::{CameraTransition, MapCamera, MapView};
pub use projector::GeoOverlayProjector;
pub use scene::{HitTest, NodeId, OverlayScene};
pub use sensors::{AuthorizationStatus, LocationService, SensorEvent};
pub use session::{OverlaySession, SessionStats};
pub use types::{Coordinate, HeadingFix, LocationFix, ViewportSize};
