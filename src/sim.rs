//! Simulated map view and location service
//!
//! Stand-ins for the platform map engine and sensor service, used by the demo
//! binary and the tests. The map is a top-down Web Mercator view (EPSG:3857)
//! with 512-point tiles; pitch is reported but does not foreshorten.

use crate::map::{CameraTransition, MapCamera, MapSettings, MapView};
use crate::sensors::{AuthorizationStatus, LocationService};
use crate::types::{Coordinate, ViewPoint, ViewportSize};
use glam::Vec2;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

const TILE_SIZE: f64 = 512.0;
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;
/// Vertical field of view used to relate altitude to zoom
const FIELD_OF_VIEW_DEG: f64 = 30.0;
const MAX_MERCATOR_LAT: f64 = 85.05112878;

/// Web Mercator world size in points at `zoom`
fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Web Mercator position in points at `zoom`, origin top-left of the world
fn mercator_points(coordinate: Coordinate, zoom: f64) -> (f64, f64) {
    let lat = coordinate
        .latitude
        .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
        .to_radians();
    let n = world_size(zoom);
    let x = (coordinate.longitude + 180.0) / 360.0 * n;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n;
    (x, y)
}

fn meters_per_point_at(latitude: f64, zoom: f64) -> f64 {
    EARTH_CIRCUMFERENCE_M * latitude.to_radians().cos() / world_size(zoom)
}

struct SimState {
    camera: MapCamera,
    zoom: f64,
    settings: MapSettings,
    retargets: u32,
    last_transition: Option<CameraTransition>,
}

/// In-memory map view
pub struct SimulatedMap {
    viewport: ViewportSize,
    state: Mutex<SimState>,
}

impl SimulatedMap {
    pub fn new(viewport: ViewportSize, center: Coordinate) -> Self {
        let settings = MapSettings::default();
        let zoom = settings.zoom;
        let altitude = altitude_for_zoom(center.latitude, zoom, viewport.height as f64);
        SimulatedMap {
            viewport,
            state: Mutex::new(SimState {
                camera: MapCamera {
                    center,
                    altitude,
                    pitch: 0.0,
                    heading: 0.0,
                },
                zoom,
                settings,
                retargets: 0,
                last_transition: None,
            }),
        }
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn zoom(&self) -> f64 {
        self.with_state(|s| s.zoom)
    }

    /// Number of `set_camera` commands received
    pub fn retarget_count(&self) -> u32 {
        self.with_state(|s| s.retargets)
    }

    pub fn last_transition(&self) -> Option<CameraTransition> {
        self.with_state(|s| s.last_transition)
    }

    pub fn settings(&self) -> MapSettings {
        self.with_state(|s| s.settings.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        // writes are whole-field stores, a poisoned lock is still consistent
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn clamp_zoom(settings: &MapSettings, zoom: f64) -> f64 {
        zoom.clamp(settings.min_zoom, settings.max_zoom)
    }
}

fn altitude_for_zoom(latitude: f64, zoom: f64, view_height: f64) -> f64 {
    let half_fov = (FIELD_OF_VIEW_DEG / 2.0).to_radians();
    meters_per_point_at(latitude, zoom) * (view_height / 2.0) / half_fov.tan()
}

fn zoom_for_altitude(latitude: f64, altitude: f64, view_height: f64) -> f64 {
    let half_fov = (FIELD_OF_VIEW_DEG / 2.0).to_radians();
    let mpp = altitude * half_fov.tan() / (view_height / 2.0);
    (EARTH_CIRCUMFERENCE_M * latitude.to_radians().cos() / (mpp * TILE_SIZE)).log2()
}

impl MapView for SimulatedMap {
    fn center_coordinate(&self) -> Coordinate {
        self.with_state(|s| s.camera.center)
    }

    fn camera(&self) -> MapCamera {
        self.with_state(|s| s.camera)
    }

    fn meters_per_point(&self, latitude: f64) -> f64 {
        let zoom = self.zoom();
        meters_per_point_at(latitude, zoom)
    }

    fn convert(&self, coordinate: Coordinate) -> ViewPoint {
        let (camera, zoom) = self.with_state(|s| (s.camera, s.zoom));
        let (cx, cy) = mercator_points(camera.center, zoom);
        let (px, py) = mercator_points(coordinate, zoom);
        let (dx, dy) = (px - cx, py - cy);

        // the camera heading points up on screen
        let (sin_h, cos_h) = camera.heading.to_radians().sin_cos();
        let x = dx * cos_h + dy * sin_h;
        let y = -dx * sin_h + dy * cos_h;

        self.viewport.center() + Vec2::new(x as f32, y as f32)
    }

    fn set_camera(&self, camera: MapCamera, transition: CameraTransition) {
        let height = self.viewport.height as f64;
        self.with_state(|s| {
            let zoom = zoom_for_altitude(camera.center.latitude, camera.altitude, height);
            let zoom = Self::clamp_zoom(&s.settings, zoom);
            s.zoom = zoom;
            s.camera = MapCamera {
                altitude: altitude_for_zoom(camera.center.latitude, zoom, height),
                ..camera
            };
            s.retargets += 1;
            s.last_transition = Some(transition);
        });
        log::trace!("map camera set {:?} ({:?})", camera, transition);
    }

    fn apply_settings(&self, settings: &MapSettings) {
        let height = self.viewport.height as f64;
        self.with_state(|s| {
            s.settings = settings.clone();
            s.zoom = Self::clamp_zoom(settings, settings.zoom);
            s.camera.altitude = altitude_for_zoom(s.camera.center.latitude, s.zoom, height);
        });
    }
}

/// Location service that records start/stop commands
pub struct SimulatedLocationService {
    authorization: Mutex<AuthorizationStatus>,
    location_updates: AtomicBool,
    heading_updates: AtomicBool,
    authorization_requests: AtomicU32,
}

impl SimulatedLocationService {
    pub fn new(authorization: AuthorizationStatus) -> Self {
        Self {
            authorization: Mutex::new(authorization),
            location_updates: AtomicBool::new(false),
            heading_updates: AtomicBool::new(false),
            authorization_requests: AtomicU32::new(0),
        }
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        if let Ok(mut current) = self.authorization.lock() {
            *current = status;
        }
    }

    pub fn is_updating_location(&self) -> bool {
        self.location_updates.load(Ordering::SeqCst)
    }

    pub fn is_updating_heading(&self) -> bool {
        self.heading_updates.load(Ordering::SeqCst)
    }

    pub fn authorization_requests(&self) -> u32 {
        self.authorization_requests.load(Ordering::SeqCst)
    }
}

impl LocationService for SimulatedLocationService {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.authorization
            .lock()
            .map(|s| *s)
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    fn request_authorization(&self) {
        self.authorization_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn start_location_updates(&self) {
        self.location_updates.store(true, Ordering::SeqCst);
    }

    fn stop_location_updates(&self) {
        self.location_updates.store(false, Ordering::SeqCst);
    }

    fn start_heading_updates(&self) {
        self.heading_updates.store(true, Ordering::SeqCst);
    }

    fn stop_heading_updates(&self) {
        self.heading_updates.store(false, Ordering::SeqCst);
    }
}
