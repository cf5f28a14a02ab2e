use crate::error::OverlayResult;
use crate::map::MapView;
use crate::scene::NodeId;
use crate::session::{OverlaySession, SessionStats};
use crate::types::current_timestamp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub uptime_seconds: u64,
    pub active: bool,
    // Accepted location
    pub located: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub fix_age_secs: f64,
    pub heading_deg: f64,
    // Map camera
    pub map_center_lat: f64,
    pub map_center_lon: f64,
    pub map_altitude_m: f64,
    pub map_pitch_deg: f64,
    // Last rendered frame
    pub player_x: f64,
    pub player_y: f64,
    pub landmark_x: f64,
    pub landmark_y: f64,
    pub landmark_angle_rad: f64,
    pub altitude_points: f64,
    pub landmark_highlighted: bool,
    // Scene lighting and landmark material
    pub ambient_light: [f32; 4],
    pub landmark_color: [f32; 4],
    pub landmark_specular: [f32; 4],
    pub stats: SessionStats,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            ..Self::default()
        }
    }

    /// Snapshot of `session` as of now
    pub fn capture<M: MapView>(session: &OverlaySession<M>, uptime_seconds: u64) -> OverlayResult<Self> {
        let mut status = Self::new();
        status.uptime_seconds = uptime_seconds;
        status.active = session.is_active()?;
        status.stats = session.stats()?;

        if let Some(fix) = session.accepted_location()? {
            status.located = true;
            status.latitude = fix.latitude;
            status.longitude = fix.longitude;
            status.accuracy_m = fix.horizontal_accuracy;
            status.fix_age_secs = status.timestamp - fix.timestamp;
        }
        if let Some(heading) = session.heading()? {
            status.heading_deg = heading.magnetic_heading;
        }

        let camera = session.map().camera();
        status.map_center_lat = camera.center.latitude;
        status.map_center_lon = camera.center.longitude;
        status.map_altitude_m = camera.altitude;
        status.map_pitch_deg = camera.pitch;

        if let Some(frame) = session.last_frame()? {
            status.player_x = frame.player.x as f64;
            status.player_y = frame.player.y as f64;
            status.landmark_x = frame.landmark.x as f64;
            status.landmark_y = frame.landmark.y as f64;
            status.landmark_angle_rad = frame.landmark_angle;
            status.altitude_points = frame.altitude_points;
        }
        session.with_scene(|scene| {
            status.ambient_light = scene.ambient;
            if let Some(landmark) = scene.node(NodeId::Landmark) {
                status.landmark_highlighted = landmark.highlighted;
                status.landmark_color = landmark.diffuse();
                status.landmark_specular = landmark.appearance.specular;
            }
        })?;

        Ok(status)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> OverlayResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
