use crate::error::{OverlayError, OverlayResult};
use crate::map::MapSettings;
use crate::types::Coordinate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Debounce thresholds for incoming location fixes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Fixes less accurate than this (meters) are ignored while the accepted fix is fresh
    pub max_accuracy_m: f64,
    /// How long an accepted fix stays fresh (seconds)
    pub accuracy_grace_secs: f64,
    /// Minimum time between accepted fixes (seconds)
    pub min_interval_secs: f64,
    /// Minimum displacement between accepted fixes (meters)
    pub min_distance_m: f64,
    /// Gap after which the map camera cuts instead of panning (seconds)
    pub hard_cut_gap_secs: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            max_accuracy_m: 65.0,
            accuracy_grace_secs: 10.0,
            min_interval_secs: 5.0,
            min_distance_m: 18.0,
            hard_cut_gap_secs: 60.0,
        }
    }
}

/// Per-frame scene constants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConstants {
    pub player_scale: f32,
    /// Point light offset from the player marker (points)
    pub light_offset: [f32; 3],
    pub near_plane: f64,
    /// Added to the camera altitude to get the far plane (points)
    pub far_plane_padding: f64,
    /// Landmark spin (radians per second)
    pub spin_rate: f64,
    /// Synthetic duration of the frame before the first tick (seconds)
    pub first_frame_secs: f64,
    /// How long a tapped landmark stays highlighted (seconds)
    pub highlight_secs: f64,
    /// Edge length of the landmark box (points)
    pub landmark_size: f32,
    pub landmark_chamfer: f32,
    pub player_hit_radius: f32,
}

impl Default for SceneConstants {
    fn default() -> Self {
        Self {
            player_scale: 4.0,
            light_offset: [0.0, 30.0, 20.0],
            near_plane: 1.0,
            far_plane_padding: 100.0,
            spin_rate: std::f64::consts::PI,
            first_frame_secs: 1.0 / 60.0,
            highlight_secs: 0.2,
            landmark_size: 20.0,
            landmark_chamfer: 2.0,
            player_hit_radius: 12.0,
        }
    }
}

/// How the map camera is retargeted onto accepted locations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetSettings {
    pub pitch_deg: f64,
    /// Pan duration for non-urgent retargets (seconds)
    pub pan_secs: f64,
}

impl Default for RetargetSettings {
    fn default() -> Self {
        Self {
            pitch_deg: 45.0,
            pan_secs: 0.5,
        }
    }
}

/// Top-level overlay configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub gate: GateThresholds,
    pub scene: SceneConstants,
    pub retarget: RetargetSettings,
    pub map: MapSettings,
    /// Fixed anchor of the landmark node
    pub landmark: Coordinate,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            gate: GateThresholds::default(),
            scene: SceneConstants::default(),
            retarget: RetargetSettings::default(),
            map: MapSettings::default(),
            landmark: Coordinate::new(47.363688, 8.513255),
        }
    }
}

impl OverlayConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> OverlayResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: OverlayConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OverlayResult<()> {
        let gate = &self.gate;
        let non_negative = [
            ("max_accuracy_m", gate.max_accuracy_m),
            ("accuracy_grace_secs", gate.accuracy_grace_secs),
            ("min_interval_secs", gate.min_interval_secs),
            ("min_distance_m", gate.min_distance_m),
            ("hard_cut_gap_secs", gate.hard_cut_gap_secs),
            ("highlight_secs", self.scene.highlight_secs),
            ("pan_secs", self.retarget.pan_secs),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(OverlayError::Config(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if self.scene.near_plane <= 0.0 {
            return Err(OverlayError::Config("near_plane must be positive".to_string()));
        }
        if self.scene.first_frame_secs <= 0.0 {
            return Err(OverlayError::Config("first_frame_secs must be positive".to_string()));
        }

        let map = &self.map;
        if map.min_zoom > map.max_zoom {
            return Err(OverlayError::Config(format!(
                "min_zoom {} exceeds max_zoom {}",
                map.min_zoom, map.max_zoom
            )));
        }
        if map.zoom < map.min_zoom || map.zoom > map.max_zoom {
            return Err(OverlayError::Config(format!(
                "zoom {} outside [{}, {}]",
                map.zoom, map.min_zoom, map.max_zoom
            )));
        }

        if self.landmark.latitude.abs() > 90.0 || self.landmark.longitude.abs() > 180.0 {
            return Err(OverlayError::Config(format!(
                "landmark coordinate out of range: {:?}",
                self.landmark
            )));
        }

        Ok(())
    }
}
