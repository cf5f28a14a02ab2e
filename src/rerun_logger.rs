use crate::camera_sync::FrameReport;
use crate::location_gate::GateDecision;
use crate::types::{HeadingFix, LocationFix};
use anyhow::Result;
use rerun::{archetypes::Scalar, RecordingStreamBuilder};

/// Rerun recording of overlay state for offline inspection
/// Uses the Rerun v0.15 archetype API
pub struct RerunLogger {
    rec: rerun::RecordingStream,
}

impl RerunLogger {
    /// Initialize Rerun recording to file
    /// Takes output path (e.g., "overlay_sessions/rerun_20251122_120000.rrd")
    pub fn new(output_path: &str) -> Result<Self> {
        let rec = RecordingStreamBuilder::new("geo_overlay")
            .save(output_path)
            .map_err(|e| anyhow::anyhow!("Failed to create Rerun recording: {}", e))?;

        log::info!("rerun recording initialized to {}", output_path);

        Ok(RerunLogger { rec })
    }

    /// Set the current time for all subsequent logs
    pub fn set_time(&self, elapsed_secs: f64) {
        self.rec.set_time_seconds("render_time", elapsed_secs);
    }

    pub fn log_scalar(&self, path: &str, value: f64) {
        let _ = self.rec.log(path, &Scalar::new(value));
    }

    /// Incoming fix and the gate's verdict on it
    pub fn log_fix(&self, fix: &LocationFix, decision: GateDecision) {
        self.log_scalar("location/raw/latitude", fix.latitude);
        self.log_scalar("location/raw/longitude", fix.longitude);
        self.log_scalar("location/raw/accuracy", fix.horizontal_accuracy);
        self.log_scalar("location/gate/accepted", if decision.accept { 1.0 } else { 0.0 });
        if decision.accept {
            self.log_scalar("location/gate/immediate", if decision.immediate { 1.0 } else { 0.0 });
        }
    }

    pub fn log_heading(&self, heading: HeadingFix) {
        self.log_scalar("heading/magnetic", heading.magnetic_heading);
    }

    /// Node placement and camera distance from one render tick
    pub fn log_frame(&self, frame: &FrameReport) {
        self.log_scalar("scene/player/x", frame.player.x as f64);
        self.log_scalar("scene/player/y", frame.player.y as f64);
        self.log_scalar("scene/landmark/x", frame.landmark.x as f64);
        self.log_scalar("scene/landmark/y", frame.landmark.y as f64);
        self.log_scalar("scene/landmark/angle", frame.landmark_angle);
        self.log_scalar("scene/camera/altitude_points", frame.altitude_points);
        self.log_scalar("scene/camera/meters_per_point", frame.meters_per_point);
        self.log_scalar("scene/pitch", frame.pitch_rad as f64);
    }

    pub fn log_tap(&self, landmark_hit: bool) {
        self.log_scalar("interaction/landmark_tap", if landmark_hit { 1.0 } else { 0.0 });
    }
}
