//! Per-frame synchronization of the overlay scene with the map camera
//!
//! Each tick re-projects the anchored nodes through the live map viewport,
//! counter-rotates them against the map pitch, and rebuilds an orthographic
//! scene camera whose distance matches the map altitude in points. One
//! overlay point therefore stays one map point at any zoom level.

use crate::config::SceneConstants;
use crate::map::MapView;
use crate::projector::GeoOverlayProjector;
use crate::scene::{MaterialState, NodeAnchor, NodeId, OverlayScene, SceneCamera};
use crate::types::{Coordinate, ScenePoint, Transform, ViewportSize, SPIN_AXIS, TILT_AXIS, VIEW_AXIS};
use glam::{Mat4, Vec3};

/// Elapsed render time since the first tick
///
/// The first tick is backdated by one frame so its delta is non-zero.
#[derive(Clone, Copy, Debug)]
pub struct RenderClock {
    start: Option<f64>,
    first_frame_secs: f64,
}

impl RenderClock {
    pub fn new(first_frame_secs: f64) -> Self {
        Self {
            start: None,
            first_frame_secs,
        }
    }

    pub fn elapsed(&mut self, time: f64) -> f64 {
        let start = *self.start.get_or_insert(time - self.first_frame_secs);
        time - start
    }

    pub fn start(&self) -> Option<f64> {
        self.start
    }

    pub fn reset(&mut self) {
        self.start = None;
    }
}

/// Geographic state a tick needs, copied out of the session under its lock
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInputs {
    pub accepted: Coordinate,
    pub center: Coordinate,
    pub heading: f64,
}

/// What a tick computed, for logging and inspection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub dt: f64,
    pub pitch_rad: f32,
    pub heading: f64,
    pub player: ScenePoint,
    pub landmark: ScenePoint,
    pub landmark_angle: f64,
    pub meters_per_point: f64,
    pub altitude_points: f64,
}

pub fn pitch_radians(pitch_deg: f64) -> f32 {
    pitch_deg.to_radians() as f32
}

/// Spin angle after `dt` seconds; not wrapped
pub fn landmark_rotation_angle(dt: f64, spin_rate: f64) -> f64 {
    dt * spin_rate
}

/// Uniform scale, then tilt against the map pitch, then move to `p`
pub fn player_transform(p: ScenePoint, pitch_rad: f32, scale: f32) -> Transform {
    Mat4::from_translation(Vec3::new(p.x, p.y, 0.0))
        * Mat4::from_axis_angle(TILT_AXIS, -pitch_rad)
        * Mat4::from_scale(Vec3::splat(scale))
}

/// Spin about the vertical axis, then tilt with the map pitch, then move to `o`
pub fn landmark_transform(o: ScenePoint, pitch_rad: f32, angle: f64) -> Transform {
    Mat4::from_translation(Vec3::new(o.x, o.y, 0.0))
        * Mat4::from_axis_angle(TILT_AXIS, pitch_rad)
        * Mat4::from_axis_angle(SPIN_AXIS, angle as f32)
}

pub fn light_position(player: ScenePoint, offset: [f32; 3]) -> Vec3 {
    Vec3::new(player.x + offset[0], player.y + offset[1], offset[2])
}

pub fn altitude_in_points(altitude_m: f64, meters_per_point: f64) -> f64 {
    altitude_m / meters_per_point
}

/// Orthographic camera spanning the viewport, placed at the map altitude
pub fn orthographic_camera(
    altitude_points: f64,
    viewport: ViewportSize,
    near: f64,
    far_padding: f64,
) -> SceneCamera {
    let far = altitude_points + far_padding;
    SceneCamera {
        position: VIEW_AXIS * altitude_points as f32,
        projection: Mat4::orthographic_rh_gl(
            0.0,
            viewport.width,
            0.0,
            viewport.height,
            near as f32,
            far as f32,
        ),
        near,
        far,
    }
}

pub struct CameraSynchronizer {
    constants: SceneConstants,
    projector: GeoOverlayProjector,
    clock: RenderClock,
}

impl CameraSynchronizer {
    pub fn new(constants: SceneConstants, viewport: ViewportSize) -> Self {
        let clock = RenderClock::new(constants.first_frame_secs);
        Self {
            constants,
            projector: GeoOverlayProjector::new(viewport.height),
            clock,
        }
    }

    pub fn clock(&self) -> &RenderClock {
        &self.clock
    }

    pub fn reset(&mut self) {
        self.clock.reset();
    }

    /// Run one render tick
    ///
    /// Without geographic state the tick is skipped and the scene keeps the
    /// previous frame's transforms.
    pub fn tick(
        &mut self,
        map: &dyn MapView,
        scene: &mut OverlayScene,
        inputs: Option<FrameInputs>,
        time: f64,
    ) -> Option<FrameReport> {
        let inputs = inputs?;
        let c = &self.constants;

        let dt = self.clock.elapsed(time);
        let map_camera = map.camera();
        let pitch_rad = pitch_radians(map_camera.pitch);

        let player = self.projector.project(map, inputs.accepted);
        if let Some(node) = scene.node_mut(NodeId::Player) {
            node.transform = player_transform(player, pitch_rad, c.player_scale);
            node.visible = true;
        }

        let landmark_angle = landmark_rotation_angle(dt, c.spin_rate);
        let mut landmark = Vec3::ZERO;
        if let Some(node) = scene.node_mut(NodeId::Landmark) {
            let anchor = match node.anchor {
                NodeAnchor::Fixed(coordinate) => coordinate,
                NodeAnchor::FollowsAcceptedLocation => inputs.accepted,
            };
            landmark = self.projector.project(map, anchor);
            node.transform = landmark_transform(landmark, pitch_rad, landmark_angle);
            node.material = if node.highlighted {
                MaterialState::Highlighted
            } else {
                MaterialState::Normal
            };
            node.visible = true;
        }

        scene.light.position = light_position(player, c.light_offset);

        let meters_per_point = map.meters_per_point(inputs.center.latitude);
        let altitude_points = altitude_in_points(map_camera.altitude, meters_per_point);
        scene.camera = orthographic_camera(
            altitude_points,
            scene.viewport(),
            c.near_plane,
            c.far_plane_padding,
        );

        Some(FrameReport {
            dt,
            pitch_rad,
            heading: inputs.heading,
            player,
            landmark,
            landmark_angle,
            meters_per_point,
            altitude_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::map::{CameraTransition, MapCamera};
    use crate::sim::SimulatedMap;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const VIEWPORT: ViewportSize = ViewportSize {
        width: 400.0,
        height: 800.0,
    };

    fn zurich() -> Coordinate {
        Coordinate::new(47.3637, 8.5133)
    }

    fn inputs() -> FrameInputs {
        FrameInputs {
            accepted: zurich(),
            center: zurich(),
            heading: 0.0,
        }
    }

    fn setup() -> (SimulatedMap, OverlayScene, CameraSynchronizer) {
        let config = OverlayConfig::default();
        let map = SimulatedMap::new(VIEWPORT, zurich());
        let camera = MapCamera {
            pitch: 45.0,
            ..map.camera()
        };
        map.set_camera(camera, CameraTransition::Immediate);
        (
            map,
            OverlayScene::new(VIEWPORT, &config),
            CameraSynchronizer::new(config.scene, VIEWPORT),
        )
    }

    #[test]
    fn test_first_tick_is_one_frame() {
        let mut clock = RenderClock::new(1.0 / 60.0);
        assert_relative_eq!(clock.elapsed(100.0), 1.0 / 60.0, epsilon = 1e-9);
        assert_relative_eq!(clock.elapsed(101.0), 1.0 + 1.0 / 60.0, epsilon = 1e-9);
        assert_relative_eq!(clock.start().unwrap(), 100.0 - 1.0 / 60.0);
    }

    #[test]
    fn test_rotation_angle_is_linear_and_unwrapped() {
        for dt in [0.0, 0.25, 1.0, 2.0, 3.7, 100.0] {
            assert_eq!(landmark_rotation_angle(dt, PI), PI * dt);
        }
        assert!(landmark_rotation_angle(3.0, PI) > 2.0 * PI);
    }

    #[test]
    fn test_player_scales_uniformly_before_tilt() {
        let p = Vec3::new(120.0, 300.0, 0.0);
        let pitch = 45f32.to_radians();
        let m = player_transform(p, pitch, 4.0);

        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        assert!(scale.abs_diff_eq(Vec3::splat(4.0), 1e-4));
        assert!(translation.abs_diff_eq(p, 1e-4));

        let expected = glam::Mat3::from_rotation_x(-pitch);
        assert!(glam::Mat3::from_quat(rotation).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_landmark_composes_spin_then_tilt() {
        let o = Vec3::new(50.0, 60.0, 0.0);
        let pitch = 0.5f32;
        let angle = 1.2f64;
        let m = landmark_transform(o, pitch, angle);

        // a point on the spin axis is unaffected by the spin
        let up = m.transform_point3(Vec3::Y);
        let tilt_only = Mat4::from_translation(o) * Mat4::from_rotation_x(pitch);
        assert!(up.abs_diff_eq(tilt_only.transform_point3(Vec3::Y), 1e-5));

        let x = m.transform_point3(Vec3::X);
        let expected = Mat4::from_translation(o)
            * Mat4::from_rotation_x(pitch)
            * Mat4::from_rotation_y(angle as f32);
        assert!(x.abs_diff_eq(expected.transform_point3(Vec3::X), 1e-5));
    }

    #[test]
    fn test_light_follows_player() {
        let light = light_position(Vec3::new(10.0, 20.0, 0.0), [0.0, 30.0, 20.0]);
        assert_eq!(light, Vec3::new(10.0, 50.0, 20.0));
    }

    #[test]
    fn test_doubling_altitude_doubles_points() {
        let mpp = 0.37;
        let a = altitude_in_points(400.0, mpp);
        let b = altitude_in_points(800.0, mpp);
        assert_relative_eq!(b, 2.0 * a, epsilon = 1e-12);

        let camera = orthographic_camera(b, VIEWPORT, 1.0, 100.0);
        assert_eq!(camera.far, b + 100.0);
        assert_eq!(camera.near, 1.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, b as f32));
    }

    #[test]
    fn test_orthographic_bounds_cover_viewport() {
        let camera = orthographic_camera(500.0, VIEWPORT, 1.0, 100.0);
        let expected = Mat4::orthographic_rh_gl(0.0, 400.0, 0.0, 800.0, 1.0, 600.0);
        assert!(camera.projection.abs_diff_eq(expected, 1e-6));

        // viewport corners map to clip-space corners
        let top_right = camera.projection.project_point3(Vec3::new(400.0, 800.0, -10.0));
        assert!((top_right.x - 1.0).abs() < 1e-5);
        assert!((top_right.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tick_without_inputs_is_noop() {
        let (map, mut scene, mut sync) = setup();

        assert!(sync.tick(&map, &mut scene, None, 10.0).is_none());
        assert!(sync.clock().start().is_none());
        assert!(scene.nodes().iter().all(|n| !n.visible));
        assert_eq!(scene.camera, SceneCamera::default());
    }

    #[test]
    fn test_tick_places_nodes_and_camera() {
        let (map, mut scene, mut sync) = setup();

        let report = sync.tick(&map, &mut scene, Some(inputs()), 10.0).unwrap();

        // the accepted location is the map center
        assert!((report.player.x - 200.0).abs() < 1e-3);
        assert!((report.player.y - 400.0).abs() < 1e-3);
        assert_relative_eq!(report.pitch_rad, 45f32.to_radians(), epsilon = 1e-6);
        assert_relative_eq!(report.dt, 1.0 / 60.0, epsilon = 1e-9);

        let player = scene.node(NodeId::Player).unwrap();
        assert!(player.visible);
        assert!(player.position().abs_diff_eq(report.player, 1e-3));

        let expected_points = map.camera().altitude / map.meters_per_point(zurich().latitude);
        assert_relative_eq!(report.altitude_points, expected_points, epsilon = 1e-9);
        assert_eq!(scene.camera.far, report.altitude_points + 100.0);
        assert_eq!(
            scene.light.position,
            Vec3::new(report.player.x, report.player.y + 30.0, 20.0)
        );
    }

    #[test]
    fn test_tick_applies_highlight_material() {
        let (map, mut scene, mut sync) = setup();
        scene.node_mut(NodeId::Landmark).unwrap().highlighted = true;

        sync.tick(&map, &mut scene, Some(inputs()), 1.0);
        assert_eq!(
            scene.node(NodeId::Landmark).unwrap().material,
            MaterialState::Highlighted
        );

        scene.node_mut(NodeId::Landmark).unwrap().highlighted = false;
        sync.tick(&map, &mut scene, Some(inputs()), 1.1);
        assert_eq!(
            scene.node(NodeId::Landmark).unwrap().material,
            MaterialState::Normal
        );
    }

    #[test]
    fn test_landmark_spins_with_elapsed_time() {
        let (map, mut scene, mut sync) = setup();

        sync.tick(&map, &mut scene, Some(inputs()), 5.0);
        let report = sync.tick(&map, &mut scene, Some(inputs()), 6.0).unwrap();

        let dt = 1.0 + 1.0 / 60.0;
        assert_relative_eq!(report.dt, dt, epsilon = 1e-9);
        assert_relative_eq!(report.landmark_angle, PI * dt, epsilon = 1e-9);
    }
}
