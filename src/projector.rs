use crate::map::MapView;
use crate::types::{Coordinate, ScenePoint};
use glam::Vec3;

/// Geographic coordinate to overlay scene position
///
/// The map reports view points with a top-left origin while the overlay
/// plane has its origin bottom-left, so y is flipped against the scene
/// height. Results depend on the live viewport and must be recomputed each
/// frame.
#[derive(Clone, Copy, Debug)]
pub struct GeoOverlayProjector {
    scene_height: f32,
}

impl GeoOverlayProjector {
    pub fn new(scene_height: f32) -> Self {
        Self { scene_height }
    }

    pub fn project(&self, map: &dyn MapView, coordinate: Coordinate) -> ScenePoint {
        let p = map.convert(coordinate);
        Vec3::new(p.x, self.scene_height - p.y, 0.0)
    }
}
