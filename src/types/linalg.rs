//! Linear algebra aliases for the overlay scene
//!
//! The scene lives in screen points with a bottom-left origin: x to the
//! right, y up, z toward the viewer. glam matrices are column-major and
//! compose right-to-left, so `T * R * S` scales first.

use glam::{Mat4, Vec2, Vec3};

/// Node-to-world transform
pub type Transform = Mat4;
/// Position in overlay scene space (points)
pub type ScenePoint = Vec3;
/// Point in view coordinates (points, top-left origin)
pub type ViewPoint = Vec2;

// ===== Scene axes =====
/// Axis the map tilts about (screen horizontal)
pub const TILT_AXIS: Vec3 = Vec3::X;
/// Axis the landmark spins about
pub const SPIN_AXIS: Vec3 = Vec3::Y;
/// Direction the scene camera looks from (down the z axis)
pub const VIEW_AXIS: Vec3 = Vec3::Z;

/// Size of the overlay view in points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ViewPoint {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}
