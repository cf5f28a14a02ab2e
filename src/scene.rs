//! Overlay scene: typed nodes, camera and lights
//!
//! Nodes carry their geographic anchor and interaction state directly, and
//! are looked up by `NodeId` rather than by attaching values to generic
//! renderer nodes.

use crate::config::OverlayConfig;
use crate::types::{Coordinate, ScenePoint, Transform, ViewPoint, ViewportSize};
use glam::{Mat4, Vec2, Vec3};

/// RGBA, components in 0..=1
pub type Color = [f32; 4];

pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
pub const RED: Color = [1.0, 0.0, 0.0, 1.0];
pub const PLAYER_BLUE: Color = [0.118, 0.196, 0.471, 1.0];
pub const AMBIENT_GREY: Color = [0.8, 0.8, 0.8, 1.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Player,
    Landmark,
}

/// Where a node's geographic position comes from
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeAnchor {
    Fixed(Coordinate),
    FollowsAcceptedLocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialState {
    Normal,
    Highlighted,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// Loaded mesh, scaled by the per-frame transform
    Model,
    ChamferBox { size: f32, chamfer: f32 },
}

impl Geometry {
    /// Bounding sphere radius in points; `None` for meshes
    pub fn bounding_radius(&self) -> Option<f32> {
        match *self {
            Geometry::Model => None,
            Geometry::ChamferBox { size, .. } => Some(size * 3f32.sqrt() / 2.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub diffuse: Color,
    pub highlighted_diffuse: Color,
    pub specular: Color,
}

#[derive(Clone, Debug)]
pub struct OverlayNode {
    pub id: NodeId,
    pub anchor: NodeAnchor,
    pub geometry: Geometry,
    pub appearance: Appearance,
    pub transform: Transform,
    /// Set on tap, cleared by the highlight timer
    pub highlighted: bool,
    /// Material picked from `highlighted` on the last tick
    pub material: MaterialState,
    /// Bounding sphere radius for picking (points)
    pub hit_radius: f32,
    /// False until the first tick has placed the node
    pub visible: bool,
}

impl OverlayNode {
    pub fn position(&self) -> ScenePoint {
        self.transform.w_axis.truncate()
    }

    pub fn diffuse(&self) -> Color {
        match self.material {
            MaterialState::Normal => self.appearance.diffuse,
            MaterialState::Highlighted => self.appearance.highlighted_diffuse,
        }
    }
}

/// Scene camera looking down the view axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneCamera {
    pub position: Vec3,
    pub projection: Mat4,
    pub near: f64,
    pub far: f64,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            projection: Mat4::IDENTITY,
            near: 1.0,
            far: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
}

pub struct OverlayScene {
    viewport: ViewportSize,
    nodes: Vec<OverlayNode>,
    pub camera: SceneCamera,
    pub light: PointLight,
    pub ambient: Color,
}

impl OverlayScene {
    pub fn new(viewport: ViewportSize, config: &OverlayConfig) -> Self {
        let scene = &config.scene;
        let player_geometry = Geometry::Model;
        let player = OverlayNode {
            id: NodeId::Player,
            anchor: NodeAnchor::FollowsAcceptedLocation,
            geometry: player_geometry,
            appearance: Appearance {
                diffuse: PLAYER_BLUE,
                highlighted_diffuse: PLAYER_BLUE,
                specular: WHITE,
            },
            transform: Mat4::IDENTITY,
            highlighted: false,
            material: MaterialState::Normal,
            hit_radius: player_geometry
                .bounding_radius()
                .unwrap_or(scene.player_hit_radius),
            visible: false,
        };
        let landmark_geometry = Geometry::ChamferBox {
            size: scene.landmark_size,
            chamfer: scene.landmark_chamfer,
        };
        let landmark = OverlayNode {
            id: NodeId::Landmark,
            anchor: NodeAnchor::Fixed(config.landmark),
            geometry: landmark_geometry,
            appearance: Appearance {
                diffuse: WHITE,
                highlighted_diffuse: RED,
                specular: WHITE,
            },
            transform: Mat4::IDENTITY,
            highlighted: false,
            material: MaterialState::Normal,
            hit_radius: landmark_geometry.bounding_radius().unwrap_or(0.0),
            visible: false,
        };

        Self {
            viewport,
            nodes: vec![player, landmark],
            camera: SceneCamera::default(),
            light: PointLight { position: Vec3::ZERO },
            ambient: AMBIENT_GREY,
        }
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn nodes(&self) -> &[OverlayNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&OverlayNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut OverlayNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }
}

/// Renderer-side picking
pub trait HitTest {
    /// First node under `point` (view coordinates, top-left origin)
    fn hit_test(&self, point: ViewPoint) -> Option<NodeId>;
}

impl HitTest for OverlayScene {
    fn hit_test(&self, point: ViewPoint) -> Option<NodeId> {
        let scene_point = Vec2::new(point.x, self.viewport.height - point.y);
        self.nodes
            .iter()
            .filter(|n| n.visible)
            .find(|n| n.position().truncate().distance(scene_point) <= n.hit_radius)
            .map(|n| n.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> OverlayScene {
        OverlayScene::new(ViewportSize::new(400.0, 800.0), &OverlayConfig::default())
    }

    fn place(scene: &mut OverlayScene, id: NodeId, x: f32, y: f32) {
        let node = scene.node_mut(id).unwrap();
        node.transform = Mat4::from_translation(Vec3::new(x, y, 0.0));
        node.visible = true;
    }

    #[test]
    fn test_scene_has_player_and_landmark() {
        let scene = scene();
        let landmark = scene.node(NodeId::Landmark).unwrap();

        assert_eq!(
            landmark.anchor,
            NodeAnchor::Fixed(Coordinate::new(47.363688, 8.513255))
        );
        assert_eq!(
            scene.node(NodeId::Player).unwrap().anchor,
            NodeAnchor::FollowsAcceptedLocation
        );
        assert_eq!(landmark.diffuse(), WHITE);
    }

    #[test]
    fn test_hit_radius_from_geometry() {
        let scene = scene();
        let landmark = scene.node(NodeId::Landmark).unwrap();
        assert!((landmark.hit_radius - 20.0 * 3f32.sqrt() / 2.0).abs() < 1e-5);
        assert_eq!(Geometry::Model.bounding_radius(), None);
        assert_eq!(scene.node(NodeId::Player).unwrap().hit_radius, 12.0);
    }

    #[test]
    fn test_highlight_material_colors() {
        let mut scene = scene();
        let landmark = scene.node_mut(NodeId::Landmark).unwrap();
        landmark.material = MaterialState::Highlighted;
        assert_eq!(landmark.diffuse(), RED);
    }

    #[test]
    fn test_hit_test_flips_view_y() {
        let mut scene = scene();
        place(&mut scene, NodeId::Landmark, 100.0, 600.0);

        // scene y 600 is view y 200
        assert_eq!(scene.hit_test(Vec2::new(102.0, 205.0)), Some(NodeId::Landmark));
        assert_eq!(scene.hit_test(Vec2::new(100.0, 600.0)), None);
    }

    #[test]
    fn test_hit_test_ignores_unplaced_nodes() {
        let scene = scene();
        // unplaced nodes sit at the origin
        assert_eq!(scene.hit_test(Vec2::new(0.0, 800.0)), None);
    }

    #[test]
    fn test_hit_test_returns_first_hit() {
        let mut scene = scene();
        place(&mut scene, NodeId::Player, 100.0, 100.0);
        place(&mut scene, NodeId::Landmark, 105.0, 100.0);

        assert_eq!(scene.hit_test(Vec2::new(103.0, 700.0)), Some(NodeId::Player));
    }
}
