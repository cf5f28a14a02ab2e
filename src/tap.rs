use crate::scene::{HitTest, NodeId, OverlayScene};
use crate::types::ViewPoint;

/// Pending highlight revert
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightTimer {
    pub node: NodeId,
    /// Render-clock time the flag goes back to false
    pub due: f64,
}

/// Routes taps to overlay nodes
///
/// A tap on the landmark raises its highlight flag and arms a one-shot timer
/// to lower it. Timers are never cancelled: a second tap arms a second timer,
/// and the first one still clears the flag on schedule. Clearing an already
/// clear flag is a no-op, so overlapping timers are harmless. Timers fire from
/// `poll`, which runs on the render context alongside the tick.
#[derive(Clone, Debug)]
pub struct TapRouter {
    highlight_secs: f64,
    timers: Vec<HighlightTimer>,
}

impl TapRouter {
    pub fn new(highlight_secs: f64) -> Self {
        Self {
            highlight_secs,
            timers: Vec::new(),
        }
    }

    /// Hit-test `point` against the scene and route the result
    pub fn on_tap(&mut self, scene: &mut OverlayScene, point: ViewPoint, now: f64) -> Option<NodeId> {
        let hit = scene.hit_test(point);
        self.on_hit(scene, hit, now);
        hit
    }

    /// Route a hit produced by an external picker; returns true if a highlight was raised
    pub fn on_hit(&mut self, scene: &mut OverlayScene, hit: Option<NodeId>, now: f64) -> bool {
        if hit != Some(NodeId::Landmark) {
            return false;
        }
        let Some(node) = scene.node_mut(NodeId::Landmark) else {
            return false;
        };

        node.highlighted = true;
        self.timers.push(HighlightTimer {
            node: NodeId::Landmark,
            due: now + self.highlight_secs,
        });
        log::debug!("landmark highlighted until {:.3}", now + self.highlight_secs);
        true
    }

    /// Fire every timer due at `now`; returns how many fired
    pub fn poll(&mut self, scene: &mut OverlayScene, now: f64) -> usize {
        let mut fired = 0;
        self.timers.retain(|timer| {
            if timer.due > now {
                return true;
            }
            if let Some(node) = scene.node_mut(timer.node) {
                node.highlighted = false;
            }
            fired += 1;
            false
        });
        fired
    }

    pub fn pending(&self) -> &[HighlightTimer] {
        &self.timers
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::types::ViewportSize;
    use glam::{Mat4, Vec2, Vec3};

    fn scene_with_landmark_at(x: f32, y: f32) -> OverlayScene {
        let mut scene = OverlayScene::new(ViewportSize::new(400.0, 800.0), &OverlayConfig::default());
        let node = scene.node_mut(NodeId::Landmark).unwrap();
        node.transform = Mat4::from_translation(Vec3::new(x, y, 0.0));
        node.visible = true;
        scene
    }

    fn highlighted(scene: &OverlayScene) -> bool {
        scene.node(NodeId::Landmark).unwrap().highlighted
    }

    // scene (200, 500) is view (200, 300)
    const ON_LANDMARK: Vec2 = Vec2::new(200.0, 300.0);

    #[test]
    fn test_tap_highlights_then_reverts() {
        let mut scene = scene_with_landmark_at(200.0, 500.0);
        let mut router = TapRouter::new(0.2);

        assert_eq!(router.on_tap(&mut scene, ON_LANDMARK, 1.0), Some(NodeId::Landmark));
        assert!(highlighted(&scene));

        assert_eq!(router.poll(&mut scene, 1.19), 0);
        assert!(highlighted(&scene));

        assert_eq!(router.poll(&mut scene, 1.21), 1);
        assert!(!highlighted(&scene));
        assert!(router.pending().is_empty());
    }

    #[test]
    fn test_second_tap_does_not_extend_first_timer() {
        let mut scene = scene_with_landmark_at(200.0, 500.0);
        let mut router = TapRouter::new(0.2);

        router.on_tap(&mut scene, ON_LANDMARK, 1.0);
        router.on_tap(&mut scene, ON_LANDMARK, 1.1);
        assert_eq!(router.pending().len(), 2);

        // first timer clears the flag even though the second tap was later
        router.poll(&mut scene, 1.25);
        assert!(!highlighted(&scene));
        assert_eq!(router.pending().len(), 1);

        router.poll(&mut scene, 1.31);
        assert!(!highlighted(&scene));
        assert!(router.pending().is_empty());
    }

    #[test]
    fn test_miss_does_nothing() {
        let mut scene = scene_with_landmark_at(200.0, 500.0);
        let mut router = TapRouter::new(0.2);

        assert_eq!(router.on_tap(&mut scene, Vec2::new(10.0, 10.0), 1.0), None);
        assert!(!highlighted(&scene));
        assert!(router.pending().is_empty());
    }

    #[test]
    fn test_player_hit_is_ignored() {
        let mut scene = scene_with_landmark_at(200.0, 500.0);
        let mut router = TapRouter::new(0.2);

        assert!(!router.on_hit(&mut scene, Some(NodeId::Player), 1.0));
        assert!(router.pending().is_empty());
    }
}
