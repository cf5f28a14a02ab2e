//! Overlay session: the state shared between sensor, map and render callbacks
//!
//! Sensor callbacks, map region changes and render ticks can all arrive on
//! different threads. The accepted location, cached map center and heading
//! live behind one mutex; critical sections copy values in or out and never
//! span map calls or projection math. Scene, tap timers and the render clock
//! belong to the render context and sit behind a second mutex that only that
//! context takes.

use crate::camera_sync::{CameraSynchronizer, FrameInputs, FrameReport};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::heading::HeadingTracker;
use crate::location_gate::{GateDecision, LocationGate};
use crate::map::{CameraTransition, MapCamera, MapView};
use crate::scene::{NodeId, OverlayScene};
use crate::sensors::{AuthorizationStatus, LocationService, SensorEvent};
use crate::tap::TapRouter;
use crate::types::{current_timestamp, Coordinate, HeadingFix, LocationFix, ViewPoint, ViewportSize};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Session counters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub fixes_received: u64,
    pub fixes_accepted: u64,
    pub fixes_rejected: u64,
    pub immediate_cuts: u64,
    pub heading_updates: u64,
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub taps: u64,
    pub landmark_hits: u64,
}

#[derive(Default)]
struct SharedState {
    accepted: Option<LocationFix>,
    center: Option<Coordinate>,
    heading: HeadingTracker,
    active: bool,
    fixes_received: u64,
    fixes_accepted: u64,
    immediate_cuts: u64,
    heading_updates: u64,
}

struct RenderState {
    sync: CameraSynchronizer,
    scene: OverlayScene,
    taps: TapRouter,
    last_frame: Option<FrameReport>,
    frames_rendered: u64,
    frames_skipped: u64,
    taps_received: u64,
    landmark_hits: u64,
}

pub struct OverlaySession<M: MapView> {
    config: OverlayConfig,
    map: Arc<M>,
    gate: LocationGate,
    shared: Mutex<SharedState>,
    render: Mutex<RenderState>,
}

impl<M: MapView> OverlaySession<M> {
    /// Take over `map`: apply the overlay's map settings and seed the center cache
    pub fn new(map: Arc<M>, viewport: ViewportSize, config: OverlayConfig) -> Self {
        map.apply_settings(&config.map);

        let shared = SharedState {
            center: Some(map.center_coordinate()),
            ..SharedState::default()
        };
        let render = RenderState {
            sync: CameraSynchronizer::new(config.scene.clone(), viewport),
            scene: OverlayScene::new(viewport, &config),
            taps: TapRouter::new(config.scene.highlight_secs),
            last_frame: None,
            frames_rendered: 0,
            frames_skipped: 0,
            taps_received: 0,
            landmark_hits: 0,
        };

        OverlaySession {
            gate: LocationGate::new(config.gate.clone()),
            config,
            map,
            shared: Mutex::new(shared),
            render: Mutex::new(render),
        }
    }

    fn shared(&self) -> OverlayResult<MutexGuard<'_, SharedState>> {
        self.shared
            .lock()
            .map_err(|_| OverlayError::LockPoisoned("session state"))
    }

    fn render(&self) -> OverlayResult<MutexGuard<'_, RenderState>> {
        self.render
            .lock()
            .map_err(|_| OverlayError::LockPoisoned("render state"))
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn map(&self) -> &Arc<M> {
        &self.map
    }

    /// Screen became visible: start sensors, or ask for permission first
    pub fn activate(&self, sensors: &dyn LocationService) -> OverlayResult<()> {
        self.shared()?.active = true;

        let status = sensors.authorization_status();
        if status.is_authorized() {
            sensors.start_location_updates();
            sensors.start_heading_updates();
            log::info!("session active, sensors started");
        } else {
            log::info!("session active, requesting location authorization ({:?})", status);
            sensors.request_authorization();
        }
        Ok(())
    }

    /// Screen went away: stop sensors and forget location and heading
    pub fn deactivate(&self, sensors: &dyn LocationService) -> OverlayResult<()> {
        sensors.stop_heading_updates();
        sensors.stop_location_updates();

        {
            let mut shared = self.shared()?;
            shared.active = false;
            shared.accepted = None;
            shared.heading.reset();
        }

        // next activation starts from a fresh render clock and no highlight
        let mut guard = self.render()?;
        let render = &mut *guard;
        render.sync.reset();
        render.taps.clear();
        if let Some(landmark) = render.scene.node_mut(NodeId::Landmark) {
            landmark.highlighted = false;
        }
        log::info!("session inactive, sensors stopped");
        Ok(())
    }

    pub fn handle_authorization_change(
        &self,
        status: AuthorizationStatus,
        sensors: &dyn LocationService,
    ) -> OverlayResult<()> {
        if status.is_authorized() {
            log::info!("location authorized ({:?}), starting location updates", status);
            sensors.start_location_updates();
        }
        Ok(())
    }

    pub fn handle_location_update(&self, fixes: &[LocationFix]) -> OverlayResult<GateDecision> {
        self.handle_location_update_at(fixes, current_timestamp())
    }

    /// Gate the first fix of a batch; on accept, retarget the map onto it
    pub fn handle_location_update_at(
        &self,
        fixes: &[LocationFix],
        now: f64,
    ) -> OverlayResult<GateDecision> {
        let Some(fix) = fixes.first() else {
            return Ok(GateDecision::REJECT);
        };

        let (decision, heading) = {
            let mut shared = self.shared()?;
            shared.fixes_received += 1;
            let decision = self.gate.evaluate(fix, &mut shared.accepted, now);
            if decision.accept {
                shared.fixes_accepted += 1;
                if decision.immediate {
                    shared.immediate_cuts += 1;
                }
            }
            (decision, shared.heading.magnetic_heading())
        };

        if !decision.accept {
            log::debug!(
                "fix rejected ({:.6}, {:.6}) accuracy {:.1} m",
                fix.latitude,
                fix.longitude,
                fix.horizontal_accuracy
            );
            return Ok(decision);
        }

        let transition = if decision.immediate {
            CameraTransition::Immediate
        } else {
            CameraTransition::with_duration(self.config.retarget.pan_secs)
        };
        log::debug!(
            "fix accepted ({:.6}, {:.6}), retargeting map {:?}",
            fix.latitude,
            fix.longitude,
            transition
        );
        self.map.set_camera(self.retarget_camera(fix.coordinate(), heading), transition);
        Ok(decision)
    }

    /// Record a compass reading; once located, turn the map to follow it
    pub fn handle_heading_update(&self, fix: HeadingFix) -> OverlayResult<()> {
        let accepted = {
            let mut shared = self.shared()?;
            shared.heading.update(fix);
            shared.heading_updates += 1;
            shared.accepted
        };

        if let Some(location) = accepted {
            let camera = self.retarget_camera(location.coordinate(), fix.magnetic_heading);
            self.map.set_camera(camera, CameraTransition::Default);
        }
        Ok(())
    }

    /// Map viewport is moving: refresh the cached center
    pub fn handle_region_changing(&self) -> OverlayResult<()> {
        let center = self.map.center_coordinate();
        self.shared()?.center = Some(center);
        Ok(())
    }

    fn retarget_camera(&self, center: Coordinate, heading: f64) -> MapCamera {
        MapCamera {
            center,
            altitude: self.map.camera().altitude,
            pitch: self.config.retarget.pitch_deg,
            heading,
        }
    }

    /// Per-frame update; `time` is the renderer's monotonic clock in seconds
    ///
    /// Returns `None` when the frame was skipped for lack of a location or
    /// map center.
    pub fn render_tick(&self, time: f64) -> OverlayResult<Option<FrameReport>> {
        let inputs = {
            let shared = self.shared()?;
            match (shared.accepted, shared.center) {
                (Some(accepted), Some(center)) => Some(FrameInputs {
                    accepted: accepted.coordinate(),
                    center,
                    heading: shared.heading.magnetic_heading(),
                }),
                _ => None,
            }
        };

        let mut guard = self.render()?;
        let render = &mut *guard;
        render.taps.poll(&mut render.scene, time);

        let report = render
            .sync
            .tick(self.map.as_ref(), &mut render.scene, inputs, time);
        match report {
            Some(report) => {
                render.frames_rendered += 1;
                render.last_frame = Some(report);
            }
            None => render.frames_skipped += 1,
        }
        Ok(report)
    }

    /// Tap in renderer coordinates at render-clock `time`
    pub fn handle_tap(&self, point: ViewPoint, time: f64) -> OverlayResult<Option<NodeId>> {
        let mut guard = self.render()?;
        let render = &mut *guard;
        render.taps_received += 1;

        let hit = render.taps.on_tap(&mut render.scene, point, time);
        if hit == Some(NodeId::Landmark) {
            render.landmark_hits += 1;
        }
        Ok(hit)
    }

    pub fn handle_event(&self, event: SensorEvent, sensors: &dyn LocationService) -> OverlayResult<()> {
        match event {
            SensorEvent::Location(fixes) => self.handle_location_update(&fixes).map(|_| ()),
            SensorEvent::Heading(fix) => self.handle_heading_update(fix),
            SensorEvent::Authorization(status) => self.handle_authorization_change(status, sensors),
        }
    }

    pub fn accepted_location(&self) -> OverlayResult<Option<LocationFix>> {
        Ok(self.shared()?.accepted)
    }

    pub fn center_coordinate(&self) -> OverlayResult<Option<Coordinate>> {
        Ok(self.shared()?.center)
    }

    pub fn heading(&self) -> OverlayResult<Option<HeadingFix>> {
        Ok(self.shared()?.heading.last())
    }

    pub fn is_active(&self) -> OverlayResult<bool> {
        Ok(self.shared()?.active)
    }

    pub fn last_frame(&self) -> OverlayResult<Option<FrameReport>> {
        Ok(self.render()?.last_frame)
    }

    /// Read the scene as of the last tick
    pub fn with_scene<T>(&self, f: impl FnOnce(&OverlayScene) -> T) -> OverlayResult<T> {
        let render = self.render()?;
        Ok(f(&render.scene))
    }

    pub fn stats(&self) -> OverlayResult<SessionStats> {
        let (received, accepted, cuts, headings) = {
            let s = self.shared()?;
            (s.fixes_received, s.fixes_accepted, s.immediate_cuts, s.heading_updates)
        };
        let render = self.render()?;
        Ok(SessionStats {
            fixes_received: received,
            fixes_accepted: accepted,
            fixes_rejected: received - accepted,
            immediate_cuts: cuts,
            heading_updates: headings,
            frames_rendered: render.frames_rendered,
            frames_skipped: render.frames_skipped,
            taps: render.taps_received,
            landmark_hits: render.landmark_hits,
        })
    }
}
