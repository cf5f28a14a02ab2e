use crate::types::{current_timestamp, Coordinate, HeadingFix, LocationFix};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

/// Location permission state reported by the platform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedAlways | AuthorizationStatus::AuthorizedWhenInUse
        )
    }
}

/// Control surface of the platform location/heading service
pub trait LocationService: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;
    fn request_authorization(&self);
    fn start_location_updates(&self);
    fn stop_location_updates(&self);
    fn start_heading_updates(&self);
    fn stop_heading_updates(&self);
}

/// Callback from the location service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SensorEvent {
    /// Batch of fixes, oldest first; only the first is used
    Location(Vec<LocationFix>),
    Heading(HeadingFix),
    Authorization(AuthorizationStatus),
}

/// Simulated walk in a circle around a point
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircularTrack {
    pub center: Coordinate,
    pub radius_m: f64,
    pub speed_mps: f64,
    pub accuracy_m: f64,
}

impl CircularTrack {
    const METERS_PER_DEG_LAT: f64 = 111_320.0;

    pub fn new(center: Coordinate, radius_m: f64, speed_mps: f64) -> Self {
        Self {
            center,
            radius_m,
            speed_mps,
            accuracy_m: 8.0,
        }
    }

    fn angle_at(&self, elapsed: f64) -> f64 {
        if self.radius_m <= 0.0 {
            return 0.0;
        }
        elapsed * self.speed_mps / self.radius_m
    }

    /// Position `elapsed` seconds into the walk, stamped with `timestamp`
    pub fn fix_at(&self, elapsed: f64, timestamp: f64) -> LocationFix {
        let angle = self.angle_at(elapsed);
        let north = self.radius_m * angle.cos();
        let east = self.radius_m * angle.sin();
        let lat = self.center.latitude + north / Self::METERS_PER_DEG_LAT;
        let lon = self.center.longitude
            + east / (Self::METERS_PER_DEG_LAT * self.center.latitude.to_radians().cos());
        // accuracy wobbles like a real receiver
        let accuracy = self.accuracy_m + (elapsed * 0.1).sin().abs() * self.accuracy_m;
        LocationFix::new(lat, lon, accuracy, timestamp)
    }

    /// Direction of travel (degrees clockwise from north)
    pub fn heading_at(&self, elapsed: f64) -> f64 {
        let degrees = (self.angle_at(elapsed) + PI / 2.0).to_degrees();
        degrees.rem_euclid(360.0)
    }
}

fn forward(tx: &Sender<SensorEvent>, event: SensorEvent, label: &str, count: &mut u64) -> bool {
    match tx.try_send(event) {
        Ok(_) => {
            *count += 1;
            true
        }
        Err(TrySendError::Closed(_)) => {
            log::info!("[{}] channel closed after {} events", label, count);
            false
        }
        Err(TrySendError::Full(_)) => {
            // Channel full, drop this reading
            true
        }
    }
}

/// Emit fixes along `track` every `period`
pub async fn location_loop(tx: Sender<SensorEvent>, track: CircularTrack, period: Duration) {
    let mut ticker = interval(period);
    let start = current_timestamp();
    let mut count = 0u64;

    loop {
        ticker.tick().await;
        let now = current_timestamp();
        let fix = track.fix_at(now - start, now);
        if !forward(&tx, SensorEvent::Location(vec![fix]), "location", &mut count) {
            break;
        }
        if count % 10 == 0 {
            log::debug!("[location] {} fixes", count);
        }
    }
}

/// Emit compass readings following the direction of travel
pub async fn heading_loop(tx: Sender<SensorEvent>, track: CircularTrack, period: Duration) {
    let mut ticker = interval(period);
    let start = current_timestamp();
    let mut count = 0u64;

    loop {
        ticker.tick().await;
        let heading = HeadingFix::new(track.heading_at(current_timestamp() - start));
        if !forward(&tx, SensorEvent::Heading(heading), "heading", &mut count) {
            break;
        }
    }
}

/// Replay recorded fixes, restamped to the current time and spaced as recorded
pub async fn replay_loop(tx: Sender<SensorEvent>, fixes: Vec<LocationFix>, speedup: f64) {
    let Some(first) = fixes.first().copied() else {
        return;
    };
    let speedup = if speedup > 0.0 { speedup } else { 1.0 };
    let offset = current_timestamp() - first.timestamp;
    let mut previous = first.timestamp;
    let mut count = 0u64;

    for fix in fixes {
        let wait = ((fix.timestamp - previous) / speedup).max(0.0);
        tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        previous = fix.timestamp;

        let restamped = LocationFix {
            timestamp: fix.timestamp + offset,
            ..fix
        };
        if !forward(&tx, SensorEvent::Location(vec![restamped]), "replay", &mut count) {
            return;
        }
    }
    log::info!("[replay] finished after {} fixes", count);
}
