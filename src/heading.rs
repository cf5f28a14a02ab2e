use crate::types::HeadingFix;

/// Latest compass reading
///
/// Readings are passed through unfiltered; compass jitter shows up directly in
/// the map camera's yaw.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadingTracker {
    last: Option<HeadingFix>,
}

impl HeadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, fix: HeadingFix) {
        self.last = Some(fix);
    }

    pub fn last(&self) -> Option<HeadingFix> {
        self.last
    }

    /// Degrees clockwise from magnetic north, 0 before the first reading
    pub fn magnetic_heading(&self) -> f64 {
        self.last.map(|h| h.magnetic_heading).unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_north() {
        let tracker = HeadingTracker::new();
        assert_eq!(tracker.magnetic_heading(), 0.0);
        assert!(tracker.last().is_none());
    }

    #[test]
    fn test_latest_reading_wins() {
        let mut tracker = HeadingTracker::new();
        tracker.update(HeadingFix::new(90.0));
        tracker.update(HeadingFix::new(271.5));
        assert_eq!(tracker.magnetic_heading(), 271.5);

        tracker.reset();
        assert_eq!(tracker.magnetic_heading(), 0.0);
    }
}
