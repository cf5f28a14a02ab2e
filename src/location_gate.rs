//! Location debounce gate
//!
//! Decides whether a new fix should replace the accepted location and, if so,
//! whether the map camera should cut to it or pan. Noisy fixes are ignored
//! while a recent precise fix exists, and small or rapid moves are suppressed.

use crate::config::GateThresholds;
use crate::types::LocationFix;
use geo::HaversineDistance;

/// Outcome of evaluating one fix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateDecision {
    pub accept: bool,
    /// Cut the map camera instead of animating
    pub immediate: bool,
}

impl GateDecision {
    pub const REJECT: GateDecision = GateDecision {
        accept: false,
        immediate: false,
    };

    fn accepted(immediate: bool) -> Self {
        GateDecision {
            accept: true,
            immediate,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LocationGate {
    thresholds: GateThresholds,
}

impl LocationGate {
    pub fn new(thresholds: GateThresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate `fix` against the accepted slot, replacing it on accept
    ///
    /// `now` is the wall-clock time (seconds since epoch) used to age the
    /// accepted fix.
    pub fn evaluate(
        &self,
        fix: &LocationFix,
        accepted: &mut Option<LocationFix>,
        now: f64,
    ) -> GateDecision {
        let last = match *accepted {
            Some(last) => last,
            None => {
                *accepted = Some(*fix);
                return GateDecision::accepted(true);
            }
        };

        let t = &self.thresholds;

        // inaccurate fixes only count once the accepted one has gone stale
        let age = (now - last.timestamp).abs();
        if fix.horizontal_accuracy > t.max_accuracy_m && age <= t.accuracy_grace_secs {
            return GateDecision::REJECT;
        }

        if fix.timestamp <= last.timestamp + t.min_interval_secs {
            return GateDecision::REJECT;
        }

        if distance_m(fix, &last) <= t.min_distance_m {
            return GateDecision::REJECT;
        }

        let gap = fix.timestamp - last.timestamp;
        *accepted = Some(*fix);
        GateDecision::accepted(gap > t.hard_cut_gap_secs)
    }
}

/// Great-circle distance between two fixes (meters)
pub fn distance_m(a: &LocationFix, b: &LocationFix) -> f64 {
    a.coordinate()
        .to_point()
        .haversine_distance(&b.coordinate().to_point())
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: f64 = 1_700_000_000.0;
    const METERS_PER_DEG_LAT: f64 = 111_195.0;

    fn fix_at(timestamp: f64, north_m: f64, accuracy: f64) -> LocationFix {
        LocationFix::new(47.3637 + north_m / METERS_PER_DEG_LAT, 8.5133, accuracy, timestamp)
    }

    fn gate_with_first() -> (LocationGate, Option<LocationFix>) {
        let gate = LocationGate::default();
        let mut accepted = None;
        gate.evaluate(&fix_at(T0, 0.0, 5.0), &mut accepted, T0);
        (gate, accepted)
    }

    #[test]
    fn test_first_fix_accepted_immediately() {
        let gate = LocationGate::default();
        let mut accepted = None;

        // even a terrible fix is better than nothing
        let fix = fix_at(T0, 0.0, 500.0);
        let decision = gate.evaluate(&fix, &mut accepted, T0);

        assert_eq!(decision, GateDecision::accepted(true));
        assert_eq!(accepted, Some(fix));
    }

    #[test]
    fn test_too_soon_rejected_regardless_of_distance() {
        let (gate, mut accepted) = gate_with_first();
        let before = accepted;

        let decision = gate.evaluate(&fix_at(T0 + 3.0, 5_000.0, 5.0), &mut accepted, T0 + 3.0);

        assert_eq!(decision, GateDecision::REJECT);
        assert_eq!(accepted, before);
    }

    #[test]
    fn test_inaccurate_fix_rejected_while_accepted_is_fresh() {
        let (gate, mut accepted) = gate_with_first();

        let decision = gate.evaluate(&fix_at(T0 + 1.0, 100.0, 100.0), &mut accepted, T0 + 1.0);
        assert_eq!(decision, GateDecision::REJECT);

        // same fix passes the accuracy rule once the accepted fix is stale
        let stale = fix_at(T0 + 30.0, 100.0, 100.0);
        let decision = gate.evaluate(&stale, &mut accepted, T0 + 30.0);
        assert_eq!(decision, GateDecision::accepted(false));
        assert_eq!(accepted, Some(stale));
    }

    #[test]
    fn test_small_displacement_rejected() {
        let (gate, mut accepted) = gate_with_first();
        let decision = gate.evaluate(&fix_at(T0 + 6.0, 10.0, 5.0), &mut accepted, T0 + 6.0);
        assert_eq!(decision, GateDecision::REJECT);
    }

    #[test]
    fn test_significant_move_pans() {
        let (gate, mut accepted) = gate_with_first();
        let fix = fix_at(T0 + 6.0, 20.0, 5.0);

        let decision = gate.evaluate(&fix, &mut accepted, T0 + 6.0);

        assert_eq!(decision, GateDecision::accepted(false));
        assert_eq!(accepted, Some(fix));
    }

    #[test]
    fn test_long_gap_cuts() {
        let (gate, mut accepted) = gate_with_first();
        let decision = gate.evaluate(&fix_at(T0 + 70.0, 20.0, 5.0), &mut accepted, T0 + 70.0);
        assert_eq!(decision, GateDecision::accepted(true));
    }

    #[test]
    fn test_interval_boundary_is_exclusive() {
        let (gate, mut accepted) = gate_with_first();

        let decision = gate.evaluate(&fix_at(T0 + 5.0, 50.0, 5.0), &mut accepted, T0 + 5.0);
        assert_eq!(decision, GateDecision::REJECT);

        let decision = gate.evaluate(&fix_at(T0 + 5.01, 50.0, 5.0), &mut accepted, T0 + 5.01);
        assert_eq!(decision, GateDecision::accepted(false));
    }

    #[test]
    fn test_distance_boundary() {
        let (gate, mut accepted) = gate_with_first();
        let decision = gate.evaluate(&fix_at(T0 + 6.0, 17.9, 5.0), &mut accepted, T0 + 6.0);
        assert_eq!(decision, GateDecision::REJECT);

        let (gate, mut accepted) = gate_with_first();
        let decision = gate.evaluate(&fix_at(T0 + 6.0, 18.1, 5.0), &mut accepted, T0 + 6.0);
        assert_eq!(decision, GateDecision::accepted(false));
    }

    #[test]
    fn test_gap_of_exactly_sixty_seconds_pans() {
        let (gate, mut accepted) = gate_with_first();
        let decision = gate.evaluate(&fix_at(T0 + 60.0, 20.0, 5.0), &mut accepted, T0 + 60.0);
        assert_eq!(decision, GateDecision::accepted(false));

        let (gate, mut accepted) = gate_with_first();
        let decision = gate.evaluate(&fix_at(T0 + 60.5, 20.0, 5.0), &mut accepted, T0 + 60.5);
        assert_eq!(decision, GateDecision::accepted(true));
    }

    #[test]
    fn test_accuracy_grace_boundary() {
        let (gate, mut accepted) = gate_with_first();

        // accepted fix aged exactly 10 s still counts as fresh
        let decision = gate.evaluate(&fix_at(T0 + 10.0, 100.0, 100.0), &mut accepted, T0 + 10.0);
        assert_eq!(decision, GateDecision::REJECT);

        let decision = gate.evaluate(&fix_at(T0 + 10.5, 100.0, 100.0), &mut accepted, T0 + 10.5);
        assert_eq!(decision, GateDecision::accepted(false));
    }

    #[test]
    fn test_accuracy_limit_is_inclusive() {
        let (gate, mut accepted) = gate_with_first();
        let decision = gate.evaluate(&fix_at(T0 + 6.0, 20.0, 65.0), &mut accepted, T0 + 6.0);
        assert_eq!(decision, GateDecision::accepted(false));
    }

    #[test]
    fn test_interval_measured_from_last_accepted() {
        let (gate, mut accepted) = gate_with_first();

        // rejected fixes do not reset the interval
        gate.evaluate(&fix_at(T0 + 4.0, 50.0, 5.0), &mut accepted, T0 + 4.0);
        let decision = gate.evaluate(&fix_at(T0 + 5.5, 50.0, 5.0), &mut accepted, T0 + 5.5);

        assert!(decision.accept);
    }

    #[test]
    fn test_custom_thresholds() {
        let gate = LocationGate::new(GateThresholds {
            min_distance_m: 50.0,
            ..GateThresholds::default()
        });
        let mut accepted = None;
        gate.evaluate(&fix_at(T0, 0.0, 5.0), &mut accepted, T0);

        let decision = gate.evaluate(&fix_at(T0 + 6.0, 20.0, 5.0), &mut accepted, T0 + 6.0);
        assert!(!decision.accept);
    }

    #[test]
    fn test_distance_matches_haversine() {
        let a = fix_at(T0, 0.0, 5.0);
        let b = fix_at(T0, 20.0, 5.0);
        assert!((distance_m(&a, &b) - 20.0).abs() < 0.1);
    }
}
