use log::{debug, info, warn};
use serde::Serialize;

use crate::compass::{normalize_bearing_delta, normalize_heading};
use crate::config::{ARRIVAL_THRESHOLD_M, EMPTY_PATH_INSTRUCTION, INITIAL_INSTRUCTION};
use crate::instruction::generate_instruction;
use crate::location::{LocationError, LocationFix};
use crate::locator::find_nearest;
use crate::waypoint::Waypoint;

/// Snapshot published to the presentation layer after every update.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavigationState {
    pub location: Option<LocationFix>,
    /// Last known heading. Kept across fixes that carry none.
    pub heading: Option<f64>,
    pub nearest_index: Option<usize>,
    pub next_index: Option<usize>,
    pub distance_to_next: Option<f64>,
    pub bearing_to_next: Option<f64>,
    /// Signed angle from heading to the next waypoint; negative is left.
    pub relative_bearing: f64,
    pub instruction: String,
    pub arrived_at_next: bool,
    pub arrived_at_destination: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            location: None,
            heading: None,
            nearest_index: None,
            next_index: None,
            distance_to_next: None,
            bearing_to_next: None,
            relative_bearing: 0.0,
            instruction: INITIAL_INSTRUCTION.to_string(),
            arrived_at_next: false,
            arrived_at_destination: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationPhase {
    /// No fix received yet.
    Uninitialized,
    Tracking,
    /// Within the arrival radius of the final waypoint as of the latest fix.
    Arrived,
}

impl NavigationState {
    pub fn phase(&self) -> NavigationPhase {
        if self.location.is_none() {
            NavigationPhase::Uninitialized
        } else if self.arrived_at_destination {
            NavigationPhase::Arrived
        } else {
            NavigationPhase::Tracking
        }
    }
}

fn usable_heading(heading: f64) -> Option<f64> {
    (heading.is_finite() && heading >= 0.0).then(|| normalize_heading(heading))
}

pub struct Navigator {
    waypoints: Vec<Waypoint>,
    state: NavigationState,
}

impl Navigator {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            state: NavigationState::default(),
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Swap the waypoint list. The current state is left as is; call
    /// [`Navigator::reset`] to start a fresh session against the new list.
    pub fn set_waypoints(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints;
    }

    /// Drop the waypoint list. Only the instruction changes; the last numbers stay.
    pub fn clear_waypoints(&mut self) -> &NavigationState {
        self.waypoints.clear();
        self.state.instruction = EMPTY_PATH_INSTRUCTION.to_string();
        &self.state
    }

    /// Back to the initial state, optionally carrying the known heading over.
    pub fn reset(&mut self, keep_heading: bool) {
        let heading = if keep_heading { self.state.heading } else { None };
        self.state = NavigationState {
            heading,
            ..NavigationState::default()
        };
    }

    /// Record a heading from a dedicated heading sensor. Used from the next fix on.
    pub fn on_heading(&mut self, heading: f64) {
        if let Some(heading) = usable_heading(heading) {
            self.state.heading = Some(heading);
        }
    }

    /// Report a provider failure. Only the instruction changes.
    pub fn on_location_error(&mut self, error: &LocationError) -> &NavigationState {
        warn!("Location error: {}", error);
        self.state.instruction = format!("Location error: {}", error);
        &self.state
    }

    /// Recompute the full state from one fix.
    pub fn on_fix(&mut self, fix: &LocationFix) -> &NavigationState {
        if !fix.position.is_finite() {
            warn!("Ignoring fix with unusable coordinates {}", fix.position);
            return &self.state;
        }

        let Some(nearest) = find_nearest(&fix.position, &self.waypoints) else {
            self.state.instruction = EMPTY_PATH_INSTRUCTION.to_string();
            return &self.state;
        };

        let heading = fix
            .heading
            .and_then(usable_heading)
            .or(self.state.heading);

        let last = self.waypoints.len() - 1;
        let next = (nearest + 1).min(last);
        let target = &self.waypoints[next];

        let distance = fix.position.distance_to(&target.position);
        let bearing = fix.position.bearing_to(&target.position);
        let relative_bearing = match heading {
            Some(heading) => normalize_bearing_delta(bearing - heading),
            None => 0.0,
        };

        let arrived_at_next = distance < ARRIVAL_THRESHOLD_M;
        let arrived_at_destination = next == last && arrived_at_next;

        let snapshot = NavigationState {
            location: Some(fix.clone()),
            heading,
            nearest_index: Some(nearest),
            next_index: Some(next),
            distance_to_next: Some(distance),
            bearing_to_next: Some(bearing),
            relative_bearing,
            instruction: generate_instruction(relative_bearing, distance, target),
            arrived_at_next,
            arrived_at_destination,
        };

        if arrived_at_destination && !self.state.arrived_at_destination {
            info!("Arrived at destination (waypoint {})", target.order);
        } else if arrived_at_next
            && !(self.state.arrived_at_next && self.state.next_index == Some(next))
        {
            info!("Reached waypoint {}", target.order);
        }
        debug!(
            "Fix {} -> next #{} at {:.1}m, bearing {:.1}°, relative {:.1}°",
            fix.position, next, distance, bearing, relative_bearing
        );

        self.state = snapshot;
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::ARRIVAL_MESSAGE;

    fn two_point_path() -> Vec<Waypoint> {
        vec![Waypoint::new(1, 0.0, 0.0), Waypoint::new(2, 0.0, 0.001)]
    }

    fn three_point_path() -> Vec<Waypoint> {
        vec![
            Waypoint::new(1, 0.0, 0.0),
            Waypoint::new(2, 0.0, 0.001),
            Waypoint::new(3, 0.001, 0.001),
        ]
    }

    #[test]
    fn test_initial_state() {
        let navigator = Navigator::new(two_point_path());
        let state = navigator.state();
        assert_eq!(state.instruction, INITIAL_INSTRUCTION);
        assert_eq!(state.phase(), NavigationPhase::Uninitialized);
        assert!(state.nearest_index.is_none());
        assert!(!state.arrived_at_next);
        assert!(!state.arrived_at_destination);
    }

    #[test]
    fn test_heading_east_toward_next() {
        let mut navigator = Navigator::new(two_point_path());
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(90.0));

        assert_eq!(state.nearest_index, Some(0));
        assert_eq!(state.next_index, Some(1));
        let distance = state.distance_to_next.unwrap();
        assert!((distance - 111.19).abs() < 0.1, "got {}", distance);
        assert!((state.bearing_to_next.unwrap() - 90.0).abs() < 1e-6);
        assert!(state.relative_bearing.abs() < 1e-6);
        assert!(state.instruction.starts_with("Continue straight"));
        assert!(state.instruction.ends_with(" in 110m"));
        assert!(!state.arrived_at_next);
        assert_eq!(state.phase(), NavigationPhase::Tracking);
    }

    #[test]
    fn test_fix_is_kept_in_state() {
        let mut navigator = Navigator::new(two_point_path());
        let fix = LocationFix::new(0.0, 0.0).with_accuracy(4.5);
        let state = navigator.on_fix(&fix);
        assert_eq!(state.location.as_ref(), Some(&fix));
    }

    #[test]
    fn test_non_finite_fix_ignored() {
        let mut navigator = Navigator::new(two_point_path());
        navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(90.0));
        let before = navigator.state().clone();

        let state = navigator.on_fix(&LocationFix::new(f64::NAN, 0.0));
        assert_eq!(state, &before);
        let state = navigator.on_fix(&LocationFix::new(0.0, f64::INFINITY));
        assert_eq!(state, &before);

        let mut fresh = Navigator::new(two_point_path());
        let state = fresh.on_fix(&LocationFix::new(f64::NAN, f64::NAN));
        assert_eq!(state.instruction, INITIAL_INSTRUCTION);
        assert!(state.distance_to_next.is_none());
    }

    #[test]
    fn test_without_heading_defaults_to_straight() {
        let mut navigator = Navigator::new(two_point_path());
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0));
        assert!(state.heading.is_none());
        assert_eq!(state.relative_bearing, 0.0);
        assert_eq!(state.instruction, "Continue straight in 110m");
    }

    #[test]
    fn test_heading_facing_away_turns() {
        let mut navigator = Navigator::new(two_point_path());
        // Facing north, target due east
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(0.0));
        assert!((state.relative_bearing - 90.0).abs() < 1e-6);
        assert_eq!(state.instruction, "Turn right in 110m");

        // Facing north-east by east, target due east -> slightly right
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(60.0));
        assert_eq!(state.instruction, "Slight right in 110m");

        // Facing south-east by south -> target is to the left
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(170.0));
        assert!((state.relative_bearing + 80.0).abs() < 1e-6);
        assert_eq!(state.instruction, "Turn left in 110m");
    }

    #[test]
    fn test_relative_bearing_wraps() {
        let path = vec![Waypoint::new(1, 0.0, 0.0), Waypoint::new(2, 0.001, 0.0)];
        let mut navigator = Navigator::new(path);
        // Target due north, heading 350 -> 10 degrees to the right
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(350.0));
        assert!((state.relative_bearing - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_heading_is_sticky() {
        let mut navigator = Navigator::new(two_point_path());
        navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(0.0));
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0));
        assert_eq!(state.heading, Some(0.0));
        assert_eq!(state.instruction, "Turn right in 110m");

        // Negative heading means "unknown" and is ignored
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(-1.0));
        assert_eq!(state.heading, Some(0.0));
    }

    #[test]
    fn test_separate_heading_sensor() {
        let mut navigator = Navigator::new(two_point_path());
        navigator.on_heading(90.0);
        navigator.on_heading(f64::NAN);
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0));
        assert_eq!(state.heading, Some(90.0));
        assert_eq!(state.instruction, "Continue straight in 110m");
    }

    #[test]
    fn test_next_clamped_to_last() {
        let mut navigator = Navigator::new(three_point_path());
        let state = navigator.on_fix(&LocationFix::new(0.0012, 0.001));
        assert_eq!(state.nearest_index, Some(2));
        assert_eq!(state.next_index, Some(2));
    }

    #[test]
    fn test_arrival_at_destination() {
        let mut navigator = Navigator::new(two_point_path());
        // ~5.5m west of the last waypoint, facing away
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.00095).with_heading(270.0));
        assert_eq!(state.next_index, Some(1));
        assert!(state.distance_to_next.unwrap() < ARRIVAL_THRESHOLD_M);
        assert!(state.arrived_at_next);
        assert!(state.arrived_at_destination);
        assert_eq!(state.instruction, ARRIVAL_MESSAGE);
        assert_eq!(state.phase(), NavigationPhase::Arrived);
    }

    #[test]
    fn test_intermediate_arrival_is_not_destination() {
        // First two waypoints ~11m apart, so the second is reached while the
        // first is still the nearest.
        let mut navigator = Navigator::new(vec![
            Waypoint::new(1, 0.0, 0.0),
            Waypoint::new(2, 0.0, 0.0001),
            Waypoint::new(3, 0.0, 0.01),
        ]);
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.00004));
        assert_eq!(state.nearest_index, Some(0));
        assert_eq!(state.next_index, Some(1));
        assert!(state.arrived_at_next);
        assert!(!state.arrived_at_destination);
        assert_eq!(state.instruction, ARRIVAL_MESSAGE);
    }

    #[test]
    fn test_arrival_is_not_sticky() {
        let mut navigator = Navigator::new(two_point_path());
        assert!(
            navigator
                .on_fix(&LocationFix::new(0.0, 0.001))
                .arrived_at_destination
        );

        // Walk back out of the arrival radius past the end of the path
        let state = navigator.on_fix(&LocationFix::new(0.0, 0.0013));
        assert_eq!(state.next_index, Some(1));
        assert!(!state.arrived_at_destination);
        assert_eq!(state.phase(), NavigationPhase::Tracking);
    }

    #[test]
    fn test_empty_path_keeps_prior_numbers() {
        let mut navigator = Navigator::new(two_point_path());
        let before = navigator
            .on_fix(&LocationFix::new(0.0, 0.0).with_heading(90.0))
            .clone();

        navigator.set_waypoints(Vec::new());
        let after = navigator.on_fix(&LocationFix::new(1.0, 1.0).with_heading(180.0));

        assert_eq!(after.instruction, EMPTY_PATH_INSTRUCTION);
        assert_eq!(after.distance_to_next, before.distance_to_next);
        assert_eq!(after.relative_bearing, before.relative_bearing);
        assert_eq!(after.nearest_index, before.nearest_index);
        assert_eq!(after.location, before.location);
        assert_eq!(after.heading, Some(90.0));
    }

    #[test]
    fn test_location_error_keeps_prior_numbers() {
        let mut navigator = Navigator::new(two_point_path());
        let before = navigator.on_fix(&LocationFix::new(0.0, 0.0)).clone();

        let after = navigator.on_location_error(&LocationError::Timeout);
        assert_eq!(after.instruction, "Location error: timed out waiting for a position");
        assert_eq!(after.distance_to_next, before.distance_to_next);
        assert_eq!(after.next_index, before.next_index);
        assert_eq!(after.location, before.location);
    }

    #[test]
    fn test_reset_heading_policy() {
        let mut navigator = Navigator::new(two_point_path());
        navigator.on_fix(&LocationFix::new(0.0, 0.0).with_heading(45.0));

        navigator.reset(true);
        assert_eq!(navigator.state().heading, Some(45.0));
        assert_eq!(navigator.state().instruction, INITIAL_INSTRUCTION);
        assert!(navigator.state().location.is_none());

        navigator.reset(false);
        assert_eq!(navigator.state().heading, None);
    }
}
