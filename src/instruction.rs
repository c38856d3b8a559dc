use crate::config::ARRIVAL_THRESHOLD_M;
use crate::waypoint::Waypoint;

pub const ARRIVAL_MESSAGE: &str = "You have reached the waypoint";

/// Coarse turn categories for a relative bearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Maneuver {
    TurnLeft,
    SlightLeft,
    Straight,
    SlightRight,
    TurnRight,
}

impl Maneuver {
    /// Negative bearings are to the left. ±45 exactly still counts as "slight".
    pub fn from_relative_bearing(relative_bearing: f64) -> Self {
        match relative_bearing {
            b if b < -45.0 => Maneuver::TurnLeft,
            b if b < -15.0 => Maneuver::SlightLeft,
            b if b <= 15.0 => Maneuver::Straight,
            b if b <= 45.0 => Maneuver::SlightRight,
            _ => Maneuver::TurnRight,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Maneuver::TurnLeft => "Turn left",
            Maneuver::SlightLeft => "Slight left",
            Maneuver::Straight => "Continue straight",
            Maneuver::SlightRight => "Slight right",
            Maneuver::TurnRight => "Turn right",
        }
    }
}

fn distance_suffix(distance: f64) -> String {
    if distance > 100.0 {
        format!(" in {}m", ((distance / 10.0).round() * 10.0) as i64)
    } else if distance > 0.0 {
        format!(" in {}m", distance.round() as i64)
    } else {
        String::new()
    }
}

/// Build the instruction toward `target`.
///
/// Inside the arrival radius the fixed arrival message wins. Otherwise a custom
/// instruction on the waypoint replaces the turn phrase, then landmark, floor
/// and distance are appended in that order.
pub fn generate_instruction(relative_bearing: f64, distance: f64, target: &Waypoint) -> String {
    if distance < ARRIVAL_THRESHOLD_M {
        return ARRIVAL_MESSAGE.to_string();
    }

    let mut instruction = match &target.instruction {
        Some(custom) => custom.clone(),
        None => Maneuver::from_relative_bearing(relative_bearing)
            .phrase()
            .to_string(),
    };

    if let Some(landmark) = &target.landmark {
        instruction.push_str(&format!(" toward {}", landmark.name));
    }

    if target.indoor
        && let Some(floor) = &target.floor
    {
        instruction.push_str(&format!(" (Floor {})", floor));
    }

    instruction.push_str(&distance_suffix(distance));
    instruction
}
