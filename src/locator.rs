use crate::position::Position;
use crate::waypoint::Waypoint;

/// Index of the waypoint closest to `location`, or `None` for an empty list.
///
/// Ties go to the lowest index.
pub fn find_nearest(location: &Position, waypoints: &[Waypoint]) -> Option<usize> {
    let mut nearest: Option<(usize, f64)> = None;

    for (index, waypoint) in waypoints.iter().enumerate() {
        let distance = location.distance_to(&waypoint.position);
        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((index, distance)),
        }
    }

    nearest.map(|(index, _)| index)
}
