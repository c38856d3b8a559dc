/// Heading arithmetic and 8-point compass labels (N, NE, E, etc.)
/// Represents an 8-point compass rose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Direction {
    N,  // north
    NE, // northeast
    E,  // east
    SE, // southeast
    S,  // south
    SW, // southwest
    W,  // west
    NW, // northwest
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl Direction {
    pub fn name(&self) -> &str {
        match self {
            Direction::N => "north",
            Direction::NE => "northeast",
            Direction::E => "east",
            Direction::SE => "southeast",
            Direction::S => "south",
            Direction::SW => "southwest",
            Direction::W => "west",
            Direction::NW => "northwest",
        }
    }

    pub fn abbreviation(&self) -> &str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }
}

/// Normalize any heading in degrees to the [0, 360) range.
pub fn normalize_heading(heading: f64) -> f64 {
    let normalized = ((heading % 360.0) + 360.0) % 360.0;
    // 360 - epsilon can round up to exactly 360.0
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Fold a bearing difference into [-180, 180].
///
/// Inputs are expected in roughly [-360, 360], so a single correction step is enough.
/// Negative results mean "to the left", positive "to the right".
pub fn normalize_bearing_delta(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

/// Convert a bearing to an 8-point compass direction.
pub fn bearing_to_direction(bearing: f64) -> Direction {
    // each direction covers 45 degrees (360 / 8)
    match normalize_heading(bearing) {
        h if h < 22.5 => Direction::N,
        h if h < 67.5 => Direction::NE,
        h if h < 112.5 => Direction::E,
        h if h < 157.5 => Direction::SE,
        h if h < 202.5 => Direction::S,
        h if h < 247.5 => Direction::SW,
        h if h < 292.5 => Direction::W,
        h if h < 337.5 => Direction::NW,
        _ => Direction::N,
    }
}
