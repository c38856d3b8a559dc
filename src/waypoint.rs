use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::position::Position;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointKind {
    #[default]
    Waypoint,
    Turn,
    Landmark,
    Transition,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One validated stop along a resolved route.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Waypoint {
    pub position: Position,
    pub order: i64,
    pub kind: WaypointKind,
    /// Replaces the generated turn phrase when present.
    pub instruction: Option<String>,
    pub landmark: Option<Landmark>,
    pub floor: Option<String>,
    pub indoor: bool,
}

impl Waypoint {
    /// A plain waypoint with no metadata.
    pub fn new(order: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position::new(latitude, longitude),
            order,
            kind: WaypointKind::Waypoint,
            instruction: None,
            landmark: None,
            floor: None,
            indoor: false,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_landmark(mut self, name: impl Into<String>) -> Self {
        self.landmark = Some(Landmark {
            name: name.into(),
            description: None,
        });
        self
    }

    pub fn with_floor(mut self, floor: impl Into<String>, indoor: bool) -> Self {
        self.floor = Some(floor.into());
        self.indoor = indoor;
        self
    }

    pub fn with_kind(mut self, kind: WaypointKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Floors are stored either as numbers or as labels such as "B1".
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FloorValue {
    Number(i64),
    Label(String),
}

impl FloorValue {
    fn into_label(self) -> Option<String> {
        match self {
            FloorValue::Number(n) => Some(n.to_string()),
            FloorValue::Label(s) => non_blank(Some(s)),
        }
    }
}

/// A waypoint exactly as the data store delivers it. Nothing is guaranteed.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointRecord {
    pub order: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<WaypointKind>,
    pub instruction: Option<String>,
    pub landmark: Option<Landmark>,
    pub floor: Option<FloorValue>,
    pub is_indoor: Option<bool>,
}

#[derive(Debug, Error)]
pub enum WaypointError {
    #[error("record {index}: missing order")]
    MissingOrder { index: usize },

    #[error("record {index}: missing coordinate")]
    MissingCoordinate { index: usize },

    #[error("record {index}: coordinate ({latitude}, {longitude}) is out of range")]
    InvalidCoordinate {
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    #[error("record {index}: order {order} does not follow {previous}")]
    OrderNotAscending {
        index: usize,
        previous: i64,
        order: i64,
    },

    #[error("malformed waypoint data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read waypoint file: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted top-level shapes for a waypoint document.
#[derive(Deserialize)]
#[serde(untagged)]
enum WaypointDocument {
    List(Vec<WaypointRecord>),
    Wrapped { nodes: Vec<WaypointRecord> },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_record(index: usize, record: WaypointRecord) -> Result<Waypoint, WaypointError> {
    let order = record.order.ok_or(WaypointError::MissingOrder { index })?;
    let (latitude, longitude) = match (record.latitude, record.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(WaypointError::MissingCoordinate { index }),
    };

    let valid = latitude.is_finite()
        && longitude.is_finite()
        && latitude.abs() <= 90.0
        && longitude.abs() <= 180.0;
    if !valid {
        return Err(WaypointError::InvalidCoordinate {
            index,
            latitude,
            longitude,
        });
    }

    let landmark = record.landmark.filter(|l| !l.name.trim().is_empty());

    Ok(Waypoint {
        position: Position::new(latitude, longitude),
        order,
        kind: record.kind.unwrap_or_default(),
        instruction: non_blank(record.instruction),
        landmark,
        floor: record.floor.and_then(FloorValue::into_label),
        indoor: record.is_indoor.unwrap_or(false),
    })
}

/// Validate raw records into an ordered waypoint list.
///
/// Orders must be strictly ascending; gaps are fine.
pub fn parse_waypoints(records: Vec<WaypointRecord>) -> Result<Vec<Waypoint>, WaypointError> {
    let mut waypoints: Vec<Waypoint> = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let waypoint = parse_record(index, record)?;
        if let Some(previous) = waypoints.last()
            && waypoint.order <= previous.order
        {
            return Err(WaypointError::OrderNotAscending {
                index,
                previous: previous.order,
                order: waypoint.order,
            });
        }
        waypoints.push(waypoint);
    }

    Ok(waypoints)
}

/// Parse a JSON array of records, or an object with a `nodes` array.
pub fn load_waypoints_json(json: &str) -> Result<Vec<Waypoint>, WaypointError> {
    let records = match serde_json::from_str::<WaypointDocument>(json)? {
        WaypointDocument::List(records) => records,
        WaypointDocument::Wrapped { nodes } => nodes,
    };
    parse_waypoints(records)
}

pub fn load_waypoints_file(path: impl AsRef<Path>) -> Result<Vec<Waypoint>, WaypointError> {
    let contents = fs::read_to_string(path)?;
    load_waypoints_json(&contents)
}
