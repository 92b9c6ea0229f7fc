use std::{fmt, str::FromStr};

use serde::Deserialize;

/// Route traversal sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Going route (`0`).
    Outbound,
    /// Return route (`1`).
    Return,
}

impl Direction {
    /// The numeric code the transit API uses for this direction.
    pub fn code(self) -> u8 {
        match self {
            Direction::Outbound => 0,
            Direction::Return => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Direction::Outbound),
            "1" => Ok(Direction::Return),
            other => Err(format!("Invalid direction '{other}', expected 0 or 1")),
        }
    }
}

/// Localized name as returned by the API.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LocalizedName {
    /// Traditional Chinese name, which commands match against.
    #[serde(rename = "Zh_tw")]
    pub zh_tw: Option<String>,
    /// English name, when the operator provides one.
    #[serde(rename = "En")]
    pub en: Option<String>,
}

/// One row of `/Bus/EstimatedTimeOfArrival`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ArrivalEstimate {
    /// 0 means the estimate is valid; other codes mean not departed, last bus
    /// passed, no service today, etc.
    pub stop_status: i32,
    /// Seconds until arrival. Absent when `stop_status` is not 0.
    pub estimate_time: Option<i64>,
    /// Name of the stop the estimate is for.
    #[serde(default)]
    pub stop_name: LocalizedName,
}

impl ArrivalEstimate {
    /// Returns the estimate in seconds when the stop status is normal.
    pub fn valid_estimate(&self) -> Option<i64> {
        if self.stop_status == 0 { self.estimate_time } else { None }
    }
}

/// One row of `/Bus/Route`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RouteInfo {
    /// First stop of the outbound trip.
    pub departure_stop_name_zh: Option<String>,
    /// Last stop of the outbound trip.
    pub destination_stop_name_zh: Option<String>,
}

impl RouteInfo {
    /// The last stop for a trip in the given direction.
    pub fn terminus(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Outbound => self.destination_stop_name_zh.as_deref(),
            Direction::Return => self.departure_stop_name_zh.as_deref(),
        }
    }
}

/// One stop inside a `/Bus/DisplayStopOfRoute` row.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RouteStop {
    /// Position along the route, growing in the direction of travel.
    pub stop_sequence: u32,
    /// Display name of the stop.
    #[serde(default)]
    pub stop_name: LocalizedName,
}

/// One row of `/Bus/DisplayStopOfRoute`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayStopOfRoute {
    /// Stops in route order.
    #[serde(default)]
    pub stops: Vec<RouteStop>,
}

impl DisplayStopOfRoute {
    /// Finds the sequence number of the stop whose display name is `station`.
    pub fn sequence_of(&self, station: &str) -> Option<u32> {
        self.stops
            .iter()
            .find(|stop| stop.stop_name.zh_tw.as_deref() == Some(station))
            .map(|stop| stop.stop_sequence)
    }
}

/// One row of `/Bus/RealTimeNearStop`: a running bus and the stop it is at.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct NearbyBus {
    /// Licence plate.
    pub plate_numb: Option<String>,
    /// Sequence number of the stop the bus is at or leaving.
    pub stop_sequence: u32,
}
