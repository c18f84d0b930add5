//! Arrival prediction records for trains, buses and bike stations.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use geo::Point;
use serde::Deserialize;

use crate::identifiers::{StationId, StopId};
use crate::models::types::{Direction, Line};

/// Timestamp format used by the train feed (`tmst`, `prdt`, `arrT`).
pub const TRAIN_DATE_FORMAT: &str = "%Y%m%d %H:%M:%S";

/// Timestamp format used by the bus feed (`tmstmp`, `prdtm`).
pub const BUS_DATE_FORMAT: &str = "%Y%m%d %H:%M";

// ============================================================================
// Trains
// ============================================================================

/// One predicted train arrival.
///
/// Station and stop are referenced by identity, not owned; the name fields
/// are session-local copies that the feed's `staNm`/`stpDe` tags may
/// override for display. Built fresh on every parse cycle.
#[derive(Clone, Debug)]
pub struct Eta {
    pub station_id: StationId,
    pub station_name: String,
    pub stop_id: Option<StopId>,
    pub stop_description: String,
    pub stop_direction: Option<Direction>,
    pub line: Line,
    pub run_number: String,
    pub destination_id: Option<StationId>,
    pub destination_name: String,
    /// Raw `trDr` code, kept as sent.
    pub direction_code: Option<String>,
    pub predicted_at: Option<NaiveDateTime>,
    pub arrival_at: Option<NaiveDateTime>,
    pub is_approaching: bool,
    pub is_scheduled: bool,
    pub is_delayed: bool,
    pub is_fault: bool,
    /// Live position, only present on follow-a-train responses.
    pub position: Option<Point>,
    pub heading: Option<f64>,
}

impl Eta {
    pub fn new(station_id: StationId, station_name: impl Into<String>) -> Self {
        Self {
            station_id,
            station_name: station_name.into(),
            stop_id: None,
            stop_description: String::new(),
            stop_direction: None,
            line: Line::Unknown,
            run_number: String::new(),
            destination_id: None,
            destination_name: String::new(),
            direction_code: None,
            predicted_at: None,
            arrival_at: None,
            is_approaching: false,
            is_scheduled: false,
            is_delayed: false,
            is_fault: false,
            position: None,
            heading: None,
        }
    }

    /// Whole minutes between the feed timestamp and the predicted arrival,
    /// or `None` when either side is unset.
    pub fn minutes_to_arrival(&self, feed_timestamp: NaiveDateTime) -> Option<i64> {
        self.arrival_at
            .map(|at| (at - feed_timestamp).num_minutes())
    }

    /// Display value for list rows: "Due" under a minute, "N min" otherwise.
    pub fn time_left_label(&self, feed_timestamp: NaiveDateTime) -> String {
        match self.minutes_to_arrival(feed_timestamp) {
            Some(minutes) if minutes < 1 => "Due".to_string(),
            Some(minutes) => format!("{} min", minutes),
            None => "-".to_string(),
        }
    }
}

/// All predictions for one station from one fetch cycle, replaced wholesale
/// on every fetch.
#[derive(Clone, Debug, Default)]
pub struct TrainArrival {
    pub error_code: Option<u32>,
    pub error_message: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub etas: Vec<Eta>,
}

/// Fetch result keyed by station; the id is the uniqueness key when merging
/// sub-batches.
pub type TrainArrivalMap = HashMap<StationId, TrainArrival>;

// ============================================================================
// Buses
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusRoute {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct BusArrival {
    pub timestamp: Option<NaiveDateTime>,
    pub stop_id: Option<u32>,
    pub stop_name: String,
    pub bus_id: Option<u32>,
    pub distance_feet: Option<u32>,
    pub route_id: String,
    pub direction: Option<Direction>,
    pub destination: String,
    pub predicted_at: Option<NaiveDateTime>,
    pub is_delayed: bool,
}

impl BusArrival {
    pub fn new() -> Self {
        Self {
            timestamp: None,
            stop_id: None,
            stop_name: String::new(),
            bus_id: None,
            distance_feet: None,
            route_id: String::new(),
            direction: None,
            destination: String::new(),
            predicted_at: None,
            is_delayed: false,
        }
    }
}

impl Default for BusArrival {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Bike share
// ============================================================================

/// One bike-share dock, as sent by the station-list JSON feed.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeStation {
    pub id: u32,
    pub station_name: String,
    pub available_docks: u32,
    pub total_docks: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub status_value: String,
    pub available_bikes: u32,
}

impl BikeStation {
    pub fn position(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    pub fn is_in_service(&self) -> bool {
        self.status_value.eq_ignore_ascii_case("In Service")
    }
}
