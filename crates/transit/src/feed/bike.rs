//! Bike-share station list (JSON).

use serde::Deserialize;

use crate::models::arrivals::BikeStation;
use crate::models::types::{Result, TransitError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationListResponse {
    station_bean_list: Vec<BikeStation>,
}

/// Decode the bike-share station-list payload.
pub fn parse_bike_stations(payload: &str) -> Result<Vec<BikeStation>> {
    let response: StationListResponse =
        serde_json::from_str(payload).map_err(|e| TransitError::FeedParse(e.to_string()))?;
    Ok(response.station_bean_list)
}
