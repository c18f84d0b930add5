//! The one entry point the presentation layer uses.
//!
//! Orchestrates connector -> parser -> aggregator and exposes the
//! read-only reference queries. Everything here is a plain synchronous
//! call; the presentation boundary wraps it in whatever task machinery it
//! wants. No failure crosses this surface as a panic: favorites report a
//! boolean error state, everything else returns `Result`.

use std::sync::Arc;

use geo::Point;
use tracing::{debug, warn};

use crate::aggregator::{
    apply_visibility, chunk_station_ids, compare_etas, merge_batches, sort_for_display,
};
use crate::feed::{
    parse_bike_stations, parse_bus_arrivals, parse_bus_directions, parse_bus_routes,
    parse_train_arrivals,
};
use crate::identifiers::{StationId, StopId};
use crate::models::arrivals::{BikeStation, BusArrival, BusRoute, Eta, TrainArrival, TrainArrivalMap};
use crate::models::station::{Station, Stop};
use crate::models::types::{Direction, Line, Result};
use crate::network::traits::{AssetLoader, Connector, PreferenceStore, RequestKind};
use crate::reference::ReferenceDataStore;

/// Favorites result: always renderable, possibly empty, with an explicit
/// error state instead of a propagated failure.
#[derive(Clone, Debug, Default)]
pub struct ArrivalsResult {
    pub arrivals: TrainArrivalMap,
    pub error: bool,
}

pub struct TransitFacade<C, P> {
    reference: Arc<ReferenceDataStore>,
    connector: C,
    preferences: P,
}

impl<C: Connector, P: PreferenceStore> TransitFacade<C, P> {
    pub fn new(reference: Arc<ReferenceDataStore>, connector: C, preferences: P) -> Self {
        Self {
            reference,
            connector,
            preferences,
        }
    }

    /// Load the bundled reference dataset if it has not been loaded yet.
    ///
    /// A [`TransitError::DataLoad`] from here is not transient: unlike a
    /// failed fetch, no retry will fix it, and the train features cannot
    /// work without station identity.
    ///
    /// [`TransitError::DataLoad`]: crate::models::types::TransitError::DataLoad
    pub fn load_reference(&self, loader: &dyn AssetLoader) -> Result<()> {
        self.reference.load(loader)
    }

    // ---- Trains ----

    /// Arrivals for all favorite stations: chunked fetch, merge, user
    /// visibility filter, display sort.
    pub fn load_favorite_train_arrivals(&self, favorites: &[StationId]) -> ArrivalsResult {
        let mut batches = Vec::new();
        for chunk in chunk_station_ids(favorites) {
            match self.fetch_arrival_batch(chunk) {
                Ok(batch) => batches.push(batch),
                Err(e) => {
                    warn!(error = %e, "favorites fetch failed");
                    return ArrivalsResult {
                        arrivals: TrainArrivalMap::new(),
                        error: true,
                    };
                }
            }
        }

        let mut arrivals = merge_batches(batches);
        apply_visibility(&mut arrivals, &self.preferences);
        sort_for_display(&mut arrivals);
        debug!(stations = arrivals.len(), "favorites loaded");

        ArrivalsResult {
            arrivals,
            error: false,
        }
    }

    /// Arrivals for one station. `Ok(None)` when the feed has no matching
    /// records — a station can legitimately have no imminent arrivals.
    pub fn load_single_station_arrival(&self, station: StationId) -> Result<Option<TrainArrival>> {
        let mut arrivals = self.fetch_arrival_batch(&[station])?;
        apply_visibility(&mut arrivals, &self.preferences);
        sort_for_display(&mut arrivals);
        Ok(arrivals.remove(&station))
    }

    /// Positions and predictions for one train run, flattened into stop
    /// order by arrival time. These responses carry the live position and
    /// heading fields.
    pub fn follow_train(&self, run_number: &str) -> Result<Vec<Eta>> {
        let payload = self.connector.fetch(
            RequestKind::FollowTrain,
            &[("runnumber", run_number.to_string())],
        )?;
        let arrivals = parse_train_arrivals(&payload, &self.reference)?;

        let mut etas: Vec<Eta> = arrivals.into_values().flat_map(|a| a.etas).collect();
        etas.sort_by(compare_etas);
        Ok(etas)
    }

    fn fetch_arrival_batch(&self, stations: &[StationId]) -> Result<TrainArrivalMap> {
        let params: Vec<(&str, String)> = stations
            .iter()
            .map(|id| ("mapid", id.to_string()))
            .collect();
        let payload = self.connector.fetch(RequestKind::TrainArrivals, &params)?;
        parse_train_arrivals(&payload, &self.reference)
    }

    // ---- Buses ----

    pub fn load_bus_routes(&self) -> Result<Vec<BusRoute>> {
        let payload = self.connector.fetch(RequestKind::BusRoutes, &[])?;
        parse_bus_routes(&payload)
    }

    pub fn load_bus_directions(&self, route: &str) -> Result<Vec<Direction>> {
        let payload = self
            .connector
            .fetch(RequestKind::BusDirections, &[("rt", route.to_string())])?;
        parse_bus_directions(&payload)
    }

    pub fn load_bus_arrivals(
        &self,
        route: &str,
        direction: Direction,
        stop_id: u32,
    ) -> Result<Vec<BusArrival>> {
        let payload = self.connector.fetch(
            RequestKind::BusArrivals,
            &[
                ("rt", route.to_string()),
                ("dir", direction.display_text().to_string()),
                ("stpid", stop_id.to_string()),
            ],
        )?;
        parse_bus_arrivals(&payload)
    }

    // ---- Bike share ----

    pub fn load_bike_stations(&self) -> Result<Vec<BikeStation>> {
        let payload = self.connector.fetch(RequestKind::BikeStations, &[])?;
        parse_bike_stations(&payload)
    }

    // ---- Reference queries ----

    pub fn station_by_id(&self, id: StationId) -> Option<Arc<Station>> {
        self.reference.station_by_id(id)
    }

    pub fn stop_by_id(&self, id: StopId) -> Option<Arc<Stop>> {
        self.reference.stop_by_id(id)
    }

    pub fn stations_for_line(&self, line: Line) -> Vec<Arc<Station>> {
        self.reference.stations_for_line(line)
    }

    pub fn stations_near(&self, center: Point, radius_degrees: f64) -> Vec<Arc<Station>> {
        self.reference.stations_near(center, radius_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::TransitError;
    use crate::network::traits::AllVisible;

    struct FixtureAsset(&'static str);

    impl AssetLoader for FixtureAsset {
        fn open_reference_dataset(&self) -> Result<Box<dyn std::io::Read + Send>> {
            Ok(Box::new(std::io::Cursor::new(self.0.as_bytes().to_vec())))
        }
    }

    /// Station 100 with stops 1001 (North) and 1002 (South), Red line.
    const REFERENCE_CSV: &str = concat!(
        "STOP_ID,DIRECTION_ID,STOP_NAME,STATION_NAME,STATION_DESCRIPTIVE_NAME,MAP_ID,ADA,RED,BLUE,G,BRN,P,Pexp,Y,Pnk,O,Location\n",
        "1001,N,North,Test Station,Test Station (Red Line),100,true,true,false,false,false,false,false,false,false,false,\"(-87.6, 41.8)\"\n",
        "1002,S,South,Test Station,Test Station (Red Line),100,true,true,false,false,false,false,false,false,false,false,\"(-87.6, 41.8)\"\n",
    );

    struct CannedConnector(&'static str);

    impl Connector for CannedConnector {
        fn fetch(&self, _kind: RequestKind, _params: &[(&str, String)]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingConnector;

    impl Connector for FailingConnector {
        fn fetch(&self, _kind: RequestKind, _params: &[(&str, String)]) -> Result<String> {
            Err(TransitError::Connection("socket timeout".to_string()))
        }
    }

    fn facade<C: Connector>(connector: C) -> TransitFacade<C, AllVisible> {
        let reference = Arc::new(ReferenceDataStore::new());
        let facade = TransitFacade::new(reference, connector, AllVisible);
        facade.load_reference(&FixtureAsset(REFERENCE_CSV)).unwrap();
        facade
    }

    #[test]
    fn test_single_station_end_to_end() {
        let xml = "<ctatt><tmst>20240101 09:00:00</tmst><errCd>0</errCd><errNm/>\
                   <eta><staId>100</staId><stpId>1001</stpId><rt>Red</rt>\
                   <arrT>20240101 09:05:00</arrT><isDly>0</isDly></eta></ctatt>";
        let facade = facade(CannedConnector(xml));

        let arrival = facade
            .load_single_station_arrival(StationId::new(100))
            .unwrap()
            .expect("one arrival expected");

        assert_eq!(arrival.etas.len(), 1);
        let eta = &arrival.etas[0];
        assert_eq!(eta.stop_description, "North");
        assert_eq!(eta.stop_direction, Some(Direction::North));
        assert_eq!(eta.line, Line::Red);
        assert!(!eta.is_delayed);
        assert_eq!(
            eta.arrival_at.map(|t| t.to_string()),
            Some("2024-01-01 09:05:00".to_string())
        );
    }

    #[test]
    fn test_single_station_without_records_is_absent() {
        let xml = "<ctatt><tmst>20240101 09:00:00</tmst><errCd>0</errCd><errNm/></ctatt>";
        let facade = facade(CannedConnector(xml));

        let arrival = facade
            .load_single_station_arrival(StationId::new(100))
            .unwrap();
        assert!(arrival.is_none());
    }

    #[test]
    fn test_favorites_failure_is_flagged_not_thrown() {
        let facade = facade(FailingConnector);

        let result = facade.load_favorite_train_arrivals(&[StationId::new(100)]);
        assert!(result.error);
        assert!(result.arrivals.is_empty());
    }

    #[test]
    fn test_favorites_filtered_and_sorted() {
        struct HideSouth;
        impl PreferenceStore for HideSouth {
            fn is_visible(&self, _s: StationId, _l: Line, direction: Direction) -> bool {
                direction != Direction::South
            }
        }

        let xml = "<ctatt><tmst>20240101 09:00:00</tmst><errCd>0</errCd><errNm/>\
                   <eta><staId>100</staId><stpId>1002</stpId><rt>Red</rt>\
                   <arrT>20240101 09:02:00</arrT></eta>\
                   <eta><staId>100</staId><stpId>1001</stpId><rt>Red</rt>\
                   <arrT>20240101 09:08:00</arrT></eta>\
                   <eta><staId>100</staId><stpId>1001</stpId><rt>Red</rt>\
                   <arrT>20240101 09:04:00</arrT></eta></ctatt>";

        let reference = Arc::new(ReferenceDataStore::new());
        let facade = TransitFacade::new(reference, CannedConnector(xml), HideSouth);
        facade.load_reference(&FixtureAsset(REFERENCE_CSV)).unwrap();
        let station_before = facade.station_by_id(StationId::new(100)).unwrap();

        let result = facade.load_favorite_train_arrivals(&[StationId::new(100)]);
        assert!(!result.error);

        // Filtering rewrote the Eta list only; the reference objects are
        // untouched, identity included.
        let station_after = facade.station_by_id(StationId::new(100)).unwrap();
        assert!(Arc::ptr_eq(&station_before, &station_after));
        assert_eq!(station_after.stops.len(), 2);

        let etas = &result.arrivals[&StationId::new(100)].etas;
        // The 09:02 South arrival is hidden; the rest are time-ordered.
        assert_eq!(etas.len(), 2);
        assert!(etas[0].arrival_at < etas[1].arrival_at);
        assert!(etas
            .iter()
            .all(|e| e.stop_direction == Some(Direction::North)));
    }

    #[test]
    fn test_follow_train_orders_by_arrival() {
        let xml = "<ctatt><tmst>20240101 09:00:00</tmst><errCd>0</errCd><errNm/>\
                   <eta><staId>100</staId><stpId>1001</stpId><rt>Red</rt><rn>831</rn>\
                   <arrT>20240101 09:12:00</arrT><lat>41.9</lat><lon>-87.6</lon>\
                   <heading>12</heading></eta>\
                   <eta><staId>100</staId><stpId>1001</stpId><rt>Red</rt><rn>831</rn>\
                   <arrT>20240101 09:03:00</arrT><lat>41.9</lat><lon>-87.6</lon>\
                   <heading>12</heading></eta></ctatt>";
        let facade = facade(CannedConnector(xml));

        let etas = facade.follow_train("831").unwrap();
        assert_eq!(etas.len(), 2);
        assert!(etas[0].arrival_at < etas[1].arrival_at);
        assert!(etas.iter().all(|e| e.position.is_some()));
    }
}
