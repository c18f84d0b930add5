//! # cta-transit
//!
//! Core data layer for a Chicago transit tracker: turns the CTA's live
//! train/bus feeds and the Divvy station list into queryable, display-ready
//! results, joined against a bundled station/stop reference dataset.
//!
//! The UI, HTTP client, asset packaging and preference persistence all live
//! elsewhere, behind the seams in [`network::traits`]; this crate is plain
//! synchronous parsing, indexing, merging and sorting.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cta_transit::prelude::*;
//!
//! # struct MyConnector;
//! # impl Connector for MyConnector {
//! #     fn fetch(&self, _: RequestKind, _: &[(&str, String)]) -> cta_transit::models::Result<String> {
//! #         unimplemented!()
//! #     }
//! # }
//! # struct MyAssets;
//! # impl AssetLoader for MyAssets {
//! #     fn open_reference_dataset(&self) -> cta_transit::models::Result<Box<dyn std::io::Read + Send>> {
//! #         unimplemented!()
//! #     }
//! # }
//! # fn main() -> cta_transit::models::Result<()> {
//! let reference = Arc::new(ReferenceDataStore::new());
//! let facade = TransitFacade::new(reference, MyConnector, AllVisible);
//! facade.load_reference(&MyAssets)?;
//!
//! let favorites = [StationId::new(40380), StationId::new(41400)];
//! let result = facade.load_favorite_train_arrivals(&favorites);
//! for (station, arrival) in &result.arrivals {
//!     println!("{}: {} upcoming trains", station, arrival.etas.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod feed;
pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod reference;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::{StationId, StopId};
    pub use crate::models::arrivals::{
        BikeStation, BusArrival, BusRoute, Eta, TrainArrival, TrainArrivalMap,
    };
    pub use crate::models::station::{Station, Stop};
    pub use crate::models::types::{Direction, Line, Result, TransitError};
    pub use crate::network::traits::{
        AllVisible, AssetLoader, Connector, PreferenceStore, RequestKind,
    };
    pub use crate::provider::{ArrivalsResult, TransitFacade};
    pub use crate::reference::ReferenceDataStore;
}
