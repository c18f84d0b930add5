//! Event-driven parsers for the live feeds.
//!
//! One discipline, four grammars: every parser is a single forward pass
//! over start-tag / text / end-tag events, holding exactly one piece of
//! state — which field it is currently inside — as a closed tag enum.

pub mod bike;
pub mod bus;
pub mod tags;
pub mod train;

pub use bike::parse_bike_stations;
pub use bus::{parse_bus_arrivals, parse_bus_directions, parse_bus_routes};
pub use train::parse_train_arrivals;
