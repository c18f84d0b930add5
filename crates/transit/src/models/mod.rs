//! Data model for stations, stops, lines and arrival predictions.

pub mod arrivals;
pub mod station;
pub mod types;

pub use arrivals::*;
pub use station::*;
pub use types::*;
