//! Collaborator seams.
//!
//! The surrounding application implements these; the core only consumes
//! them. All calls are plain synchronous operations executed on whatever
//! worker the caller chooses — async wrapping belongs to the presentation
//! boundary, not here.

use std::io::Read;

use crate::identifiers::StationId;
use crate::models::types::{Direction, Line, Result};

/// Which upstream endpoint a fetch targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    TrainArrivals,
    FollowTrain,
    BusRoutes,
    BusDirections,
    BusArrivals,
    BikeStations,
}

/// Fetch one raw response payload. Connect/read timeouts are the
/// implementor's failure domain, surfaced as [`TransitError::Connection`].
///
/// [`TransitError::Connection`]: crate::models::types::TransitError::Connection
pub trait Connector: Send + Sync {
    fn fetch(&self, kind: RequestKind, params: &[(&str, String)]) -> Result<String>;
}

/// Open the bundled station/stop reference dataset.
pub trait AssetLoader: Send + Sync {
    fn open_reference_dataset(&self) -> Result<Box<dyn Read + Send>>;
}

/// User visibility preferences for arrival rows, persisted elsewhere.
pub trait PreferenceStore: Send + Sync {
    fn is_visible(&self, station: StationId, line: Line, direction: Direction) -> bool;
}

/// Preference store that hides nothing. Useful default and test double.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllVisible;

impl PreferenceStore for AllVisible {
    fn is_visible(&self, _station: StationId, _line: Line, _direction: Direction) -> bool {
        true
    }
}
