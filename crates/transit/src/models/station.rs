//! Stations and their platforms.
//!
//! Both types are built once by the reference store and shared as `Arc`s;
//! nothing mutates them after load.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::{StationId, StopId};
use crate::models::types::{Direction, Line};

/// A physical transit complex, owning its platforms.
///
/// Stops are kept in reference-dataset encounter order.
#[derive(Clone, Debug)]
pub struct Station {
    pub id: StationId,
    pub name: Arc<str>,
    pub stops: Vec<Arc<Stop>>,
}

impl Station {
    /// Union of the lines served by this station's stops.
    pub fn lines(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        for stop in &self.stops {
            for line in &stop.lines {
                if !lines.contains(line) {
                    lines.push(*line);
                }
            }
        }
        lines
    }
}

/// A single platform (one boarding direction) within a station.
#[derive(Clone, Debug)]
pub struct Stop {
    pub id: StopId,
    pub description: Arc<str>,
    pub direction: Direction,
    /// x = longitude, y = latitude.
    pub position: Point,
    pub ada: bool,
    /// Lines serving this platform, deduplicated (a shared platform may
    /// serve several).
    pub lines: Vec<Line>,
}
