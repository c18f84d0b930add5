//! R-tree node for the nearby-station query.

use std::sync::Arc;

use rstar::{PointDistance, RTreeObject, AABB};

use crate::identifiers::StationId;
use crate::models::station::Stop;

/// One stop position in the spatial index, carrying its owning station's id
/// so query results can be grouped back to stations.
#[derive(Clone)]
pub struct StopNode {
    pub station_id: StationId,
    pub stop: Arc<Stop>,
    point: [f64; 2],
}

impl StopNode {
    pub fn new(station_id: StationId, stop: Arc<Stop>) -> Self {
        let point = [stop.position.x(), stop.position.y()];
        Self {
            station_id,
            stop,
            point,
        }
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}
