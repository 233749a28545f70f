//! Route requests and computed routes.

use geo_types::LineString;
use uuid::Uuid;

use super::Coordinate;

/// One route request. A newer request supersedes it before it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSession {
    pub id: Uuid,
    pub origin: Coordinate,
    pub destination_query: String,
    pub resolved_destination: Option<Coordinate>,
    pub active: bool,
}

impl RouteSession {
    pub fn new(origin: Coordinate, destination_query: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            destination_query: destination_query.to_string(),
            resolved_destination: None,
            active: false,
        }
    }
}

/// Path geometry between two points as computed by the routing service
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub distance_m: f64,
    pub duration_s: f64,
    /// x = longitude, y = latitude
    pub geometry: LineString<f64>,
}

impl Route {
    /// Path vertices as coordinates
    pub fn path(&self) -> Vec<Coordinate> {
        self.geometry
            .points()
            .map(Coordinate::from)
            .collect()
    }
}
