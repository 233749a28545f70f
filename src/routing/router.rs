//! Path computation between two points.

use std::future::Future;
use std::time::Duration;

use geo_types::LineString;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{MapError, Resource};
use crate::models::{Coordinate, Route};

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org/";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(20);

pub trait RouteService: Send + Sync {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<Route, MapError>> + Send;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

/// GeoJSON LineString, `[lon, lat]` pairs
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl OsrmResponse {
    /// First (best) route of a successful answer
    fn into_route(self, origin: Coordinate, destination: Coordinate) -> Result<Route, MapError> {
        if self.code != "Ok" {
            let reason = match self.message {
                Some(m) => format!("{}: {}", self.code, m),
                None => self.code,
            };
            return Err(MapError::fetch(Resource::Route, reason));
        }

        let best = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| MapError::fetch(Resource::Route, "no route in answer"))?;

        Ok(Route {
            origin,
            destination,
            distance_m: best.distance,
            duration_s: best.duration,
            geometry: LineString::from(
                best.geometry
                    .coordinates
                    .into_iter()
                    .map(|[lon, lat]| (lon, lat))
                    .collect::<Vec<_>>(),
            ),
        })
    }
}

/// OSRM HTTP route service (driving profile)
pub struct OsrmRouter {
    client: Client,
    base_url: Url,
}

impl OsrmRouter {
    pub fn new(client: Client, base_url: &str) -> Result<Self, MapError> {
        let base_url = Url::parse(base_url).map_err(|e| MapError::fetch(Resource::Route, e))?;
        Ok(Self { client, base_url })
    }

    fn request_url(&self, origin: Coordinate, destination: Coordinate) -> Result<Url, MapError> {
        let path = format!(
            "route/v1/driving/{},{};{},{}",
            origin.longitude, origin.latitude, destination.longitude, destination.latitude
        );
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| MapError::fetch(Resource::Route, e))?;
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson")
            .append_pair("alternatives", "true");
        Ok(url)
    }
}

impl RouteService for OsrmRouter {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, MapError> {
        let url = self.request_url(origin, destination)?;

        let response = self
            .client
            .get(url)
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| MapError::fetch(Resource::Route, e))?;

        // OSRM reports routing failures as JSON bodies with a 400 status
        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| MapError::fetch(Resource::Route, e))?;

        let route = body.into_route(origin, destination)?;
        debug!(
            distance_m = route.distance_m,
            duration_s = route.duration_s,
            vertices = route.geometry.0.len(),
            "Route computed"
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_lon_lat_order() {
        let router = OsrmRouter::new(Client::new(), DEFAULT_OSRM_URL).unwrap();
        let url = router
            .request_url(Coordinate::new(21.25, 81.63), Coordinate::new(21.2, 81.7))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://router.project-osrm.org/route/v1/driving/81.63,21.25;81.7,21.2?overview=full&geometries=geojson&alternatives=true"
        );
    }

    #[test]
    fn test_parse_ok_answer() {
        let json = r#"{
            "code": "Ok",
            "routes": [
                {"distance": 5230.4, "duration": 610.2, "geometry": {"type": "LineString", "coordinates": [[81.63, 21.25], [81.65, 21.23], [81.7, 21.2]]}},
                {"distance": 6100.0, "duration": 700.0, "geometry": {"type": "LineString", "coordinates": [[81.63, 21.25], [81.7, 21.2]]}}
            ],
            "waypoints": []
        }"#;
        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        let route = response
            .into_route(Coordinate::new(21.25, 81.63), Coordinate::new(21.2, 81.7))
            .unwrap();
        assert_eq!(route.distance_m, 5230.4);
        assert_eq!(route.path().len(), 3);
        assert_eq!(route.path()[1], Coordinate::new(21.23, 81.65));
    }

    #[test]
    fn test_parse_no_route() {
        let json = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        let err = response
            .into_route(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0))
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to fetch route!");
        assert!(err.to_string().contains("Impossible route"));
    }
}
