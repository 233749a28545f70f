//! Facility source backed by the Overpass API.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{MapError, Resource};
use crate::models::{Coordinate, Facility, FacilityKind, GeoBbox};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Server-side query timeout in seconds, embedded in the query itself
const QUERY_TIMEOUT_SECS: u32 = 25;

/// Bounding-box amenity query
pub trait FacilitySource: Send + Sync {
    fn fetch_facilities(
        &self,
        kind: &FacilityKind,
        bbox: &GeoBbox,
    ) -> impl Future<Output = Result<Vec<Facility>, MapError>> + Send;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: OverpassTags,
}

#[derive(Debug, Default, Deserialize)]
struct OverpassTags {
    name: Option<String>,
}

impl OverpassResponse {
    /// Convert node elements; anything without a position is skipped
    fn into_facilities(self, kind: &FacilityKind) -> Vec<Facility> {
        self.elements
            .into_iter()
            .filter_map(|el| {
                Some(Facility {
                    location: Coordinate::new(el.lat?, el.lon?),
                    kind: kind.clone(),
                    name: el.tags.name,
                })
            })
            .collect()
    }
}

/// Build the Overpass QL query for one amenity type inside a bounding box
pub fn build_query(kind: &FacilityKind, bbox: &GeoBbox) -> String {
    format!(
        "[out:json][timeout:{}];node[amenity={}]({});out;",
        QUERY_TIMEOUT_SECS,
        kind.tag(),
        bbox.to_overpass()
    )
}

pub struct OverpassClient {
    client: Client,
    endpoint: Url,
}

impl OverpassClient {
    pub fn new(client: Client, endpoint: &str) -> Result<Self, MapError> {
        let endpoint = Url::parse(endpoint).map_err(|e| MapError::fetch(Resource::Facilities, e))?;
        Ok(Self { client, endpoint })
    }

    fn request_url(&self, kind: &FacilityKind, bbox: &GeoBbox) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("data", &build_query(kind, bbox));
        url
    }
}

impl FacilitySource for OverpassClient {
    async fn fetch_facilities(
        &self,
        kind: &FacilityKind,
        bbox: &GeoBbox,
    ) -> Result<Vec<Facility>, MapError> {
        let url = self.request_url(kind, bbox);
        debug!(%kind, "Querying Overpass");

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(u64::from(QUERY_TIMEOUT_SECS) + 5))
            .send()
            .await
            .map_err(|e| MapError::fetch(Resource::Facilities, e))?;

        if !response.status().is_success() {
            return Err(MapError::fetch(
                Resource::Facilities,
                format!("status {}", response.status()),
            ));
        }

        let body: OverpassResponse = response
            .json()
            .await
            .map_err(|e| MapError::fetch(Resource::Facilities, e))?;

        let facilities = body.into_facilities(kind);
        debug!(%kind, count = facilities.len(), "Overpass answered");
        Ok(facilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query() {
        let bbox = GeoBbox::new(21.15, 81.60, 21.30, 81.65);
        assert_eq!(
            build_query(&FacilityKind::FireStation, &bbox),
            "[out:json][timeout:25];node[amenity=fire_station](21.15,81.6,21.3,81.65);out;"
        );
    }

    #[test]
    fn test_request_url_encodes_query() {
        let client = OverpassClient::new(Client::new(), DEFAULT_OVERPASS_URL).unwrap();
        let url = client.request_url(&FacilityKind::Atm, &GeoBbox::new(1.0, 2.0, 3.0, 4.0));
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "data");
        assert_eq!(value, "[out:json][timeout:25];node[amenity=atm](1,2,3,4);out;");
        assert!(url.as_str().starts_with("https://overpass-api.de/api/interpreter?data="));
    }

    #[test]
    fn test_parse_elements() {
        let json = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 21.24, "lon": 81.63, "tags": {"amenity": "hospital", "name": "District Hospital"}},
                {"type": "node", "id": 2, "lat": 21.26, "lon": 81.62, "tags": {"amenity": "hospital"}},
                {"type": "node", "id": 3}
            ]
        }"#;
        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        let facilities = response.into_facilities(&FacilityKind::Hospital);
        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].name.as_deref(), Some("District Hospital"));
        assert_eq!(facilities[1].name, None);
        assert_eq!(facilities[1].location, Coordinate::new(21.26, 81.62));
    }

    #[test]
    fn test_parse_missing_elements() {
        let response: OverpassResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_facilities(&FacilityKind::Police).is_empty());
    }
}
