//! Free-text destination lookup.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{MapError, Resource};
use crate::models::Coordinate;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// A geocoding hit. Candidates come back ranked by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub location: Coordinate,
    pub display_name: Option<String>,
}

pub trait Geocoder: Send + Sync {
    /// Ranked candidates for `query`; an empty list means no match
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<GeocodeCandidate>, MapError>> + Send;
}

/// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

impl NominatimPlace {
    fn into_candidate(self) -> Option<GeocodeCandidate> {
        let location = Coordinate::new(self.lat.parse().ok()?, self.lon.parse().ok()?);
        location.is_valid().then_some(GeocodeCandidate {
            location,
            display_name: self.display_name,
        })
    }
}

/// Nominatim `/search` client
pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: &str) -> Result<Self, MapError> {
        let search_url = Url::parse(base_url)
            .and_then(|base| base.join("search"))
            .map_err(|e| MapError::fetch(Resource::Geocoding, e))?;
        Ok(Self { client, search_url })
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", query);
        url
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeCandidate>, MapError> {
        let response = self
            .client
            .get(self.request_url(query))
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| MapError::fetch(Resource::Geocoding, e))?;

        if !response.status().is_success() {
            return Err(MapError::fetch(
                Resource::Geocoding,
                format!("status {}", response.status()),
            ));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| MapError::fetch(Resource::Geocoding, e))?;

        let candidates: Vec<GeocodeCandidate> = places
            .into_iter()
            .filter_map(NominatimPlace::into_candidate)
            .collect();

        debug!(query, count = candidates.len(), "Geocoded destination");
        Ok(candidates)
    }
}
