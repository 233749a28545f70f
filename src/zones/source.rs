//! Zone data source trait and the HTTP implementation (`GET /zones`).

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{MapError, Resource};
use crate::models::Zone;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Where the zone dataset comes from
pub trait ZoneSource: Send + Sync {
    /// Fetch the full zone set
    fn fetch_zones(&self) -> impl Future<Output = Result<Vec<Zone>, MapError>> + Send;
}

/// Fetches the zone set from the zone server
pub struct HttpZoneSource {
    client: Client,
    zones_url: Url,
}

impl HttpZoneSource {
    /// `base_url` is the zone server root, e.g. `http://127.0.0.1:5000/`
    pub fn new(client: Client, base_url: &str) -> Result<Self, MapError> {
        let zones_url = Url::parse(base_url)
            .and_then(|base| base.join("zones"))
            .map_err(|e| MapError::fetch(Resource::Zones, e))?;
        Ok(Self { client, zones_url })
    }

    pub fn zones_url(&self) -> &Url {
        &self.zones_url
    }
}

impl ZoneSource for HttpZoneSource {
    async fn fetch_zones(&self) -> Result<Vec<Zone>, MapError> {
        let response = self
            .client
            .get(self.zones_url.clone())
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| MapError::fetch(Resource::Zones, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MapError::fetch(
                Resource::Zones,
                format!("status {}: {}", status, body),
            ));
        }

        let zones: Vec<Zone> = response
            .json()
            .await
            .map_err(|e| MapError::fetch(Resource::Zones, e))?;

        debug!(count = zones.len(), url = %self.zones_url, "Fetched zones");
        Ok(zones)
    }
}
