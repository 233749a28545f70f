//! Current conditions at the user's position (OpenWeather).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{MapError, Resource};
use crate::models::Coordinate;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// What the weather popup shows
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    /// Condition group, e.g. "Clouds"
    pub summary: Option<String>,
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    main: Option<WeatherMain>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

impl From<WeatherResponse> for Weather {
    fn from(response: WeatherResponse) -> Self {
        Self {
            summary: response.weather.into_iter().next().map(|c| c.main),
            temperature_c: response.main.map(|m| m.temp),
        }
    }
}

pub struct WeatherClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl WeatherClient {
    pub fn new(client: Client, base_url: &str, api_key: impl Into<String>) -> Result<Self, MapError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("data/2.5/weather"))
            .map_err(|e| MapError::fetch(Resource::Weather, e))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    fn request_url(&self, at: Coordinate) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("lat", &at.latitude.to_string())
            .append_pair("lon", &at.longitude.to_string())
            .append_pair("units", "metric")
            .append_pair("appid", &self.api_key);
        url
    }

    pub async fn current(&self, at: Coordinate) -> Result<Weather, MapError> {
        let response = self
            .client
            .get(self.request_url(at))
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| MapError::fetch(Resource::Weather, e))?;

        if !response.status().is_success() {
            return Err(MapError::fetch(
                Resource::Weather,
                format!("status {}", response.status()),
            ));
        }

        let body: WeatherResponse = response
            .json()
            .await
            .map_err(|e| MapError::fetch(Resource::Weather, e))?;

        let weather = Weather::from(body);
        debug!(%at, ?weather, "Fetched weather");
        Ok(weather)
    }
}
