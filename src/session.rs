//! The map session: one explicit object owning every live component.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::channel::{mpsc, oneshot};
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, MapConfig};
use crate::error::{MapError, SensorError};
use crate::facilities::{FacilityLocator, FacilitySource, OverpassClient};
use crate::models::{Coordinate, Facility, FacilityKind, RouteSession};
use crate::render;
use crate::routing::{Geocoder, NominatimGeocoder, OsrmRouter, RouteOrchestrator, RouteService};
use crate::surface::{LayerId, Popup, Shape, Ui};
use crate::tracking::{LocationCoordinator, SensorEvent, SensorSource};
use crate::weather::{Weather, WeatherClient};
use crate::zones::{HttpZoneSource, ZoneCache, ZoneSource};

const ZONE_FILL_OPACITY: f64 = 0.25;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Session wired to the public HTTP services
pub type HttpMapSession<U> =
    MapSession<HttpZoneSource, OverpassClient, NominatimGeocoder, OsrmRouter, U>;

/// Live tracking, zone alerts, facility search, routing and weather for one
/// user.
///
/// All operations take `&self`, so sensor processing and user commands can run
/// concurrently on the same session.
pub struct MapSession<Z, F, G, R, U: ?Sized> {
    ui: Arc<U>,
    map: MapConfig,
    zones: Arc<ZoneCache<Z>>,
    coordinator: LocationCoordinator<Z, U>,
    facilities: FacilityLocator<F, U>,
    routes: RouteOrchestrator<G, R, U>,
    weather: Option<WeatherClient>,
    startup_kind: Option<FacilityKind>,
}

impl<U: Ui + ?Sized> HttpMapSession<U> {
    /// Build a session talking to the services named in `config`
    pub fn from_config(config: &ClientConfig, ui: Arc<U>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.server.user_agent.as_str())
            .connect_timeout(CONNECT_TIMEOUT)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        let zones = HttpZoneSource::new(client.clone(), &config.server.base_url)
            .context("Invalid zone server URL")?;
        let overpass = OverpassClient::new(client.clone(), &config.facilities.overpass_url)
            .context("Invalid Overpass URL")?;
        let geocoder = NominatimGeocoder::new(client.clone(), &config.routing.nominatim_url)
            .context("Invalid Nominatim URL")?;
        let router =
            OsrmRouter::new(client.clone(), &config.routing.osrm_url).context("Invalid OSRM URL")?;

        let mut session = MapSession::new(config, ui, zones, overpass, geocoder, router);
        match &config.weather.api_key {
            Some(key) if !key.is_empty() => {
                let weather = WeatherClient::new(client, &config.weather.url, key.as_str())
                    .context("Invalid weather URL")?;
                session = session.with_weather(weather);
            }
            _ => info!("No weather API key configured, weather disabled"),
        }
        Ok(session)
    }
}

impl<Z, F, G, R, U> MapSession<Z, F, G, R, U>
where
    Z: ZoneSource,
    F: FacilitySource,
    G: Geocoder,
    R: RouteService,
    U: Ui + ?Sized,
{
    pub fn new(config: &ClientConfig, ui: Arc<U>, zones: Z, facilities: F, geocoder: G, router: R) -> Self {
        let zones = Arc::new(ZoneCache::new(zones));
        Self {
            map: config.map.clone(),
            coordinator: LocationCoordinator::new(
                Arc::clone(&zones),
                Arc::clone(&ui),
                config.tracking.clone(),
            ),
            facilities: FacilityLocator::new(facilities, Arc::clone(&ui), config.facilities.bbox),
            routes: RouteOrchestrator::new(geocoder, router, Arc::clone(&ui)),
            weather: None,
            startup_kind: config.facilities.startup_kind(),
            zones,
            ui,
        }
    }

    pub fn with_weather(mut self, weather: WeatherClient) -> Self {
        self.weather = Some(weather);
        self
    }

    /// Initial view plus the zone overview layer
    pub async fn start(&self) -> usize {
        self.ui
            .set_view(self.map.initial_center, self.map.initial_zoom);
        self.draw_zones().await
    }

    /// Consume the sensor until its stream ends.
    ///
    /// Waits longer than the configured timeout count as sensor errors; samples
    /// that were older than the maximum age when delivered are skipped. Errors
    /// never stop the loop. The first-fix lookups run alongside sample
    /// processing.
    pub async fn track<S: SensorSource + ?Sized>(&self, sensor: &S) -> Result<(), MapError> {
        let mut stream = match sensor.subscribe() {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Sensor subscription failed: {}", e);
                return Err(self.coordinator.on_sensor_unavailable());
            }
        };
        let timeout = self.coordinator.config().timeout();
        info!(?timeout, "Tracking started");

        // Events are stamped on arrival, so time spent processing earlier
        // samples never ages the ones queued behind them
        let (tx, mut rx) = mpsc::unbounded::<(SensorEvent, DateTime<Utc>)>();
        let (fix_tx, fix_rx) = oneshot::channel::<()>();

        let receive = async move {
            loop {
                let event = match tokio::time::timeout(timeout, stream.next()).await {
                    Ok(Some(event)) => event,
                    Ok(None) => break,
                    Err(_) => Err(SensorError::Timeout),
                };
                if tx.unbounded_send((event, Utc::now())).is_err() {
                    break;
                }
            }
        };

        let process = async {
            let mut fix_tx = Some(fix_tx);
            while let Some((event, delivered_at)) = rx.next().await {
                match event {
                    Ok(sample) if self.coordinator.is_stale(&sample, delivered_at) => {
                        debug!(at = %sample.coordinate, "Dropping stale sample");
                    }
                    Ok(sample) => {
                        let outcome = self.coordinator.on_sample(&sample).await;
                        if outcome.first_fix {
                            if let Some(tx) = fix_tx.take() {
                                let _ = tx.send(());
                            }
                        }
                    }
                    Err(e) => {
                        self.coordinator.on_sensor_error(e);
                    }
                }
            }
        };

        let startup = async {
            if fix_rx.await.is_ok() {
                self.on_first_fix().await;
            }
        };

        tokio::join!(receive, process, startup);

        info!("Sensor stream ended");
        Ok(())
    }

    async fn on_first_fix(&self) {
        if let Some(kind) = &self.startup_kind {
            // Failures were already reported to the user
            let _ = self.locate_nearest(kind).await;
        }
        let _ = self.show_weather().await;
    }

    /// Zone overview: one circle per zone, coloured by risk band
    pub async fn draw_zones(&self) -> usize {
        let zones = self.zones.get_zones(&*self.ui).await;
        let radius_m = self.coordinator.config().zone_radius_m;
        let circles: Vec<Shape> = zones
            .iter()
            .map(|zone| Shape::Circle {
                center: zone.center(),
                radius_m,
                color: zone.risk_band().zone_color().to_string(),
                fill_opacity: ZONE_FILL_OPACITY,
                popup: Some(Popup::closed(render::zone_circle_popup(zone))),
            })
            .collect();
        let count = circles.len();
        self.ui.set_layer(LayerId::Zones, circles);
        debug!(count, "Zone overview drawn");
        count
    }

    pub async fn locate_nearest(&self, kind: &FacilityKind) -> Result<(Facility, f64), MapError> {
        self.facilities
            .locate_nearest(self.coordinator.current_position(), kind)
            .await
    }

    pub async fn request_route(&self, destination: &str) -> Result<RouteSession, MapError> {
        self.routes
            .request_route(destination, self.coordinator.current_position())
            .await
    }

    pub fn clear_route(&self) {
        self.routes.clear();
    }

    /// Dismiss the zone info panel
    pub fn close_panel(&self) {
        self.ui.hide_panel();
    }

    /// Current conditions in a popup at the user's position. Does nothing
    /// without a weather client.
    pub async fn show_weather(&self) -> Result<Option<Weather>, MapError> {
        let Some(client) = &self.weather else {
            debug!("Weather disabled");
            return Ok(None);
        };

        let result = match self.coordinator.current_position() {
            Some(at) => client.current(at).await.map(|w| (at, w)),
            None => Err(MapError::OriginNotReady),
        };

        match result {
            Ok((at, weather)) => {
                self.ui.open_popup(at, &render::weather_popup(&weather));
                Ok(Some(weather))
            }
            Err(e) => {
                warn!("Weather lookup failed: {}", e);
                self.ui.notify(&e.user_message(), e.severity());
                Err(e)
            }
        }
    }

    pub fn current_position(&self) -> Option<Coordinate> {
        self.coordinator.current_position()
    }

    pub fn coordinator(&self) -> &LocationCoordinator<Z, U> {
        &self.coordinator
    }

    pub fn routes(&self) -> &RouteOrchestrator<G, R, U> {
        &self.routes
    }
}
