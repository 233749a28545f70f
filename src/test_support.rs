//! Recording doubles for the collaborator traits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use geo_types::LineString;

use crate::error::{MapError, Resource};
use crate::facilities::FacilitySource;
use crate::models::{Coordinate, Facility, FacilityKind, GeoBbox, Route, Zone};
use crate::routing::{GeocodeCandidate, Geocoder, RouteService};
use crate::surface::{LayerId, MapSurface, Notifier, Severity, Shape};
use crate::zones::ZoneSource;

pub fn zone_at(locality: &str, latitude: f64, longitude: f64) -> Zone {
    Zone {
        locality: locality.to_string(),
        district: "Raipur".to_string(),
        latitude,
        longitude,
        crime_rate_per_100k: 150.0,
        total_crimes: 40,
        safety_level: "Safe".to_string(),
        bar_color: None,
        max_crime_rate: None,
        distance_km: None,
    }
}

/// Everything the core asked the surfaces to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    View(Coordinate, u8),
    FlyTo(Coordinate, u8),
    Layer(LayerId, Vec<Shape>),
    Clear(LayerId),
    Popup(Coordinate, String),
    Panel(String),
    HidePanel,
    Loading(Option<String>),
    Notify(String, Severity),
}

pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
    zoom: Mutex<u8>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            zoom: Mutex::new(13),
        }
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<(String, Severity)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Notify(m, s) => Some((m, s)),
                _ => None,
            })
            .collect()
    }

    pub fn panels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Panel(html) => Some(html),
                _ => None,
            })
            .collect()
    }

    /// Current contents of a layer after replaying every set/clear
    pub fn layer(&self, id: LayerId) -> Vec<Shape> {
        let mut current = Vec::new();
        for event in self.events() {
            match event {
                UiEvent::Layer(l, shapes) if l == id => current = shapes,
                UiEvent::Clear(l) if l == id => current.clear(),
                _ => {}
            }
        }
        current
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl MapSurface for RecordingUi {
    fn zoom(&self) -> u8 {
        *self.zoom.lock().unwrap()
    }

    fn set_view(&self, center: Coordinate, zoom: u8) {
        *self.zoom.lock().unwrap() = zoom;
        self.push(UiEvent::View(center, zoom));
    }

    fn fly_to(&self, center: Coordinate, zoom: u8) {
        *self.zoom.lock().unwrap() = zoom;
        self.push(UiEvent::FlyTo(center, zoom));
    }

    fn set_layer(&self, layer: LayerId, shapes: Vec<Shape>) {
        self.push(UiEvent::Layer(layer, shapes));
    }

    fn clear_layer(&self, layer: LayerId) {
        self.push(UiEvent::Clear(layer));
    }

    fn open_popup(&self, at: Coordinate, html: &str) {
        self.push(UiEvent::Popup(at, html.to_string()));
    }

    fn show_panel(&self, html: &str) {
        self.push(UiEvent::Panel(html.to_string()));
    }

    fn hide_panel(&self) {
        self.push(UiEvent::HidePanel);
    }

    fn set_loading(&self, message: Option<&str>) {
        self.push(UiEvent::Loading(message.map(String::from)));
    }
}

impl Notifier for RecordingUi {
    fn notify(&self, message: &str, severity: Severity) {
        self.push(UiEvent::Notify(message.to_string(), severity));
    }
}

/// Zone source answering from a script of responses; the last one repeats
pub struct ScriptedZones {
    responses: Mutex<VecDeque<Result<Vec<Zone>, MapError>>>,
    last: Mutex<Result<Vec<Zone>, MapError>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedZones {
    pub fn ok(zones: Vec<Zone>) -> Self {
        Self::script(vec![Ok(zones)])
    }

    pub fn script(responses: Vec<Result<Vec<Zone>, MapError>>) -> Self {
        let last = responses
            .last()
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()));
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ZoneSource for ScriptedZones {
    async fn fetch_zones(&self) -> Result<Vec<Zone>, MapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.last.lock().unwrap().clone())
    }
}

pub fn zones_down() -> MapError {
    MapError::fetch(Resource::Zones, "connection refused")
}

/// Facility source returning a fixed answer
pub struct FixedFacilities {
    pub answer: Result<Vec<Facility>, MapError>,
    pub requests: Mutex<Vec<(FacilityKind, GeoBbox)>>,
    delay: Duration,
}

impl FixedFacilities {
    pub fn new(answer: Result<Vec<Facility>, MapError>) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl FacilitySource for FixedFacilities {
    async fn fetch_facilities(
        &self,
        kind: &FacilityKind,
        bbox: &GeoBbox,
    ) -> Result<Vec<Facility>, MapError> {
        self.requests.lock().unwrap().push((kind.clone(), *bbox));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer.clone()
    }
}

/// Geocoder resolving queries from a table, with an optional per-query delay
#[derive(Default)]
pub struct TableGeocoder {
    pub entries: Vec<(String, Coordinate, Duration)>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl TableGeocoder {
    pub fn with(mut self, query: &str, at: Coordinate, delay: Duration) -> Self {
        self.entries.push((query.to_string(), at, delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for TableGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeCandidate>, MapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MapError::fetch(Resource::Geocoding, "503 Service Unavailable"));
        }
        let hit = self
            .entries
            .iter()
            .find(|(q, _, _)| q == query)
            .map(|(_, at, delay)| (*at, *delay));
        match hit {
            Some((at, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(vec![GeocodeCandidate {
                    location: at,
                    display_name: Some(query.to_string()),
                }])
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Router drawing a straight two-point line
#[derive(Default)]
pub struct StraightRouter {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StraightRouter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteService for StraightRouter {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, MapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MapError::fetch(Resource::Route, "NoRoute"));
        }
        Ok(Route {
            origin,
            destination,
            distance_m: origin.distance_to(&destination),
            duration_s: 60.0,
            geometry: LineString::from(vec![
                (origin.longitude, origin.latitude),
                (destination.longitude, destination.latitude),
            ]),
        })
    }
}
