//! Route requests with single-flight replacement of the route overlay.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Geocoder, RouteService};
use crate::error::{Lookup, MapError};
use crate::models::{Coordinate, Route, RouteSession};
use crate::surface::{LayerId, Severity, Shape, Ui};

const ROUTE_COLOR: &str = "blue";
const ROUTE_WEIGHT: f64 = 5.0;
const ROUTE_OPACITY: f64 = 0.7;

#[derive(Default)]
struct RouteState {
    /// Request in flight, if any; anything else still in flight is stale
    latest: Option<Uuid>,
    /// Request whose overlay is on the map
    active: Option<RouteSession>,
}

/// Resolves a typed destination and keeps at most one route overlay on the map.
///
/// A new request supersedes every request started before it: an older request
/// that resolves later is dropped without touching the display. The previous
/// overlay is removed right before the new one is drawn, so a failed request
/// leaves the last good route in place and never a partial one.
pub struct RouteOrchestrator<G, R, U: ?Sized> {
    geocoder: G,
    router: R,
    ui: Arc<U>,
    state: Mutex<RouteState>,
}

impl<G: Geocoder, R: RouteService, U: Ui + ?Sized> RouteOrchestrator<G, R, U> {
    pub fn new(geocoder: G, router: R, ui: Arc<U>) -> Self {
        Self {
            geocoder,
            router,
            ui,
            state: Mutex::new(RouteState::default()),
        }
    }

    /// Route from `origin` to whatever `destination_text` geocodes to.
    pub async fn request_route(
        &self,
        destination_text: &str,
        origin: Option<Coordinate>,
    ) -> Result<RouteSession, MapError> {
        let place = destination_text.trim();
        let origin = match (place.is_empty(), origin) {
            (true, _) => return Err(self.report(MapError::EmptyInput)),
            (false, None) => return Err(self.report(MapError::OriginNotReady)),
            (false, Some(origin)) => origin,
        };

        let mut session = RouteSession::new(origin, place);
        self.state().latest = Some(session.id);
        debug!(id = %session.id, place, "Route request started");

        self.ui.set_loading(Some(&format!("Finding route to {}…", place)));
        let result = self.resolve(&mut session).await;

        match result {
            Ok(route) => {
                let mut state = self.state();
                if state.latest != Some(session.id) {
                    debug!(id = %session.id, "Dropping superseded route");
                    return Err(MapError::Superseded);
                }
                state.latest = None;

                if let Some(previous) = state.active.take() {
                    debug!(id = %previous.id, "Removing previous route overlay");
                    self.ui.clear_layer(LayerId::Route);
                }
                self.ui.set_layer(LayerId::Route, vec![route_shape(&route)]);
                session.active = true;
                state.active = Some(session.clone());
                drop(state);

                self.ui.set_loading(None);
                info!(
                    place,
                    distance_m = route.distance_m,
                    duration_s = route.duration_s,
                    "Route loaded"
                );
                self.ui.notify("Route loaded successfully!", Severity::Success);
                Ok(session)
            }
            Err(e) => {
                {
                    let mut state = self.state();
                    if state.latest != Some(session.id) {
                        debug!(id = %session.id, "Superseded route request failed: {}", e);
                        return Err(MapError::Superseded);
                    }
                    state.latest = None;
                }
                self.ui.set_loading(None);
                Err(self.report(e))
            }
        }
    }

    /// Session whose overlay is currently shown
    pub fn active(&self) -> Option<RouteSession> {
        self.state().active.clone()
    }

    /// Remove the overlay and discard any request in flight
    pub fn clear(&self) {
        let mut state = self.state();
        if let Some(id) = state.latest.take() {
            debug!(%id, "Route request cancelled");
            self.ui.set_loading(None);
        }
        if state.active.take().is_some() {
            self.ui.clear_layer(LayerId::Route);
        }
    }

    async fn resolve(&self, session: &mut RouteSession) -> Result<Route, MapError> {
        let candidates = self.geocoder.geocode(&session.destination_query).await?;
        let destination = candidates
            .into_iter()
            .next()
            .map(|c| c.location)
            .ok_or_else(|| {
                MapError::NoResultsFound(Lookup::Destination(session.destination_query.clone()))
            })?;
        session.resolved_destination = Some(destination);

        self.router.route(session.origin, destination).await
    }

    fn report(&self, e: MapError) -> MapError {
        warn!("Route request failed: {}", e);
        self.ui.notify(&e.user_message(), e.severity());
        e
    }

    fn state(&self) -> MutexGuard<'_, RouteState> {
        // State is plain data; a panic elsewhere cannot leave it half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn route_shape(route: &Route) -> Shape {
    Shape::Path {
        points: route.path(),
        color: ROUTE_COLOR.to_string(),
        weight: ROUTE_WEIGHT,
        opacity: ROUTE_OPACITY,
    }
}
