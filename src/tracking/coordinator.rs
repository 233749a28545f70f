//! Per-sample tracking state machine with zone-entry deduplication.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::Sample;
use crate::config::TrackingConfig;
use crate::error::{MapError, SensorError};
use crate::models::{Coordinate, Zone, ZoneKey};
use crate::proximity::match_zone_within;
use crate::render;
use crate::surface::{LayerId, MarkerIcon, Popup, Shape, Ui};
use crate::zones::{ZoneCache, ZoneSource};

const ACCURACY_COLOR: &str = "#136aec";
const ACCURACY_FILL_OPACITY: f64 = 0.15;

/// Last known position and the zone last announced to the user
#[derive(Debug, Clone, PartialEq)]
pub struct LiveLocationState {
    pub last_coordinate: Coordinate,
    pub last_accuracy_m: f64,
    pub last_matched_zone: Option<ZoneKey>,
}

#[derive(Debug, Default)]
enum TrackingState {
    #[default]
    Uninitialized,
    Tracking(LiveLocationState),
}

#[derive(Debug, Default)]
struct Inner {
    tracking: TrackingState,
    /// Zone popup bound to the live marker, kept across marker moves
    marker_popup: Option<String>,
}

/// What a processed sample changed
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    /// This was the first fix of the session
    pub first_fix: bool,
    /// Zone newly entered by this sample (notification shown)
    pub entered: Option<Zone>,
}

/// Consumes location samples, keeps the live marker current and announces a
/// zone once per contiguous dwell.
///
/// Leaving every zone does not reset the announced zone, so coming back into
/// the same zone stays silent; only a different zone is announced again.
/// State is re-read after every suspension point, so a slow sample finishing
/// late acts on whatever later samples left behind.
pub struct LocationCoordinator<Z, U: ?Sized> {
    zones: Arc<ZoneCache<Z>>,
    ui: Arc<U>,
    config: TrackingConfig,
    inner: Mutex<Inner>,
}

impl<Z: ZoneSource, U: Ui + ?Sized> LocationCoordinator<Z, U> {
    pub fn new(zones: Arc<ZoneCache<Z>>, ui: Arc<U>, config: TrackingConfig) -> Self {
        Self {
            zones,
            ui,
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Handle one position fix
    pub async fn on_sample(&self, sample: &Sample) -> SampleOutcome {
        let at = sample.coordinate;
        let accuracy = sample.accuracy_or(self.config.default_accuracy_m);

        let (first_fix, popup) = {
            let mut inner = self.inner();
            let first_fix = match &mut inner.tracking {
                TrackingState::Tracking(state) => {
                    state.last_coordinate = at;
                    state.last_accuracy_m = accuracy;
                    false
                }
                TrackingState::Uninitialized => {
                    inner.tracking = TrackingState::Tracking(LiveLocationState {
                        last_coordinate: at,
                        last_accuracy_m: accuracy,
                        last_matched_zone: None,
                    });
                    true
                }
            };
            (first_fix, inner.marker_popup.clone())
        };

        if first_fix {
            info!(%at, accuracy, "First position fix");
        } else {
            debug!(%at, accuracy, "Position update");
        }

        self.ui
            .set_view(at, self.ui.zoom().max(self.config.tracking_zoom));
        self.ui
            .set_layer(LayerId::LiveMarker, vec![live_marker(at, popup.map(Popup::closed))]);
        self.ui.set_layer(
            LayerId::Accuracy,
            vec![Shape::Circle {
                center: at,
                radius_m: accuracy,
                color: ACCURACY_COLOR.to_string(),
                fill_opacity: ACCURACY_FILL_OPACITY,
                popup: None,
            }],
        );

        let zones = self.zones.get_zones(&*self.ui).await;
        let entered = match match_zone_within(&at, &zones, self.config.zone_radius_m) {
            Some(zone) => self.enter(zone),
            None => None,
        };

        SampleOutcome { first_fix, entered }
    }

    /// Record `zone` as current; shows it unless it was already announced
    fn enter(&self, zone: &Zone) -> Option<Zone> {
        let key = zone.key();
        let popup_html = render::zone_popup(zone);

        let marker_at = {
            let mut inner = self.inner();
            let TrackingState::Tracking(state) = &mut inner.tracking else {
                return None;
            };
            if state.last_matched_zone.as_ref() == Some(&key) {
                debug!(zone = %key, "Still inside announced zone");
                return None;
            }
            state.last_matched_zone = Some(key.clone());
            let marker_at = state.last_coordinate;
            inner.marker_popup = Some(popup_html.clone());
            marker_at
        };

        info!(
            zone = %key,
            rate = zone.crime_rate_per_100k,
            safety = %zone.safety_level,
            "Entered zone"
        );
        self.ui.show_panel(&render::info_panel(zone));
        self.ui.set_layer(
            LayerId::LiveMarker,
            vec![live_marker(marker_at, Some(Popup::opened(popup_html)))],
        );
        Some(zone.clone())
    }

    /// Handle a sensor failure. The live state is left untouched.
    pub fn on_sensor_error(&self, error: SensorError) -> MapError {
        warn!("Location error: {}", error);
        let err = MapError::Sensor(error);
        self.ui.notify(&err.user_message(), err.severity());

        if self.current_position().is_none() {
            self.ui
                .set_view(self.config.fallback_center, self.config.fallback_zoom);
        }
        err
    }

    /// The device cannot provide positions at all
    pub fn on_sensor_unavailable(&self) -> MapError {
        warn!("Location sensor unavailable");
        let err = MapError::SensorUnavailable;
        self.ui.notify(&err.user_message(), err.severity());
        err
    }

    /// Whether a sample was already older than the configured maximum age
    /// when the sensor delivered it
    pub fn is_stale(&self, sample: &Sample, delivered_at: DateTime<Utc>) -> bool {
        sample.age(delivered_at) > self.config.max_age()
    }

    pub fn current_position(&self) -> Option<Coordinate> {
        self.state().map(|s| s.last_coordinate)
    }

    pub fn state(&self) -> Option<LiveLocationState> {
        match &self.inner().tracking {
            TrackingState::Uninitialized => None,
            TrackingState::Tracking(state) => Some(state.clone()),
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn live_marker(at: Coordinate, popup: Option<Popup>) -> Shape {
    Shape::Marker {
        at,
        icon: MarkerIcon::User,
        popup,
    }
}
