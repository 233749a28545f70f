//! "Find the nearest X" workflow.

use std::sync::Arc;

use tracing::{info, warn};

use super::FacilitySource;
use crate::error::{Lookup, MapError};
use crate::models::{Coordinate, Facility, FacilityKind, GeoBbox};
use crate::proximity::find_nearest;
use crate::render;
use crate::surface::{LayerId, MarkerIcon, Popup, Severity, Shape, Ui};

/// Zoom used when flying to a facility, unless the map is already closer
const FACILITY_ZOOM: u8 = 15;

/// Queries facilities of one kind inside the city bounds and shows the closest.
pub struct FacilityLocator<F, U: ?Sized> {
    source: F,
    ui: Arc<U>,
    bbox: GeoBbox,
}

impl<F: FacilitySource, U: Ui + ?Sized> FacilityLocator<F, U> {
    pub fn new(source: F, ui: Arc<U>, bbox: GeoBbox) -> Self {
        Self { source, ui, bbox }
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    /// Find and display the facility of `kind` closest to `origin`.
    ///
    /// Every failure is reported through exactly one notification and also
    /// returned to the caller.
    pub async fn locate_nearest(
        &self,
        origin: Option<Coordinate>,
        kind: &FacilityKind,
    ) -> Result<(Facility, f64), MapError> {
        let result = self.locate(origin, kind).await;
        if let Err(ref e) = result {
            warn!(%kind, "Nearest facility lookup failed: {}", e);
            self.ui.notify(&e.user_message(), e.severity());
        }
        result
    }

    async fn locate(
        &self,
        origin: Option<Coordinate>,
        kind: &FacilityKind,
    ) -> Result<(Facility, f64), MapError> {
        let origin = origin.ok_or(MapError::OriginNotReady)?;

        self.ui.clear_layer(LayerId::Facilities);
        self.ui
            .set_loading(Some(&format!("Finding nearest {}…", kind.label())));
        let fetched = self.source.fetch_facilities(kind, &self.bbox).await;
        self.ui.set_loading(None);
        let candidates = fetched?;

        let nearest = find_nearest(&origin, &candidates)
            .ok_or_else(|| MapError::NoResultsFound(Lookup::Facility(kind.clone())))?;
        let facility = nearest.item.clone();
        let distance_m = nearest.distance_m;

        info!(
            %kind,
            name = %facility.display_name(),
            distance_m,
            candidates = candidates.len(),
            "Nearest facility found"
        );

        self.ui.set_layer(
            LayerId::Facilities,
            vec![Shape::Marker {
                at: facility.location,
                icon: MarkerIcon::Facility(kind.clone()),
                popup: Some(Popup::closed(render::facility_popup(&facility, distance_m))),
            }],
        );
        self.ui
            .fly_to(facility.location, self.ui.zoom().max(FACILITY_ZOOM));
        self.ui.notify(
            &format!("Nearest {} located.", kind.label()),
            Severity::Success,
        );

        Ok((facility, distance_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Resource;
    use crate::test_support::{FixedFacilities, RecordingUi, UiEvent};

    fn bbox() -> GeoBbox {
        GeoBbox::new(21.15, 81.60, 21.30, 81.65)
    }

    fn hospital(name: &str, lat: f64, lon: f64) -> Facility {
        Facility {
            location: Coordinate::new(lat, lon),
            kind: FacilityKind::Hospital,
            name: Some(name.to_string()),
        }
    }

    #[tokio::test]
    async fn test_nearest_displayed() {
        let ui = Arc::new(RecordingUi::new());
        let source = FixedFacilities::new(Ok(vec![
            hospital("Far", 21.29, 81.64),
            hospital("Near", 21.251, 81.63),
            hospital("Mid", 21.27, 81.63),
        ]));
        let locator = FacilityLocator::new(source, Arc::clone(&ui), bbox());

        let (facility, distance) = locator
            .locate_nearest(Some(Coordinate::new(21.25, 81.63)), &FacilityKind::Hospital)
            .await
            .unwrap();

        assert_eq!(facility.name.as_deref(), Some("Near"));
        assert!(distance < 200.0);
        assert_eq!(ui.layer(LayerId::Facilities).len(), 1);
        assert_eq!(
            ui.notifications(),
            vec![("Nearest hospital located.".to_string(), Severity::Success)]
        );
        assert!(ui
            .events()
            .contains(&UiEvent::FlyTo(Coordinate::new(21.251, 81.63), 15)));
        assert_eq!(
            locator.source.requests.lock().unwrap().as_slice(),
            &[(FacilityKind::Hospital, bbox())]
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let ui = Arc::new(RecordingUi::new());
        let locator = FacilityLocator::new(FixedFacilities::new(Ok(vec![])), Arc::clone(&ui), bbox());

        let err = locator
            .locate_nearest(Some(Coordinate::new(21.25, 81.63)), &FacilityKind::FireStation)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            MapError::NoResultsFound(Lookup::Facility(FacilityKind::FireStation))
        );
        assert_eq!(
            ui.notifications(),
            vec![("No fire station found in the city.".to_string(), Severity::Warn)]
        );
        assert!(ui.layer(LayerId::Facilities).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let ui = Arc::new(RecordingUi::new());
        let source = FixedFacilities::new(Err(MapError::fetch(Resource::Facilities, "timeout")));
        let locator = FacilityLocator::new(source, Arc::clone(&ui), bbox());

        let err = locator
            .locate_nearest(Some(Coordinate::new(21.25, 81.63)), &FacilityKind::Police)
            .await
            .unwrap_err();

        assert!(matches!(err, MapError::FetchFailed { .. }));
        assert_eq!(
            ui.notifications(),
            vec![("Unable to load facilities right now.".to_string(), Severity::Error)]
        );
        assert_eq!(ui.events().last(), Some(&UiEvent::Notify(
            "Unable to load facilities right now.".to_string(),
            Severity::Error
        )));
    }

    #[tokio::test]
    async fn test_requires_live_position() {
        let ui = Arc::new(RecordingUi::new());
        let locator = FacilityLocator::new(FixedFacilities::new(Ok(vec![])), Arc::clone(&ui), bbox());

        let err = locator
            .locate_nearest(None, &FacilityKind::Hospital)
            .await
            .unwrap_err();

        assert_eq!(err, MapError::OriginNotReady);
        assert!(locator.source.requests.lock().unwrap().is_empty());
        assert_eq!(ui.notifications().len(), 1);
    }
}
