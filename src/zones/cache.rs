//! Process-wide memoized zone set.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use super::ZoneSource;
use crate::error::MapError;
use crate::models::Zone;
use crate::surface::Ui;

/// Lazily loads the zone set once and shares it with every consumer.
///
/// Only a non-empty, successfully fetched set is stored; after a failure or an
/// empty answer the next call fetches again. The slot lock is held across the
/// fetch, so concurrent first calls wait on a single request instead of racing.
pub struct ZoneCache<S> {
    source: S,
    zones: Mutex<Option<Arc<Vec<Zone>>>>,
}

impl<S: ZoneSource> ZoneCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            zones: Mutex::new(None),
        }
    }

    /// Cached set, fetching it on first use
    pub async fn try_get_zones(&self) -> Result<Arc<Vec<Zone>>, MapError> {
        let mut slot = self.zones.lock().await;
        if let Some(zones) = slot.as_ref() {
            return Ok(Arc::clone(zones));
        }

        let zones = Arc::new(self.source.fetch_zones().await?);
        if zones.is_empty() {
            info!("Zone source returned an empty set, not caching");
        } else {
            info!("Cached {} zones", zones.len());
            *slot = Some(Arc::clone(&zones));
        }
        Ok(zones)
    }

    /// Like [`try_get_zones`](Self::try_get_zones), but failures become an
    /// empty set plus one error notification.
    pub async fn get_zones<U: Ui + ?Sized>(&self, ui: &U) -> Arc<Vec<Zone>> {
        if let Some(zones) = self.cached().await {
            return zones;
        }

        ui.set_loading(Some("Loading zones…"));
        let result = self.try_get_zones().await;
        ui.set_loading(None);

        match result {
            Ok(zones) => zones,
            Err(e) => {
                error!("Failed to fetch zones: {}", e);
                ui.notify(&e.user_message(), e.severity());
                Arc::new(Vec::new())
            }
        }
    }

    /// Stored set, if any, without fetching
    pub async fn cached(&self) -> Option<Arc<Vec<Zone>>> {
        self.zones.lock().await.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Severity;
    use crate::test_support::{zone_at, zones_down, RecordingUi, ScriptedZones, UiEvent};
    use std::time::Duration;

    #[tokio::test]
    async fn test_single_fetch_and_same_instance() {
        let cache = ZoneCache::new(ScriptedZones::ok(vec![zone_at("A", 21.25, 81.63)]));
        let ui = RecordingUi::new();

        let first = cache.get_zones(&ui).await;
        let second = cache.get_zones(&ui).await;
        let third = cache.try_get_zones().await.unwrap();

        assert_eq!(cache.source().calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(first.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_notifies_and_retries() {
        let cache = ZoneCache::new(ScriptedZones::script(vec![
            Err(zones_down()),
            Ok(vec![zone_at("A", 21.25, 81.63)]),
        ]));
        let ui = RecordingUi::new();

        let zones = cache.get_zones(&ui).await;
        assert!(zones.is_empty());
        assert_eq!(
            ui.notifications(),
            vec![("Failed to load zones.".to_string(), Severity::Error)]
        );
        assert!(cache.cached().await.is_none());

        let zones = cache.get_zones(&ui).await;
        assert_eq!(zones.len(), 1);
        assert_eq!(cache.source().calls(), 2);
        assert_eq!(ui.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_answer_not_cached() {
        let cache = ZoneCache::new(ScriptedZones::ok(Vec::new()));
        let ui = RecordingUi::new();

        assert!(cache.get_zones(&ui).await.is_empty());
        assert!(cache.get_zones(&ui).await.is_empty());
        assert_eq!(cache.source().calls(), 2);
        assert!(ui.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_loading_indicator_only_while_fetching() {
        let cache = ZoneCache::new(ScriptedZones::ok(vec![zone_at("A", 21.25, 81.63)]));
        let ui = RecordingUi::new();

        cache.get_zones(&ui).await;
        cache.get_zones(&ui).await;

        assert_eq!(
            ui.events(),
            vec![
                UiEvent::Loading(Some("Loading zones…".to_string())),
                UiEvent::Loading(None),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_one_fetch() {
        let source = ScriptedZones::ok(vec![zone_at("A", 21.25, 81.63)])
            .with_delay(Duration::from_millis(20));
        let cache = ZoneCache::new(source);

        let (a, b) = tokio::join!(cache.try_get_zones(), cache.try_get_zones());

        assert_eq!(cache.source().calls(), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }
}
