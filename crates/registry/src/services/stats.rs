//! System statistics bookkeeping.
//!
//! Counters live on the settings singleton and are refreshed after every
//! successful location insert. Bookkeeping is best effort: a failure is
//! logged and never reaches the caller of the insert.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::db::{LocationStore, RepositoryError, SettingsStore};
use crate::models::{Location, SystemStats};

/// Errors that can occur while refreshing the counters.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Reading the count or writing the settings failed.
    #[error("failed to update system stats: {0}")]
    Repository(#[from] RepositoryError),
}

/// Refresh the counters after `location` was stored.
///
/// `total_locations` is recounted from the store rather than incremented, so
/// a missed update heals on the next insert. The count is taken inside the
/// settings update, so concurrent inserts cannot leave a stale total behind.
///
/// # Errors
///
/// Returns [`StatsError`] if the store cannot be read or written.
pub fn record_insert<S>(
    store: &S,
    location: &Location,
    now: DateTime<Utc>,
) -> Result<SystemStats, StatsError>
where
    S: LocationStore + SettingsStore + ?Sized,
{
    let settings = store.update_settings(&mut |settings| {
        let stats = &mut settings.stats;
        stats.total_locations = store.count()?;
        if stats.first_location_created_at.is_none() {
            stats.first_location_created_at = Some(location.created_at);
        }
        stats.system_initialized = true;
        stats.last_sync_at = Some(now);
        Ok(())
    })?;
    Ok(settings.stats)
}

/// Best-effort wrapper around [`record_insert`].
///
/// Returns the new counters, or `None` after logging a warning.
#[instrument(skip_all, fields(code = ?location.code))]
pub fn update_system_stats<S>(store: &S, location: &Location) -> Option<SystemStats>
where
    S: LocationStore + SettingsStore + ?Sized,
{
    match record_insert(store, location, Utc::now()) {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(error = %e, "System stats update failed; location insert kept");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tech_store_core::{LocationCode, LocationType};

    use super::*;
    use crate::db::{LocationFilter, MemoryStore};
    use crate::models::StoreSettings;

    fn warehouse(code: &str) -> Location {
        let mut location = Location::new(LocationType::Warehouse, Utc::now());
        location.code = Some(LocationCode::parse(code).unwrap());
        location
    }

    /// Store whose settings can be read but never written.
    struct ReadOnlySettings(MemoryStore);

    impl LocationStore for ReadOnlySettings {
        fn sibling_segments(
            &self,
            query: &crate::db::SiblingQuery,
        ) -> Result<Vec<String>, RepositoryError> {
            self.0.sibling_segments(query)
        }
        fn exists(&self, code: &LocationCode) -> Result<bool, RepositoryError> {
            self.0.exists(code)
        }
        fn get(&self, code: &LocationCode) -> Result<Option<Location>, RepositoryError> {
            self.0.get(code)
        }
        fn insert(&self, location: Location) -> Result<Location, RepositoryError> {
            self.0.insert(location)
        }
        fn update(&self, location: Location) -> Result<Location, RepositoryError> {
            self.0.update(location)
        }
        fn list(&self, filter: &LocationFilter) -> Result<Vec<Location>, RepositoryError> {
            self.0.list(filter)
        }
        fn delete(&self, code: &LocationCode) -> Result<Location, RepositoryError> {
            self.0.delete(code)
        }
        fn count(&self) -> Result<u64, RepositoryError> {
            self.0.count()
        }
    }

    impl SettingsStore for ReadOnlySettings {
        fn settings(&self) -> Result<StoreSettings, RepositoryError> {
            self.0.settings()
        }
        fn save_settings(&self, _: &StoreSettings) -> Result<(), RepositoryError> {
            Err(RepositoryError::Backend("settings are read-only".to_owned()))
        }
        fn update_settings(
            &self,
            _: &mut dyn FnMut(&mut StoreSettings) -> Result<(), RepositoryError>,
        ) -> Result<StoreSettings, RepositoryError> {
            Err(RepositoryError::Backend("settings are read-only".to_owned()))
        }
    }

    #[test]
    fn test_first_insert_initializes_system() {
        let store = MemoryStore::new();
        let first = store.insert(warehouse("WH-1")).unwrap();

        let stats = record_insert(&store, &first, Utc::now()).unwrap();
        assert_eq!(stats.total_locations, 1);
        assert!(stats.system_initialized);
        assert_eq!(stats.first_location_created_at, Some(first.created_at));
        assert!(stats.last_sync_at.is_some());
        assert_eq!(store.settings().unwrap().stats, stats);
    }

    #[test]
    fn test_later_inserts_keep_first_timestamp() {
        let store = MemoryStore::new();
        let first = store.insert(warehouse("WH-1")).unwrap();
        record_insert(&store, &first, Utc::now()).unwrap();

        let second = store.insert(warehouse("WH-2")).unwrap();
        let stats = record_insert(&store, &second, Utc::now()).unwrap();
        assert_eq!(stats.total_locations, 2);
        assert_eq!(stats.first_location_created_at, Some(first.created_at));
    }

    #[test]
    fn test_total_is_recounted() {
        let store = MemoryStore::new();
        store.insert(warehouse("WH-1")).unwrap();
        let second = store.insert(warehouse("WH-2")).unwrap();

        // The first insert was never recorded.
        let stats = record_insert(&store, &second, Utc::now()).unwrap();
        assert_eq!(stats.total_locations, 2);
    }

    #[test]
    fn test_concurrent_records_keep_final_total() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (1..=16)
            .map(|n| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let location = store.insert(warehouse(&format!("WH-{n}"))).unwrap();
                    record_insert(store.as_ref(), &location, Utc::now()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.settings().unwrap().stats.total_locations, 16);
    }

    #[test]
    fn test_stats_update_keeps_other_settings() {
        let store = MemoryStore::new();
        let mut settings = store.settings().unwrap();
        settings.behavior.allow_manual_override = true;
        store.save_settings(&settings).unwrap();

        let location = store.insert(warehouse("WH-1")).unwrap();
        record_insert(&store, &location, Utc::now()).unwrap();

        let stored = store.settings().unwrap();
        assert!(stored.behavior.allow_manual_override);
        assert_eq!(stored.stats.total_locations, 1);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let store = ReadOnlySettings(MemoryStore::new());
        let location = store.insert(warehouse("WH-1")).unwrap();

        assert!(record_insert(&store, &location, Utc::now()).is_err());
        assert_eq!(update_system_stats(&store, &location), None);
        assert!(store.exists(&LocationCode::parse("WH-1").unwrap()).unwrap());
    }
}
