//! Location service: the insert and save pipelines.
//!
//! # Insert
//!
//! 1. Hierarchy validation (fail fast)
//! 2. Ancestor fill-in from the parent record
//! 3. Code assignment (segment allocation within the parent scope)
//! 4. Uniqueness check on the resolved code
//! 5. Display name
//! 6. Atomic insert; on a key conflict for an allocated segment, retry from 3
//!    while the sibling set keeps moving
//! 7. Statistics (best effort)
//!
//! # Save
//!
//! Code, type, segment and ancestry are frozen at insert. A save only
//! changes mutable fields and regenerates the display name.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use tech_store_core::{LocationCode, LocationType, compose_code};

use super::code_builder::{assign_code, build_display_name, fill_ancestry, next_segment_name};
use super::hierarchy::{validate_hierarchy, validate_uniqueness};
use super::stats::update_system_stats;
use crate::db::{LocationFilter, LocationStore, RepositoryError, SettingsStore};
use crate::error::{RegistryError, ValidationError};
use crate::models::{Location, NewLocation, StoreSettings, SystemStats};

/// Allocation attempts used when none are configured.
pub const DEFAULT_ALLOCATION_ATTEMPTS: u8 = 3;

/// The next segment and code a location would receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPreview {
    pub segment: String,
    pub code: String,
}

/// Outcome of one pass through the insert pipeline.
enum Attempt {
    Stored(Location),
    /// An allocated code was already taken.
    Collided(LocationCode),
}

/// Location service over a record store.
pub struct LocationService<S> {
    store: Arc<S>,
    allocation_attempts: u8,
}

impl<S> Clone for LocationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            allocation_attempts: self.allocation_attempts,
        }
    }
}

impl<S> LocationService<S>
where
    S: LocationStore + SettingsStore,
{
    /// Create a new location service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            store,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
        }
    }

    /// Set how many times an allocated code may collide before giving up.
    #[must_use]
    pub fn with_allocation_attempts(mut self, attempts: u8) -> Self {
        self.allocation_attempts = attempts.max(1);
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read the settings singleton.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn settings(&self) -> Result<StoreSettings, RegistryError> {
        Ok(self.store.settings()?)
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Validate a new location and assign its code and display name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the hierarchy is invalid, no code can be
    /// resolved, or the resolved code is taken.
    pub fn on_before_insert(
        &self,
        location: &mut Location,
        settings: &StoreSettings,
    ) -> Result<(), RegistryError> {
        let store = self.store.as_ref();

        validate_hierarchy(store, location, &settings.behavior)?;
        fill_ancestry(store, location)?;
        assign_code(store, location, settings)?;

        let code = location
            .code
            .as_ref()
            .ok_or(ValidationError::ManualCodeRequired)?;
        validate_uniqueness(store, code, &settings.behavior)?;

        location.display_name = build_display_name(store, location)?;
        Ok(())
    }

    /// Record the side effects of a stored location.
    ///
    /// Never fails; see [`update_system_stats`].
    pub fn on_after_insert(&self, location: &Location) -> Option<SystemStats> {
        update_system_stats(self.store.as_ref(), location)
    }

    /// Regenerate the display name before an update is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if an ancestor cannot be read.
    pub fn on_before_save(&self, location: &mut Location) -> Result<(), RegistryError> {
        location.display_name = build_display_name(self.store.as_ref(), location)?;
        location.updated_at = Utc::now();
        Ok(())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Create a location through the full insert pipeline.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid input,
    /// [`ValidationError::DuplicateCode`] if the allocated code is held by a
    /// record that allocation cannot see (such as a manual code without a
    /// segment), [`RegistryError::AllocationExhausted`] if every allocated
    /// code collided with a concurrent insert, or a repository error.
    #[instrument(skip(self, new), fields(location_type = %new.location_type, parent = ?new.parent))]
    pub fn create(&self, new: NewLocation) -> Result<Location, RegistryError> {
        let settings = self.settings()?;
        let allocated = allocates_segment(&new, &settings);
        let attempts = if allocated { self.allocation_attempts } else { 1 };

        for attempt in 1..=attempts {
            let location = prepare(&new)?;
            match self.try_insert(location, &settings, allocated)? {
                Attempt::Stored(stored) => {
                    self.on_after_insert(&stored);
                    info!(
                        code = ?stored.code,
                        display_name = %stored.display_name,
                        "Created location"
                    );
                    return Ok(stored);
                }
                Attempt::Collided(code) => {
                    // Same code again means the siblings did not move.
                    let next = self.preview_next_segment(new.location_type, new.parent.as_ref())?;
                    if next.code == code.as_str() {
                        return Err(ValidationError::DuplicateCode(code).into());
                    }
                    warn!(code = %code, attempt, "Allocated code taken concurrently; retrying");
                }
            }
        }

        Err(RegistryError::AllocationExhausted {
            location_type: new.location_type,
            attempts,
        })
    }

    fn try_insert(
        &self,
        mut location: Location,
        settings: &StoreSettings,
        allocated: bool,
    ) -> Result<Attempt, RegistryError> {
        match self.on_before_insert(&mut location, settings) {
            Ok(()) => {}
            Err(RegistryError::Validation(ValidationError::DuplicateCode(code))) if allocated => {
                return Ok(Attempt::Collided(code));
            }
            Err(e) => return Err(e),
        }

        let code = location
            .code
            .clone()
            .ok_or(ValidationError::ManualCodeRequired)?;
        match self.store.insert(location) {
            Ok(stored) => Ok(Attempt::Stored(stored)),
            Err(RepositoryError::Conflict(_)) if allocated => Ok(Attempt::Collided(code)),
            Err(RepositoryError::Conflict(_)) => Err(ValidationError::DuplicateCode(code).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist changes to an existing location.
    ///
    /// Only the description, enabled flag and group flag may change; the
    /// display name is regenerated.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ImmutableField`] if a frozen field changed
    /// or [`RepositoryError::NotFound`] if the location does not exist.
    #[instrument(skip(self, location), fields(code = ?location.code))]
    pub fn save(&self, mut location: Location) -> Result<Location, RegistryError> {
        let code = location.code.clone().ok_or(RepositoryError::NotFound)?;
        let existing = self.store.get(&code)?.ok_or(RepositoryError::NotFound)?;

        let frozen = [
            ("location_type", existing.location_type != location.location_type),
            ("segment_name", existing.segment_name != location.segment_name),
            ("ancestry", existing.ancestry != location.ancestry),
        ];
        if let Some((field, _)) = frozen.into_iter().find(|(_, changed)| *changed) {
            return Err(ValidationError::ImmutableField { code, field }.into());
        }

        location.created_at = existing.created_at;
        self.on_before_save(&mut location)?;
        let saved = self.store.update(location)?;
        info!(code = %code, "Saved location");
        Ok(saved)
    }

    /// Fetch a location by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get(&self, code: &LocationCode) -> Result<Option<Location>, RegistryError> {
        Ok(self.store.get(code)?)
    }

    /// List locations matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list(&self, filter: &LocationFilter) -> Result<Vec<Location>, RegistryError> {
        Ok(self.store.list(filter)?)
    }

    /// The segment and code the next `location_type` under `parent` would
    /// receive, without storing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingParent`] for a nested type without
    /// a parent, or any allocation error.
    pub fn preview_next_segment(
        &self,
        location_type: LocationType,
        parent: Option<&LocationCode>,
    ) -> Result<SegmentPreview, RegistryError> {
        let parent = match (location_type.parent_type(), parent) {
            (Some(_), Some(parent)) => Some(parent),
            (Some(expected), None) => {
                return Err(ValidationError::MissingParent {
                    child: location_type,
                    expected,
                }
                .into());
            }
            (None, Some(_)) => {
                return Err(ValidationError::UnexpectedParent {
                    child: location_type,
                }
                .into());
            }
            (None, None) => None,
        };

        let settings = self.settings()?;
        let segment =
            next_segment_name(self.store.as_ref(), location_type, parent, &settings.naming)?;
        let code = compose_code(parent.map(LocationCode::as_str), &segment);
        Ok(SegmentPreview { segment, code })
    }
}

/// Whether `new` will receive an allocated segment, which makes a key
/// conflict retryable.
fn allocates_segment(new: &NewLocation, settings: &StoreSettings) -> bool {
    let behavior = &settings.behavior;
    let keeps_code = new.code.is_some()
        && (behavior.allow_manual_override || !behavior.auto_generate_enabled);
    let has_segment = new
        .segment_name
        .as_deref()
        .is_some_and(|segment| !segment.trim().is_empty());

    behavior.auto_generate_enabled
        && !keeps_code
        && !has_segment
        && new.location_type.naming_level().is_some()
}

/// Turn creation input into an unsaved location.
fn prepare(new: &NewLocation) -> Result<Location, ValidationError> {
    let mut location = Location::new(new.location_type, Utc::now());
    location.segment_name.clone_from(&new.segment_name);
    location.code.clone_from(&new.code);
    location.description.clone_from(&new.description);
    if let Some(is_group) = new.is_group {
        location.is_group = is_group;
    }

    if let Some(parent) = &new.parent {
        let slot = new
            .location_type
            .parent_type()
            .ok_or(ValidationError::UnexpectedParent {
                child: new.location_type,
            })?;
        location.ancestry.set(slot, parent.clone());
    }
    Ok(location)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tech_store_core::NamingPattern;

    use super::*;
    use crate::db::MemoryStore;

    fn code(s: &str) -> LocationCode {
        LocationCode::parse(s).unwrap()
    }

    fn service() -> LocationService<MemoryStore> {
        LocationService::new(Arc::new(MemoryStore::new()))
    }

    fn zone_under(parent: &str) -> NewLocation {
        NewLocation::of_type(LocationType::Zone).with_parent(code(parent))
    }

    /// Store that lets a simulated concurrent writer take the code of the
    /// next `races` inserts first.
    struct RacingStore {
        inner: MemoryStore,
        races: AtomicU32,
    }

    impl LocationStore for RacingStore {
        fn sibling_segments(
            &self,
            query: &crate::db::SiblingQuery,
        ) -> Result<Vec<String>, RepositoryError> {
            self.inner.sibling_segments(query)
        }
        fn exists(&self, code: &LocationCode) -> Result<bool, RepositoryError> {
            self.inner.exists(code)
        }
        fn get(&self, code: &LocationCode) -> Result<Option<Location>, RepositoryError> {
            self.inner.get(code)
        }
        fn insert(&self, location: Location) -> Result<Location, RepositoryError> {
            let raced = self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if raced {
                self.inner.insert(location.clone())?;
            }
            self.inner.insert(location)
        }
        fn update(&self, location: Location) -> Result<Location, RepositoryError> {
            self.inner.update(location)
        }
        fn list(&self, filter: &LocationFilter) -> Result<Vec<Location>, RepositoryError> {
            self.inner.list(filter)
        }
        fn delete(&self, code: &LocationCode) -> Result<Location, RepositoryError> {
            self.inner.delete(code)
        }
        fn count(&self) -> Result<u64, RepositoryError> {
            self.inner.count()
        }
    }

    impl SettingsStore for RacingStore {
        fn settings(&self) -> Result<StoreSettings, RepositoryError> {
            self.inner.settings()
        }
        fn save_settings(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
            self.inner.save_settings(settings)
        }
        fn update_settings(
            &self,
            change: &mut dyn FnMut(&mut StoreSettings) -> Result<(), RepositoryError>,
        ) -> Result<StoreSettings, RepositoryError> {
            self.inner.update_settings(change)
        }
    }

    fn racing(races: u32) -> LocationService<RacingStore> {
        LocationService::new(Arc::new(RacingStore {
            inner: MemoryStore::new(),
            races: AtomicU32::new(races),
        }))
    }

    #[test]
    fn test_full_hierarchy_codes() {
        let service = service();
        let wh = service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        let zone = service.create(zone_under("WH-1")).unwrap();
        let rack = service
            .create(NewLocation::of_type(LocationType::Rack).with_parent(code("WH-1-Z-A")))
            .unwrap();
        let shelf = service
            .create(NewLocation::of_type(LocationType::Shelf).with_parent(code("WH-1-Z-A-R01")))
            .unwrap();
        let bin = service
            .create(
                NewLocation::of_type(LocationType::Bin).with_parent(code("WH-1-Z-A-R01-S01")),
            )
            .unwrap();

        assert_eq!(wh.code, Some(code("WH-1")));
        assert_eq!(zone.code, Some(code("WH-1-Z-A")));
        assert_eq!(rack.code, Some(code("WH-1-Z-A-R01")));
        assert_eq!(shelf.code, Some(code("WH-1-Z-A-R01-S01")));
        assert_eq!(bin.code, Some(code("WH-1-Z-A-R01-S01-B-1")));
        assert_eq!(bin.display_name, "WH-1 - Z-A - R01 - S01 - B-1");
        assert_eq!(bin.ancestry.warehouse, Some(code("WH-1")));
        assert_eq!(bin.ancestry.zone, Some(code("WH-1-Z-A")));
        assert_eq!(bin.ancestry.rack, Some(code("WH-1-Z-A-R01")));
        assert!(!bin.is_group);
    }

    #[test]
    fn test_create_updates_stats() {
        let service = service();
        service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        service.create(zone_under("WH-1")).unwrap();

        let stats = service.settings().unwrap().stats;
        assert_eq!(stats.total_locations, 2);
        assert!(stats.system_initialized);
    }

    #[test]
    fn test_validation_runs_before_allocation() {
        let service = service();
        let err = service.create(zone_under("WH-1")).unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::ParentNotFound { .. })
        ));
        assert_eq!(service.store().count().unwrap(), 0);
        assert_eq!(service.settings().unwrap().stats.total_locations, 0);
    }

    #[test]
    fn test_parent_for_top_level_type_is_rejected() {
        let service = service();
        let err = service
            .create(NewLocation::of_type(LocationType::Transit).with_parent(code("WH-1")))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::UnexpectedParent {
                child: LocationType::Transit
            })
        );
    }

    #[test]
    fn test_duplicate_explicit_segment() {
        let service = service();
        service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        service.create(zone_under("WH-1").with_segment("Z-A")).unwrap();

        let err = service
            .create(zone_under("WH-1").with_segment("Z-A"))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::DuplicateCode(code("WH-1-Z-A")))
        );
    }

    #[test]
    fn test_duplicate_without_enforcement_hits_store_key() {
        let service = service();
        let mut settings = service.settings().unwrap();
        settings.behavior.enforce_unique_codes = false;
        service.store().save_settings(&settings).unwrap();

        service
            .create(NewLocation::of_type(LocationType::Transit))
            .unwrap();
        let err = service
            .create(NewLocation::of_type(LocationType::Transit))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::DuplicateCode(code("TRANSIT")))
        );
    }

    #[test]
    fn test_conflicting_insert_is_retried() {
        let service = racing(0);
        service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        service.store().races.store(1, Ordering::SeqCst);

        // The first zone insert loses Z-A to the simulated writer.
        let zone = service.create(zone_under("WH-1")).unwrap();
        assert_eq!(zone.code, Some(code("WH-1-Z-B")));
    }

    #[test]
    fn test_retries_are_bounded() {
        let service = racing(0);
        service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();

        let service = LocationService::new(Arc::clone(service.store())).with_allocation_attempts(2);
        service.store().races.store(5, Ordering::SeqCst);

        let err = service.create(zone_under("WH-1")).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::AllocationExhausted {
                location_type: LocationType::Zone,
                attempts: 2
            }
        ));
    }

    #[test]
    fn test_code_held_outside_sibling_set_is_duplicate() {
        let service = service().with_allocation_attempts(5);
        let mut settings = service.settings().unwrap();
        settings.behavior.allow_manual_override = true;
        service.store().save_settings(&settings).unwrap();

        // A manual code carries no segment, so allocation never sees it.
        let mut manual = NewLocation::of_type(LocationType::Warehouse);
        manual.code = Some(code("WH-1"));
        service.create(manual).unwrap();

        let err = service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::DuplicateCode(code("WH-1")))
        );
        assert_eq!(service.store().count().unwrap(), 1);
    }

    #[test]
    fn test_explicit_segment_conflict_is_not_retried() {
        let service = racing(0);
        service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        service.store().races.store(1, Ordering::SeqCst);

        let err = service
            .create(zone_under("WH-1").with_segment("Z-Q"))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::DuplicateCode(code("WH-1-Z-Q")))
        );
    }

    #[test]
    fn test_save_regenerates_display_name_only() {
        let service = service();
        service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        let mut zone = service.create(zone_under("WH-1")).unwrap();

        zone.description = Some("Cold storage".to_owned());
        zone.enabled = false;
        zone.display_name = "stale".to_owned();
        let saved = service.save(zone).unwrap();

        assert_eq!(saved.display_name, "WH-1 - Z-A");
        assert_eq!(saved.code, Some(code("WH-1-Z-A")));
        let stored = service.get(&code("WH-1-Z-A")).unwrap().unwrap();
        assert!(!stored.enabled);
        assert_eq!(stored.description.as_deref(), Some("Cold storage"));
    }

    #[test]
    fn test_save_rejects_segment_change() {
        let service = service();
        let mut warehouse = service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        warehouse.segment_name = Some("WH-9".to_owned());

        let err = service.save(warehouse).unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::ImmutableField {
                code: code("WH-1"),
                field: "segment_name",
            })
        );
    }

    #[test]
    fn test_save_unknown_location() {
        let service = service();
        let mut ghost = Location::new(LocationType::Warehouse, Utc::now());
        ghost.code = Some(code("WH-404"));
        let err = service.save(ghost).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Repository(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn test_preview_next_segment() {
        let service = service();
        service
            .create(NewLocation::of_type(LocationType::Warehouse))
            .unwrap();
        let mut settings = service.settings().unwrap();
        settings.naming.zone.pattern = NamingPattern::RomanNumerals;
        service.store().save_settings(&settings).unwrap();

        let preview = service
            .preview_next_segment(LocationType::Zone, Some(&code("WH-1")))
            .unwrap();
        assert_eq!(
            preview,
            SegmentPreview {
                segment: "Z-I".to_owned(),
                code: "WH-1-Z-I".to_owned(),
            }
        );
        assert_eq!(service.store().count().unwrap(), 1);

        assert!(
            service
                .preview_next_segment(LocationType::Rack, None)
                .is_err()
        );
    }
}
