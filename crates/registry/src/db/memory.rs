//! In-memory record store with JSON snapshots.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use tech_store_core::{ItemGroupName, LocationCode, UomName};

use super::{
    ItemGroupStore, LocationFilter, LocationStore, RepositoryError, SettingsStore, SiblingQuery,
    UomStore,
};
use crate::models::{ItemGroup, Location, StoreSettings, Uom};

/// Serializable image of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub settings: StoreSettings,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub item_groups: Vec<ItemGroup>,
    #[serde(default)]
    pub uoms: Vec<Uom>,
    /// Items per group as last reported by the item master.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub item_counts: BTreeMap<ItemGroupName, u64>,
}

/// Thread-safe in-memory store.
///
/// Every map sits behind its own lock, so an insert checks and writes its key
/// under a single write guard.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: RwLock<StoreSettings>,
    locations: RwLock<BTreeMap<LocationCode, Location>>,
    item_groups: RwLock<BTreeMap<ItemGroupName, ItemGroup>>,
    uoms: RwLock<BTreeMap<UomName, Uom>>,
    item_counts: RwLock<BTreeMap<ItemGroupName, u64>>,
}

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Backend("store lock poisoned".to_owned())
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, RepositoryError> {
    lock.read().map_err(poisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, RepositoryError> {
    lock.write().map_err(poisoned)
}

fn count_of(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

impl MemoryStore {
    /// Create an empty store with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given settings.
    #[must_use]
    pub fn with_settings(settings: StoreSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            ..Self::default()
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DataCorruption`] if a location has no code
    /// or a key appears twice.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, RepositoryError> {
        let mut locations = BTreeMap::new();
        for location in snapshot.locations {
            let code = location.code.clone().ok_or_else(|| {
                RepositoryError::DataCorruption("stored location has no code".to_owned())
            })?;
            if locations.insert(code.clone(), location).is_some() {
                return Err(RepositoryError::DataCorruption(format!(
                    "location {code} appears twice"
                )));
            }
        }

        let mut item_groups = BTreeMap::new();
        for group in snapshot.item_groups {
            let name = group.name.clone();
            if item_groups.insert(name.clone(), group).is_some() {
                return Err(RepositoryError::DataCorruption(format!(
                    "item group {name} appears twice"
                )));
            }
        }

        let mut uoms = BTreeMap::new();
        for uom in snapshot.uoms {
            let name = uom.name.clone();
            if uoms.insert(name.clone(), uom).is_some() {
                return Err(RepositoryError::DataCorruption(format!(
                    "unit {name} appears twice"
                )));
            }
        }

        Ok(Self {
            settings: RwLock::new(snapshot.settings),
            locations: RwLock::new(locations),
            item_groups: RwLock::new(item_groups),
            uoms: RwLock::new(uoms),
            item_counts: RwLock::new(snapshot.item_counts),
        })
    }

    /// Capture the current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    pub fn snapshot(&self) -> Result<Snapshot, RepositoryError> {
        Ok(Snapshot {
            settings: read(&self.settings)?.clone(),
            locations: read(&self.locations)?.values().cloned().collect(),
            item_groups: read(&self.item_groups)?.values().cloned().collect(),
            uoms: read(&self.uoms)?.values().cloned().collect(),
            item_counts: read(&self.item_counts)?.clone(),
        })
    }

    /// Record how many items the item master files under `group`.
    ///
    /// A count of zero clears the entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    pub fn set_item_count(&self, group: &ItemGroupName, count: u64) -> Result<(), RepositoryError> {
        let mut counts = write(&self.item_counts)?;
        if count == 0 {
            counts.remove(group);
        } else {
            counts.insert(group.clone(), count);
        }
        Ok(())
    }

    /// Load a store from snapshot JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the snapshot is corrupt.
    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Encode the current contents as pretty-printed snapshot JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned or encoding fails.
    pub fn to_json(&self) -> Result<String, RepositoryError> {
        Ok(serde_json::to_string_pretty(&self.snapshot()?)?)
    }
}

// =============================================================================
// Locations
// =============================================================================

impl LocationStore for MemoryStore {
    fn sibling_segments(&self, query: &SiblingQuery) -> Result<Vec<String>, RepositoryError> {
        Ok(read(&self.locations)?
            .values()
            .filter(|location| query.matches(location))
            .filter_map(|location| location.segment().map(str::to_owned))
            .collect())
    }

    fn exists(&self, code: &LocationCode) -> Result<bool, RepositoryError> {
        Ok(read(&self.locations)?.contains_key(code))
    }

    fn get(&self, code: &LocationCode) -> Result<Option<Location>, RepositoryError> {
        Ok(read(&self.locations)?.get(code).cloned())
    }

    fn insert(&self, location: Location) -> Result<Location, RepositoryError> {
        let code = location.code.clone().ok_or_else(|| {
            RepositoryError::DataCorruption("cannot insert a location without a code".to_owned())
        })?;

        let mut locations = write(&self.locations)?;
        if locations.contains_key(&code) {
            return Err(RepositoryError::Conflict(format!(
                "location {code} already exists"
            )));
        }
        locations.insert(code, location.clone());
        Ok(location)
    }

    fn update(&self, location: Location) -> Result<Location, RepositoryError> {
        let code = location.code.as_ref().ok_or(RepositoryError::NotFound)?;

        let mut locations = write(&self.locations)?;
        let slot = locations.get_mut(code).ok_or(RepositoryError::NotFound)?;
        *slot = location.clone();
        Ok(location)
    }

    fn list(&self, filter: &LocationFilter) -> Result<Vec<Location>, RepositoryError> {
        Ok(read(&self.locations)?
            .values()
            .filter(|location| filter.matches(location))
            .cloned()
            .collect())
    }

    fn delete(&self, code: &LocationCode) -> Result<Location, RepositoryError> {
        write(&self.locations)?
            .remove(code)
            .ok_or(RepositoryError::NotFound)
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        Ok(count_of(read(&self.locations)?.len()))
    }
}

// =============================================================================
// Settings
// =============================================================================

impl SettingsStore for MemoryStore {
    fn settings(&self) -> Result<StoreSettings, RepositoryError> {
        Ok(read(&self.settings)?.clone())
    }

    fn save_settings(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        *write(&self.settings)? = settings.clone();
        Ok(())
    }

    fn update_settings(
        &self,
        change: &mut dyn FnMut(&mut StoreSettings) -> Result<(), RepositoryError>,
    ) -> Result<StoreSettings, RepositoryError> {
        let mut settings = write(&self.settings)?;
        let mut updated = settings.clone();
        change(&mut updated)?;
        *settings = updated.clone();
        Ok(updated)
    }
}

// =============================================================================
// Item groups
// =============================================================================

impl ItemGroupStore for MemoryStore {
    fn get_group(&self, name: &ItemGroupName) -> Result<Option<ItemGroup>, RepositoryError> {
        Ok(read(&self.item_groups)?.get(name).cloned())
    }

    fn group_code_exists(&self, code: &str) -> Result<bool, RepositoryError> {
        Ok(read(&self.item_groups)?
            .values()
            .any(|group| group.code == code))
    }

    fn insert_group(&self, group: ItemGroup) -> Result<ItemGroup, RepositoryError> {
        let mut groups = write(&self.item_groups)?;
        if groups.contains_key(&group.name) {
            return Err(RepositoryError::Conflict(format!(
                "item group {} already exists",
                group.name
            )));
        }
        groups.insert(group.name.clone(), group.clone());
        Ok(group)
    }

    fn update_group(&self, group: ItemGroup) -> Result<ItemGroup, RepositoryError> {
        let mut groups = write(&self.item_groups)?;
        let slot = groups.get_mut(&group.name).ok_or(RepositoryError::NotFound)?;
        *slot = group.clone();
        Ok(group)
    }

    fn delete_group(&self, name: &ItemGroupName) -> Result<ItemGroup, RepositoryError> {
        write(&self.item_groups)?
            .remove(name)
            .ok_or(RepositoryError::NotFound)
    }

    fn child_groups(
        &self,
        parent: Option<&ItemGroupName>,
    ) -> Result<Vec<ItemGroup>, RepositoryError> {
        Ok(read(&self.item_groups)?
            .values()
            .filter(|group| group.parent.as_ref() == parent)
            .cloned()
            .collect())
    }

    fn item_count(&self, name: &ItemGroupName) -> Result<u64, RepositoryError> {
        Ok(read(&self.item_counts)?.get(name).copied().unwrap_or(0))
    }

    fn group_count(&self) -> Result<u64, RepositoryError> {
        Ok(count_of(read(&self.item_groups)?.len()))
    }
}

// =============================================================================
// Units of measure
// =============================================================================

impl UomStore for MemoryStore {
    fn get_uom(&self, name: &UomName) -> Result<Option<Uom>, RepositoryError> {
        Ok(read(&self.uoms)?.get(name).cloned())
    }

    fn insert_uom(&self, uom: Uom) -> Result<Uom, RepositoryError> {
        let mut uoms = write(&self.uoms)?;
        if uoms.contains_key(&uom.name) {
            return Err(RepositoryError::Conflict(format!(
                "unit {} already exists",
                uom.name
            )));
        }
        uoms.insert(uom.name.clone(), uom.clone());
        Ok(uom)
    }

    fn list_uoms(&self) -> Result<Vec<Uom>, RepositoryError> {
        Ok(read(&self.uoms)?.values().cloned().collect())
    }

    fn delete_uom(&self, name: &UomName) -> Result<Uom, RepositoryError> {
        write(&self.uoms)?.remove(name).ok_or(RepositoryError::NotFound)
    }

    fn uom_count(&self) -> Result<u64, RepositoryError> {
        Ok(count_of(read(&self.uoms)?.len()))
    }
}
