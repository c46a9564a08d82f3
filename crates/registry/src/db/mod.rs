//! Record store contract for the registry.
//!
//! The registry never talks to a storage engine directly. Services take any
//! type implementing the traits below; [`MemoryStore`] is the bundled
//! implementation, persisted as a JSON snapshot.
//!
//! ## Stores
//!
//! - [`LocationStore`] - storage locations keyed by code
//! - [`SettingsStore`] - the settings singleton
//! - [`ItemGroupStore`] - item category tree keyed by name
//! - [`UomStore`] - units of measure keyed by name
//!
//! Inserts are atomic with respect to the key: inserting an existing key
//! returns [`RepositoryError::Conflict`] and stores nothing.

pub mod memory;

use thiserror::Error;

use tech_store_core::{ItemGroupName, LocationCode, LocationType, UomName};

use crate::models::{ItemGroup, Location, LocationField, StoreSettings, Uom};

pub use memory::{MemoryStore, Snapshot};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// Key constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Stored data is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The backing store failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Reading or writing a snapshot failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Selects the siblings of a location: same type, same immediate parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingQuery {
    pub location_type: LocationType,
    /// Parent code; `None` for top-level types, which share one global scope.
    pub parent: Option<LocationCode>,
}

impl SiblingQuery {
    /// Whether `location` belongs to this sibling set.
    #[must_use]
    pub fn matches(&self, location: &Location) -> bool {
        location.location_type == self.location_type
            && location.parent_ref() == self.parent.as_ref()
    }
}

/// Filter for listing locations. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
    pub location_type: Option<LocationType>,
    /// Immediate parent code.
    pub parent: Option<LocationCode>,
    pub enabled_only: bool,
}

impl LocationFilter {
    /// Whether `location` passes the filter.
    #[must_use]
    pub fn matches(&self, location: &Location) -> bool {
        self.location_type.is_none_or(|ty| location.location_type == ty)
            && self
                .parent
                .as_ref()
                .is_none_or(|parent| location.parent_ref() == Some(parent))
            && (!self.enabled_only || location.enabled)
    }
}

/// Storage of locations keyed by code.
pub trait LocationStore: Send + Sync {
    /// Segment names of every location matching `query`.
    ///
    /// Locations without a segment are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn sibling_segments(&self, query: &SiblingQuery) -> Result<Vec<String>, RepositoryError>;

    /// Whether a location with `code` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn exists(&self, code: &LocationCode) -> Result<bool, RepositoryError>;

    /// Fetch a location by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, code: &LocationCode) -> Result<Option<Location>, RepositoryError>;

    /// Fetch one field of a location.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_field(
        &self,
        code: &LocationCode,
        field: LocationField,
    ) -> Result<Option<String>, RepositoryError> {
        Ok(self.get(code)?.and_then(|location| location.field(field)))
    }

    /// Store a new location.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the code is taken and
    /// [`RepositoryError::DataCorruption`] if the location has no code.
    fn insert(&self, location: Location) -> Result<Location, RepositoryError>;

    /// Replace an existing location.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no location has the code.
    fn update(&self, location: Location) -> Result<Location, RepositoryError>;

    /// List locations matching `filter`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list(&self, filter: &LocationFilter) -> Result<Vec<Location>, RepositoryError>;

    /// Remove a location.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no location has the code.
    fn delete(&self, code: &LocationCode) -> Result<Location, RepositoryError>;

    /// Number of stored locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count(&self) -> Result<u64, RepositoryError>;
}

/// Storage of the settings singleton.
pub trait SettingsStore: Send + Sync {
    /// Read the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn settings(&self) -> Result<StoreSettings, RepositoryError>;

    /// Replace the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save_settings(&self, settings: &StoreSettings) -> Result<(), RepositoryError>;

    /// Apply `change` to the settings as one read-modify-write.
    ///
    /// No other settings write can interleave between the read and the
    /// write. Nothing is stored when `change` fails.
    ///
    /// # Errors
    ///
    /// Returns the error raised by `change`, or an error if the store cannot
    /// be written.
    fn update_settings(
        &self,
        change: &mut dyn FnMut(&mut StoreSettings) -> Result<(), RepositoryError>,
    ) -> Result<StoreSettings, RepositoryError>;
}

/// Storage of item groups keyed by name.
pub trait ItemGroupStore: Send + Sync {
    /// Fetch a group by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_group(&self, name: &ItemGroupName) -> Result<Option<ItemGroup>, RepositoryError>;

    /// Whether any group uses `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn group_code_exists(&self, code: &str) -> Result<bool, RepositoryError>;

    /// Store a new group.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the name is taken.
    fn insert_group(&self, group: ItemGroup) -> Result<ItemGroup, RepositoryError>;

    /// Replace an existing group.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no group has the name.
    fn update_group(&self, group: ItemGroup) -> Result<ItemGroup, RepositoryError>;

    /// Remove a group.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no group has the name.
    fn delete_group(&self, name: &ItemGroupName) -> Result<ItemGroup, RepositoryError>;

    /// Immediate children of `parent` (roots when `None`), ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn child_groups(
        &self,
        parent: Option<&ItemGroupName>,
    ) -> Result<Vec<ItemGroup>, RepositoryError>;

    /// Number of items filed directly under the group.
    ///
    /// Items live outside the registry; the count is whatever the item
    /// master last reported for the group.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn item_count(&self, name: &ItemGroupName) -> Result<u64, RepositoryError>;

    /// Number of stored groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn group_count(&self) -> Result<u64, RepositoryError>;
}

/// Storage of units of measure keyed by name.
pub trait UomStore: Send + Sync {
    /// Fetch a unit by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_uom(&self, name: &UomName) -> Result<Option<Uom>, RepositoryError>;

    /// Store a new unit.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the name is taken.
    fn insert_uom(&self, uom: Uom) -> Result<Uom, RepositoryError>;

    /// All units, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_uoms(&self) -> Result<Vec<Uom>, RepositoryError>;

    /// Remove a unit.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no unit has the name.
    fn delete_uom(&self, name: &UomName) -> Result<Uom, RepositoryError>;

    /// Number of stored units.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn uom_count(&self) -> Result<u64, RepositoryError>;
}
