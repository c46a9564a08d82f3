//! Integration tests for the Technical Store System.
//!
//! Cross-crate scenarios run against the in-memory store:
//!
//! - `location_codes` - code generation, hierarchy and uniqueness rules
//! - `item_groups` - category tree rules and code generation
//! - `uoms` - unit validation and conversion
//! - `seeding` - demo catalogue seeding and status detection
//!
//! ```bash
//! cargo test -p tech-store-integration-tests
//! ```

use std::sync::Arc;

use tech_store_core::{LocationCode, LocationType};
use tech_store_registry::RegistryError;
use tech_store_registry::db::{MemoryStore, SettingsStore};
use tech_store_registry::models::{Location, NewLocation, StoreSettings};
use tech_store_registry::services::LocationService;

/// Parse a location code, panicking on invalid test input.
///
/// # Panics
///
/// Panics if `s` is not a valid code.
#[must_use]
pub fn code(s: &str) -> LocationCode {
    LocationCode::parse(s).unwrap_or_else(|e| panic!("invalid test code {s:?}: {e}"))
}

/// A location service over a fresh in-memory store with default settings.
#[must_use]
pub fn fresh_service() -> LocationService<MemoryStore> {
    LocationService::new(Arc::new(MemoryStore::new()))
}

/// A location service over a fresh store with the given settings.
#[must_use]
pub fn service_with(settings: StoreSettings) -> LocationService<MemoryStore> {
    LocationService::new(Arc::new(MemoryStore::with_settings(settings)))
}

/// Change the stored settings of `service`.
///
/// # Panics
///
/// Panics if the settings cannot be read or written.
pub fn update_settings(
    service: &LocationService<MemoryStore>,
    change: impl FnOnce(&mut StoreSettings),
) {
    let mut settings = service
        .store()
        .settings()
        .unwrap_or_else(|e| panic!("settings unreadable: {e}"));
    change(&mut settings);
    service
        .store()
        .save_settings(&settings)
        .unwrap_or_else(|e| panic!("settings not saved: {e}"));
}

/// Create a location of `location_type` under `parent`.
///
/// # Errors
///
/// Returns the pipeline error unchanged.
pub fn create(
    service: &LocationService<MemoryStore>,
    location_type: LocationType,
    parent: Option<&str>,
) -> Result<Location, RegistryError> {
    let mut new = NewLocation::of_type(location_type);
    new.parent = parent.map(code);
    service.create(new)
}

/// Code of a stored location as a string.
///
/// # Panics
///
/// Panics if the location has no code.
#[must_use]
pub fn code_of(location: &Location) -> String {
    location
        .code
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| panic!("location without code: {location:?}"))
}
