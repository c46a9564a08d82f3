//! Hierarchy and uniqueness validation for locations.

use tech_store_core::{LocationCode, LocationType};

use crate::db::LocationStore;
use crate::error::{RegistryError, ValidationError};
use crate::models::{BehaviorFlags, Location, LocationField};

/// Reject `code` if another location already uses it.
///
/// No-op when unique codes are not enforced.
///
/// # Errors
///
/// Returns [`ValidationError::DuplicateCode`] on a collision.
pub fn validate_uniqueness<S>(
    store: &S,
    code: &LocationCode,
    behavior: &BehaviorFlags,
) -> Result<(), RegistryError>
where
    S: LocationStore + ?Sized,
{
    if behavior.enforce_unique_codes && store.exists(code)? {
        return Err(ValidationError::DuplicateCode(code.clone()).into());
    }
    Ok(())
}

/// Check the parent reference of `location` against its type.
///
/// Zone, Rack, Shelf and Bin must reference an existing Warehouse, Zone,
/// Rack and Shelf respectively. Warehouse, Transit, Staging and Other have
/// nothing to check. No-op when hierarchy validation is disabled.
///
/// # Errors
///
/// Returns [`ValidationError::MissingParent`],
/// [`ValidationError::ParentNotFound`] or
/// [`ValidationError::WrongParentType`].
pub fn validate_hierarchy<S>(
    store: &S,
    location: &Location,
    behavior: &BehaviorFlags,
) -> Result<(), RegistryError>
where
    S: LocationStore + ?Sized,
{
    if !behavior.enable_hierarchy_validation {
        return Ok(());
    }
    let child = location.location_type;
    let Some(expected) = child.parent_type() else {
        return Ok(());
    };

    let parent = location
        .parent_ref()
        .ok_or(ValidationError::MissingParent { child, expected })?;

    let actual = store
        .get_field(parent, LocationField::LocationType)?
        .ok_or_else(|| ValidationError::ParentNotFound {
            parent: parent.clone(),
        })?;

    // The stored type round-trips through its display form.
    let actual = actual.parse::<LocationType>().map_err(|_| {
        crate::db::RepositoryError::DataCorruption(format!(
            "location {parent} has unknown type {actual}"
        ))
    })?;

    if actual != expected {
        return Err(ValidationError::WrongParentType {
            child,
            expected,
            parent: parent.clone(),
            actual,
        }
        .into());
    }
    Ok(())
}
