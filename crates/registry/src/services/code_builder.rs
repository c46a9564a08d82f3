//! Location code builder.
//!
//! Allocates the segment name of a new location within its parent scope,
//! composes the hierarchical code from the parent code and the segment, and
//! derives the display name from the ancestors' segments.

use tracing::debug;

use tech_store_core::{
    LocationCode, LocationType, clean_segment, compose_code, format_segment, join_display,
    next_value,
};

use crate::db::{LocationStore, SiblingQuery};
use crate::error::{RegistryError, ValidationError};
use crate::models::{Ancestry, Location, LocationField, NamingConfig, StoreSettings};

/// Display name used when a location has neither segments nor a code.
pub const UNNAMED_LOCATION: &str = "New Location";

/// Allocate the next segment name for a `location_type` under `parent`.
///
/// Hierarchy levels allocate from their configured pattern, scoped to the
/// siblings sharing `parent`. Transit, Staging and Other use their uppercased
/// type name.
///
/// # Errors
///
/// Returns an error if the siblings cannot be read or the level's pattern is
/// exhausted.
pub fn next_segment_name<S>(
    store: &S,
    location_type: LocationType,
    parent: Option<&LocationCode>,
    naming: &NamingConfig,
) -> Result<String, RegistryError>
where
    S: LocationStore + ?Sized,
{
    let Some(level) = location_type.naming_level() else {
        return Ok(location_type.as_str().to_ascii_uppercase());
    };
    let config = naming.level(level);

    let query = SiblingQuery {
        location_type,
        parent: parent.cloned(),
    };
    let existing: Vec<String> = store
        .sibling_segments(&query)?
        .iter()
        .map(|segment| clean_segment(segment, &config.prefix))
        .collect();

    let value = next_value(&existing, config.pattern)?;
    let segment = format_segment(level, &config.prefix, &value);

    debug!(
        location_type = %location_type,
        parent = parent.map(LocationCode::as_str),
        siblings = existing.len(),
        segment = %segment,
        "Allocated segment"
    );
    Ok(segment)
}

/// Assign the segment name and code of a new location in place.
///
/// - With manual override allowed, a supplied code is kept untouched.
/// - With auto-generation disabled, a supplied code is kept and a missing one
///   is rejected.
/// - Otherwise an empty segment is allocated and the code is composed from
///   the parent's code. A segment that is already set is never reallocated,
///   so calling this twice yields the same code.
///
/// # Errors
///
/// Returns [`ValidationError::ManualCodeRequired`] when generation is off and
/// no code was supplied, [`ValidationError::MissingParent`] when a nested
/// location has no parent to compose from, or any allocation error.
pub fn assign_code<S>(
    store: &S,
    location: &mut Location,
    settings: &StoreSettings,
) -> Result<(), RegistryError>
where
    S: LocationStore + ?Sized,
{
    let behavior = &settings.behavior;

    if location.code.is_some() && behavior.allow_manual_override {
        return Ok(());
    }

    if !behavior.auto_generate_enabled {
        return if location.code.is_some() {
            Ok(())
        } else {
            Err(ValidationError::ManualCodeRequired.into())
        };
    }

    let parent = match location.location_type.parent_type() {
        Some(expected) => Some(location.parent_ref().cloned().ok_or(
            ValidationError::MissingParent {
                child: location.location_type,
                expected,
            },
        )?),
        None => None,
    };

    let segment = match location.segment() {
        Some(segment) => segment.to_owned(),
        None => next_segment_name(
            store,
            location.location_type,
            parent.as_ref(),
            &settings.naming,
        )?,
    };

    let code = compose_code(parent.as_ref().map(LocationCode::as_str), &segment);
    location.code = Some(LocationCode::parse(&code).map_err(ValidationError::from)?);
    location.segment_name = Some(segment);
    Ok(())
}

/// Copy the parent's recorded ancestors into empty slots of `location`.
///
/// A Rack created with only its zone gains the zone's warehouse; slots the
/// caller already filled are kept.
///
/// # Errors
///
/// Returns an error if the parent cannot be read. A missing parent is not an
/// error here; the hierarchy validator reports it.
pub fn fill_ancestry<S>(store: &S, location: &mut Location) -> Result<(), RegistryError>
where
    S: LocationStore + ?Sized,
{
    let Some(parent_code) = location.parent_ref().cloned() else {
        return Ok(());
    };
    let Some(parent) = store.get(&parent_code)? else {
        return Ok(());
    };

    for level in Ancestry::LEVELS {
        if location.ancestry.get(level).is_none()
            && let Some(code) = parent.ancestry.get(level)
        {
            location.ancestry.set(level, code.clone());
        }
    }
    Ok(())
}

/// Build the display name of `location`.
///
/// Joins the segment names of every recorded ancestor, top down, followed by
/// the location's own segment: `WH-1 - Z-A - R01`. Falls back to the code,
/// then to [`UNNAMED_LOCATION`].
///
/// # Errors
///
/// Returns an error if an ancestor cannot be read.
pub fn build_display_name<S>(store: &S, location: &Location) -> Result<String, RegistryError>
where
    S: LocationStore + ?Sized,
{
    let mut parts = Vec::new();

    for level in Ancestry::LEVELS {
        if let Some(code) = location.ancestry.get(level)
            && let Some(segment) = store.get_field(code, LocationField::SegmentName)?
        {
            parts.push(segment);
        }
    }
    if let Some(segment) = location.segment() {
        parts.push(segment.to_owned());
    }

    if parts.is_empty() {
        return Ok(location
            .code
            .as_ref()
            .map_or_else(|| UNNAMED_LOCATION.to_owned(), ToString::to_string));
    }
    Ok(join_display(&parts))
}
