//! Unified error handling for the registry.

use rust_decimal::Decimal;
use thiserror::Error;

use tech_store_core::{ItemGroupName, KeyError, LocationCode, LocationType, SequenceError, UomName};

use crate::db::RepositoryError;
use crate::models::UomType;

/// User-facing validation failures.
///
/// These abort the operation and are surfaced to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // =========================================================================
    // Locations
    // =========================================================================
    /// A nested location has no parent reference.
    #[error("{child} requires a parent {expected}")]
    MissingParent {
        child: LocationType,
        expected: LocationType,
    },

    /// The referenced parent does not exist.
    #[error("parent location {parent} does not exist")]
    ParentNotFound { parent: LocationCode },

    /// The referenced parent has the wrong type.
    #[error("{child} parent must be a {expected}, but {parent} is a {actual}")]
    WrongParentType {
        child: LocationType,
        expected: LocationType,
        parent: LocationCode,
        actual: LocationType,
    },

    /// A parent was given for a type that never has one.
    #[error("{child} locations do not have a parent")]
    UnexpectedParent { child: LocationType },

    /// Another location already uses this code.
    #[error("location code {0} already exists")]
    DuplicateCode(LocationCode),

    /// Auto-generation is disabled and no code was supplied.
    #[error("automatic code generation is disabled; a location code is required")]
    ManualCodeRequired,

    /// The resolved code is not a valid key.
    #[error("invalid location code: {0}")]
    InvalidCode(#[from] KeyError),

    /// A save tried to change a field frozen at insert.
    #[error("{field} of location {code} cannot be changed")]
    ImmutableField {
        code: LocationCode,
        field: &'static str,
    },

    // =========================================================================
    // Item groups
    // =========================================================================
    /// An item group with this name already exists.
    #[error("item group {0} already exists")]
    DuplicateItemGroup(ItemGroupName),

    /// The item group does not exist.
    #[error("item group {0} does not exist")]
    ItemGroupNotFound(ItemGroupName),

    /// The parent group is not marked as a group.
    #[error("parent {0} must be marked as a group to contain sub-groups")]
    ParentNotGroup(ItemGroupName),

    /// The parent chain would loop back to the group itself.
    #[error("circular reference: {0} cannot be placed under its own descendant")]
    CircularReference(ItemGroupName),

    /// The group still has sub-groups.
    #[error("cannot delete item group {name} because it contains {count} sub-group(s)")]
    GroupHasChildren { name: ItemGroupName, count: u32 },

    /// Items are still filed under the group.
    #[error("cannot delete item group {name} because it contains {count} item(s)")]
    GroupHasItems { name: ItemGroupName, count: u64 },

    /// Every numbered variant of the base code is taken.
    #[error("no free item group code left for base {base} (tried up to {base}{max})")]
    ItemGroupCodeExhausted { base: String, max: u32 },

    /// The referenced default unit does not exist.
    #[error("default unit {0} does not exist")]
    DefaultUomNotFound(UomName),

    // =========================================================================
    // Units of measure
    // =========================================================================
    /// A unit with this name already exists.
    #[error("unit {0} already exists")]
    DuplicateUom(UomName),

    /// The unit does not exist.
    #[error("unit {0} does not exist")]
    UomNotFound(UomName),

    /// A unit cannot be its own base.
    #[error("unit {0} cannot be its own base unit")]
    SelfReferencingBase(UomName),

    /// The base unit is itself defined relative to another unit.
    #[error("base unit {0} must not have a base unit of its own")]
    NestedBaseUom(UomName),

    /// The base unit measures a different dimension.
    #[error("base unit {base} is {base_type}, expected {expected}")]
    BaseUomTypeMismatch {
        base: UomName,
        base_type: UomType,
        expected: UomType,
    },

    /// A base unit was set without a positive conversion factor.
    #[error("conversion factor for {0} must be greater than zero")]
    NonPositiveFactor(UomName),

    /// A fractional quantity was given for a whole-number unit.
    #[error("{uom} only accepts whole numbers, got {quantity}")]
    FractionalQuantity { uom: UomName, quantity: Decimal },

    /// The units do not share a base unit.
    #[error("cannot convert between {from} and {to}")]
    IncompatibleUoms { from: UomName, to: UomName },
}

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller input was rejected.
    Validation,
    /// The record store failed.
    Storage,
    /// A bug or exhausted internal resource.
    Internal,
}

/// Error returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Record store operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The naming pattern has no further values.
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Every allocation attempt collided with a concurrent insert.
    #[error("could not allocate a unique {location_type} code after {attempts} attempts")]
    AllocationExhausted {
        location_type: LocationType,
        attempts: u8,
    },
}

impl RegistryError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Repository(_) => ErrorKind::Storage,
            Self::Sequence(_) | Self::AllocationExhausted { .. } => ErrorKind::Internal,
        }
    }

    /// The validation failure, if this is one.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}
