//! Storage location model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tech_store_core::{LocationCode, LocationType};

/// Ancestor references of a location, one slot per hierarchy level that can
/// be a parent.
///
/// A Bin records its shelf, rack, zone and warehouse; a Zone only its
/// warehouse. The slot matching [`LocationType::parent_type`] is the
/// immediate parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<LocationCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<LocationCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack: Option<LocationCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<LocationCode>,
}

impl Ancestry {
    /// Ancestor slots from the top of the hierarchy down.
    pub const LEVELS: [LocationType; 4] = [
        LocationType::Warehouse,
        LocationType::Zone,
        LocationType::Rack,
        LocationType::Shelf,
    ];

    /// The ancestor recorded for `level`.
    ///
    /// Only Warehouse, Zone, Rack and Shelf have slots.
    #[must_use]
    pub const fn get(&self, level: LocationType) -> Option<&LocationCode> {
        match level {
            LocationType::Warehouse => self.warehouse.as_ref(),
            LocationType::Zone => self.zone.as_ref(),
            LocationType::Rack => self.rack.as_ref(),
            LocationType::Shelf => self.shelf.as_ref(),
            LocationType::Bin
            | LocationType::Transit
            | LocationType::Staging
            | LocationType::Other => None,
        }
    }

    /// Record `code` as the ancestor for `level`.
    ///
    /// Returns `false` (and records nothing) when `level` has no slot.
    pub fn set(&mut self, level: LocationType, code: LocationCode) -> bool {
        let slot = match level {
            LocationType::Warehouse => &mut self.warehouse,
            LocationType::Zone => &mut self.zone,
            LocationType::Rack => &mut self.rack,
            LocationType::Shelf => &mut self.shelf,
            LocationType::Bin
            | LocationType::Transit
            | LocationType::Staging
            | LocationType::Other => return false,
        };
        *slot = Some(code);
        true
    }

    /// Whether no ancestor is recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.warehouse.is_none() && self.zone.is_none() && self.rack.is_none() && self.shelf.is_none()
    }
}

/// A location field that can be read through the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationField {
    Code,
    LocationType,
    SegmentName,
    DisplayName,
    /// The ancestor slot for a level.
    Ancestor(LocationType),
}

/// A storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Hierarchical code; `None` until assigned on insert.
    pub code: Option<LocationCode>,
    pub location_type: LocationType,
    /// Locally allocated fragment (`Z-A`, `R01`); frozen once set.
    pub segment_name: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub ancestry: Ancestry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// A blank location of `location_type` timestamped `now`.
    #[must_use]
    pub fn new(location_type: LocationType, now: DateTime<Utc>) -> Self {
        Self {
            code: None,
            location_type,
            segment_name: None,
            display_name: String::new(),
            ancestry: Ancestry::default(),
            description: None,
            enabled: true,
            is_group: !matches!(location_type, LocationType::Bin),
            created_at: now,
            updated_at: now,
        }
    }

    /// The immediate parent reference, read from the slot of the expected
    /// parent type.
    #[must_use]
    pub fn parent_ref(&self) -> Option<&LocationCode> {
        self.location_type
            .parent_type()
            .and_then(|parent| self.ancestry.get(parent))
    }

    /// The segment name, if one is set and non-blank.
    #[must_use]
    pub fn segment(&self) -> Option<&str> {
        self.segment_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Read one field as a string.
    #[must_use]
    pub fn field(&self, field: LocationField) -> Option<String> {
        match field {
            LocationField::Code => self.code.as_ref().map(ToString::to_string),
            LocationField::LocationType => Some(self.location_type.to_string()),
            LocationField::SegmentName => self.segment().map(str::to_owned),
            LocationField::DisplayName => {
                Some(self.display_name.clone()).filter(|name| !name.is_empty())
            }
            LocationField::Ancestor(level) => self.ancestry.get(level).map(ToString::to_string),
        }
    }
}

/// Input for creating a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    pub location_type: LocationType,
    /// Code of the immediate parent.
    #[serde(default)]
    pub parent: Option<LocationCode>,
    /// Explicit segment name; allocated when absent.
    #[serde(default)]
    pub segment_name: Option<String>,
    /// Explicit code; kept only when manual override is allowed.
    #[serde(default)]
    pub code: Option<LocationCode>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_group: Option<bool>,
}

impl NewLocation {
    /// Input for a location of `location_type` with nothing else set.
    #[must_use]
    pub const fn of_type(location_type: LocationType) -> Self {
        Self {
            location_type,
            parent: None,
            segment_name: None,
            code: None,
            description: None,
            is_group: None,
        }
    }

    /// Set the parent code.
    #[must_use]
    pub fn with_parent(mut self, parent: LocationCode) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set an explicit segment name.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment_name = Some(segment.into());
        self
    }

    /// Set an explicit code.
    #[must_use]
    pub fn with_code(mut self, code: LocationCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
