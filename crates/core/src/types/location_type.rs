//! Location types and the naming levels of the storage hierarchy.
//!
//! The physical hierarchy is Warehouse → Zone → Rack → Shelf → Bin. Transit,
//! Staging and Other are free-standing locations outside that chain.

use serde::{Deserialize, Serialize};

/// Type of a storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocationType {
    Warehouse,
    Zone,
    Rack,
    Shelf,
    Bin,
    Transit,
    Staging,
    Other,
}

impl LocationType {
    /// Every location type, hierarchy levels first.
    pub const ALL: [Self; 8] = [
        Self::Warehouse,
        Self::Zone,
        Self::Rack,
        Self::Shelf,
        Self::Bin,
        Self::Transit,
        Self::Staging,
        Self::Other,
    ];

    /// The type a location of this type must reference as its parent.
    ///
    /// `None` for Warehouse and the free-standing types.
    #[must_use]
    pub const fn parent_type(self) -> Option<Self> {
        match self {
            Self::Zone => Some(Self::Warehouse),
            Self::Rack => Some(Self::Zone),
            Self::Shelf => Some(Self::Rack),
            Self::Bin => Some(Self::Shelf),
            Self::Warehouse | Self::Transit | Self::Staging | Self::Other => None,
        }
    }

    /// Whether the code of this type is prefixed with its parent's code.
    #[must_use]
    pub const fn is_nested(self) -> bool {
        self.parent_type().is_some()
    }

    /// The naming level used to allocate segments, if this type has one.
    #[must_use]
    pub const fn naming_level(self) -> Option<NamingLevel> {
        match self {
            Self::Warehouse => Some(NamingLevel::Warehouse),
            Self::Zone => Some(NamingLevel::Zone),
            Self::Rack => Some(NamingLevel::Rack),
            Self::Shelf => Some(NamingLevel::Shelf),
            Self::Bin => Some(NamingLevel::Bin),
            Self::Transit | Self::Staging | Self::Other => None,
        }
    }

    /// Stored name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warehouse => "Warehouse",
            Self::Zone => "Zone",
            Self::Rack => "Rack",
            Self::Shelf => "Shelf",
            Self::Bin => "Bin",
            Self::Transit => "Transit",
            Self::Staging => "Staging",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid location type: {s}"))
    }
}

/// A level of the storage hierarchy that has its own naming configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NamingLevel {
    Warehouse,
    Zone,
    Rack,
    Shelf,
    Bin,
}

impl NamingLevel {
    /// Every naming level, top of the hierarchy first.
    pub const ALL: [Self; 5] = [
        Self::Warehouse,
        Self::Zone,
        Self::Rack,
        Self::Shelf,
        Self::Bin,
    ];

    /// The location type this level names.
    #[must_use]
    pub const fn location_type(self) -> LocationType {
        match self {
            Self::Warehouse => LocationType::Warehouse,
            Self::Zone => LocationType::Zone,
            Self::Rack => LocationType::Rack,
            Self::Shelf => LocationType::Shelf,
            Self::Bin => LocationType::Bin,
        }
    }

    /// Racks and shelves render numeric segments zero-padded without a
    /// separator (`R01`, `S01`).
    #[must_use]
    pub const fn pads_numbers(self) -> bool {
        matches!(self, Self::Rack | Self::Shelf)
    }

    /// Conventional prefix for the level (`WH`, `Z`, `R`, `S`, `B`).
    #[must_use]
    pub const fn default_prefix(self) -> &'static str {
        match self {
            Self::Warehouse => "WH",
            Self::Zone => "Z",
            Self::Rack => "R",
            Self::Shelf => "S",
            Self::Bin => "B",
        }
    }

    /// Upper-case environment/config key fragment (`WAREHOUSE`, `ZONE`, ...).
    #[must_use]
    pub const fn env_key(self) -> &'static str {
        match self {
            Self::Warehouse => "WAREHOUSE",
            Self::Zone => "ZONE",
            Self::Rack => "RACK",
            Self::Shelf => "SHELF",
            Self::Bin => "BIN",
        }
    }
}

impl std::fmt::Display for NamingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.location_type().as_str())
    }
}
