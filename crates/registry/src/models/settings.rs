//! The store settings singleton: naming configuration, behavior flags and
//! system statistics.
//!
//! Settings are read once per operation and passed explicitly to the
//! components that need them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tech_store_core::{NamingLevel, NamingPattern};

/// Naming configuration for one hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelNaming {
    /// Ordering scheme for allocated segments.
    pub pattern: NamingPattern,
    /// Prefix placed in front of allocated values (`WH`, `Z`, `R`, ...).
    pub prefix: String,
}

impl LevelNaming {
    /// Conventional naming for a level.
    ///
    /// Zones are lettered; every other level is numbered.
    #[must_use]
    pub fn for_level(level: NamingLevel) -> Self {
        let pattern = match level {
            NamingLevel::Zone => NamingPattern::Alphabetic,
            NamingLevel::Warehouse | NamingLevel::Rack | NamingLevel::Shelf | NamingLevel::Bin => {
                NamingPattern::Numeric
            }
        };
        Self {
            pattern,
            prefix: level.default_prefix().to_owned(),
        }
    }
}

fn warehouse_naming() -> LevelNaming {
    LevelNaming::for_level(NamingLevel::Warehouse)
}

fn zone_naming() -> LevelNaming {
    LevelNaming::for_level(NamingLevel::Zone)
}

fn rack_naming() -> LevelNaming {
    LevelNaming::for_level(NamingLevel::Rack)
}

fn shelf_naming() -> LevelNaming {
    LevelNaming::for_level(NamingLevel::Shelf)
}

fn bin_naming() -> LevelNaming {
    LevelNaming::for_level(NamingLevel::Bin)
}

/// Per-level naming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default = "warehouse_naming")]
    pub warehouse: LevelNaming,
    #[serde(default = "zone_naming")]
    pub zone: LevelNaming,
    #[serde(default = "rack_naming")]
    pub rack: LevelNaming,
    #[serde(default = "shelf_naming")]
    pub shelf: LevelNaming,
    #[serde(default = "bin_naming")]
    pub bin: LevelNaming,
}

impl NamingConfig {
    /// Naming for a level.
    #[must_use]
    pub const fn level(&self, level: NamingLevel) -> &LevelNaming {
        match level {
            NamingLevel::Warehouse => &self.warehouse,
            NamingLevel::Zone => &self.zone,
            NamingLevel::Rack => &self.rack,
            NamingLevel::Shelf => &self.shelf,
            NamingLevel::Bin => &self.bin,
        }
    }

    /// Mutable naming for a level.
    pub const fn level_mut(&mut self, level: NamingLevel) -> &mut LevelNaming {
        match level {
            NamingLevel::Warehouse => &mut self.warehouse,
            NamingLevel::Zone => &mut self.zone,
            NamingLevel::Rack => &mut self.rack,
            NamingLevel::Shelf => &mut self.shelf,
            NamingLevel::Bin => &mut self.bin,
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            warehouse: warehouse_naming(),
            zone: zone_naming(),
            rack: rack_naming(),
            shelf: shelf_naming(),
            bin: bin_naming(),
        }
    }
}

/// Behavior flags controlling code generation and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct BehaviorFlags {
    /// Generate segments and codes automatically.
    pub auto_generate_enabled: bool,
    /// Keep a caller-supplied code instead of generating one.
    pub allow_manual_override: bool,
    /// Reject a location whose resolved code already exists.
    pub enforce_unique_codes: bool,
    /// Enforce parent presence and parent type for nested locations.
    pub enable_hierarchy_validation: bool,
}

impl Default for BehaviorFlags {
    fn default() -> Self {
        Self {
            auto_generate_enabled: true,
            allow_manual_override: false,
            enforce_unique_codes: true,
            enable_hierarchy_validation: true,
        }
    }
}

/// Aggregate counters maintained as a side effect of location inserts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    /// Number of stored locations.
    pub total_locations: u64,
    /// When the first location was created.
    pub first_location_created_at: Option<DateTime<Utc>>,
    /// Set once the first location exists.
    pub system_initialized: bool,
    /// Last time the counters were refreshed.
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// The settings singleton held by the record store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub behavior: BehaviorFlags,
    #[serde(default)]
    pub stats: SystemStats,
}
