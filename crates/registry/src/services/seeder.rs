//! Demo master data: catalogue loading, seeding, removal and status
//! detection.
//!
//! The bundled catalogue holds units of measure, an item group tree and a
//! location tree. Locations carry no codes; they go through the normal
//! insert pipeline so the codes follow the store's naming settings.
//!
//! # Catalogue format
//!
//! ```yaml
//! uoms:
//!   - { name: Each, symbol: Ea, uom_type: Quantity, must_be_whole_number: true }
//! item_groups:
//!   - { name: All Item Groups, is_group: true }
//! locations:
//!   - location_type: Warehouse
//!     children:
//!       - { location_type: Zone }
//! ```

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use tech_store_core::{LocationCode, LocationType};

use crate::db::{
    ItemGroupStore, LocationFilter, LocationStore, RepositoryError, SettingsStore, UomStore,
};
use crate::error::RegistryError;
use crate::models::{NewItemGroup, NewLocation, NewUom};
use crate::services::item_groups::ItemGroupService;
use crate::services::locations::LocationService;
use crate::services::uoms::UomService;

const BUNDLED_CATALOG: &str = include_str!("../../data/demo_catalog.yaml");

/// Errors that can occur while loading or seeding a catalogue.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to parse catalogue: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid catalogue: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("store already holds {0} data; refusing to seed")]
    NotEmpty(DataStatus),

    #[error("store holds {actual}, the demo catalogue has {demo}; refusing to remove")]
    NotDemo { actual: DataCounts, demo: DataCounts },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// =============================================================================
// Catalogue
// =============================================================================

/// A location node of the catalogue tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoLocation {
    pub location_type: LocationType,
    /// Explicit segment; allocated when absent.
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<Self>,
}

impl DemoLocation {
    fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Demo master data to seed into an empty store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoCatalog {
    #[serde(default)]
    pub uoms: Vec<NewUom>,
    #[serde(default)]
    pub item_groups: Vec<NewItemGroup>,
    #[serde(default)]
    pub locations: Vec<DemoLocation>,
}

impl DemoCatalog {
    /// Parse a catalogue from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Parse`] if the document is not a valid catalogue.
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The catalogue shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Parse`] if the bundled document is broken.
    pub fn bundled() -> Result<Self, SeedError> {
        Self::from_yaml(BUNDLED_CATALOG)
    }

    /// Record counts this catalogue produces when seeded.
    #[must_use]
    pub fn counts(&self) -> DataCounts {
        let locations = self.locations.iter().map(DemoLocation::count).sum::<usize>();
        DataCounts {
            uoms: u64::try_from(self.uoms.len()).unwrap_or(u64::MAX),
            item_groups: u64::try_from(self.item_groups.len()).unwrap_or(u64::MAX),
            locations: u64::try_from(locations).unwrap_or(u64::MAX),
        }
    }
}

/// Check a catalogue before seeding.
///
/// Entries must be unique and may only reference entries listed before
/// them; nested location types must sit under their parent type.
#[must_use]
pub fn validate_catalog(catalog: &DemoCatalog) -> Vec<String> {
    let mut errors = Vec::new();

    if catalog.uoms.is_empty() && catalog.item_groups.is_empty() && catalog.locations.is_empty() {
        errors.push("Catalogue is empty".to_owned());
    }

    let mut uoms = HashSet::new();
    for uom in &catalog.uoms {
        if let Some(base) = &uom.base_uom
            && !uoms.contains(base)
        {
            errors.push(format!(
                "Unit '{}' references base '{base}' before it is defined",
                uom.name
            ));
        }
        if !uoms.insert(uom.name.clone()) {
            errors.push(format!("Duplicate unit: {}", uom.name));
        }
    }

    let mut groups = HashSet::new();
    for group in &catalog.item_groups {
        if let Some(parent) = &group.parent
            && !groups.contains(parent)
        {
            errors.push(format!(
                "Item group '{}' references parent '{parent}' before it is defined",
                group.name
            ));
        }
        if let Some(uom) = &group.default_uom
            && !uoms.contains(uom)
        {
            errors.push(format!(
                "Item group '{}' uses unknown unit '{uom}'",
                group.name
            ));
        }
        if !groups.insert(group.name.clone()) {
            errors.push(format!("Duplicate item group: {}", group.name));
        }
    }

    for node in &catalog.locations {
        validate_location(node, None, &mut errors);
    }

    errors
}

fn validate_location(node: &DemoLocation, parent: Option<LocationType>, errors: &mut Vec<String>) {
    let ty = node.location_type;
    if ty.parent_type() != parent {
        match parent {
            Some(parent) => errors.push(format!("{ty} cannot be placed under a {parent}")),
            None => errors.push(format!("{ty} cannot be a top-level location")),
        }
    }
    for child in &node.children {
        validate_location(child, Some(ty), errors);
    }
}

// =============================================================================
// Status
// =============================================================================

/// Number of master-data records per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCounts {
    pub uoms: u64,
    pub item_groups: u64,
    pub locations: u64,
}

impl DataCounts {
    /// Count the records held by `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn of<S>(store: &S) -> Result<Self, RepositoryError>
    where
        S: LocationStore + ItemGroupStore + UomStore + ?Sized,
    {
        Ok(Self {
            uoms: store.uom_count()?,
            item_groups: store.group_count()?,
            locations: store.count()?,
        })
    }

    /// Whether no records exist at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.uoms == 0 && self.item_groups == 0 && self.locations == 0
    }
}

/// What kind of data a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    /// No master data.
    Empty,
    /// Exactly the demo catalogue.
    Demo,
    /// Anything else: real or partially seeded data.
    Real,
}

impl DataStatus {
    /// Classify `actual` counts against the counts the demo catalogue yields.
    #[must_use]
    pub fn classify(actual: DataCounts, demo: DataCounts) -> Self {
        if actual.is_empty() {
            Self::Empty
        } else if actual == demo {
            Self::Demo
        } else {
            Self::Real
        }
    }

    /// Stored name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Demo => "demo",
            Self::Real => "real",
        }
    }
}

impl fmt::Display for DataCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} units, {} item groups, {} locations",
            self.uoms, self.item_groups, self.locations
        )
    }
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Seeding
// =============================================================================

/// Result of a seeding operation.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub uoms: usize,
    pub item_groups: usize,
    pub locations: usize,
    /// Skipped subtrees whose parent location failed.
    pub skipped: usize,
    /// Failed entries as `(entry, error)`.
    pub errors: Vec<(String, String)>,
}

/// Seed `catalog` into an empty store.
///
/// Entries that fail are recorded in [`SeedResult::errors`] and seeding
/// continues; children of a failed location are skipped.
///
/// # Errors
///
/// Returns [`SeedError::Invalid`] if the catalogue does not validate and
/// [`SeedError::NotEmpty`] if the store already holds master data.
#[instrument(skip(store, catalog), fields(
    uoms = catalog.uoms.len(),
    item_groups = catalog.item_groups.len(),
    locations = catalog.locations.len()
))]
pub fn seed_from_config<S>(store: &Arc<S>, catalog: &DemoCatalog) -> Result<SeedResult, SeedError>
where
    S: LocationStore + SettingsStore + ItemGroupStore + UomStore,
{
    let problems = validate_catalog(catalog);
    if !problems.is_empty() {
        return Err(SeedError::Invalid(problems));
    }

    let counts = DataCounts::of(store.as_ref())?;
    if !counts.is_empty() {
        return Err(SeedError::NotEmpty(DataStatus::classify(
            counts,
            catalog.counts(),
        )));
    }

    let mut result = SeedResult::default();

    let uom_service = UomService::new(Arc::clone(store));
    for uom in &catalog.uoms {
        let name = uom.name.to_string();
        record(&mut result.uoms, &mut result.errors, name, uom_service.create(uom.clone()));
    }

    let group_service = ItemGroupService::new(Arc::clone(store));
    for group in &catalog.item_groups {
        let name = group.name.to_string();
        record(
            &mut result.item_groups,
            &mut result.errors,
            name,
            group_service.create(group.clone()),
        );
    }

    let location_service = LocationService::new(Arc::clone(store));
    for node in &catalog.locations {
        seed_location(&location_service, node, None, &mut result);
    }

    info!(
        uoms = result.uoms,
        item_groups = result.item_groups,
        locations = result.locations,
        skipped = result.skipped,
        errors = result.errors.len(),
        "Seeding complete"
    );

    Ok(result)
}

fn record<T>(
    inserted: &mut usize,
    errors: &mut Vec<(String, String)>,
    entry: String,
    outcome: Result<T, RegistryError>,
) {
    match outcome {
        Ok(_) => {
            *inserted += 1;
            debug!(entry = %entry, "Seeded");
        }
        Err(e) => {
            warn!(entry = %entry, error = %e, "Failed to seed entry");
            errors.push((entry, e.to_string()));
        }
    }
}

fn seed_location<S>(
    service: &LocationService<S>,
    node: &DemoLocation,
    parent: Option<&LocationCode>,
    result: &mut SeedResult,
) where
    S: LocationStore + SettingsStore,
{
    let mut new = NewLocation::of_type(node.location_type);
    new.parent = parent.cloned();
    new.segment_name.clone_from(&node.segment);
    new.description.clone_from(&node.description);

    match service.create(new) {
        Ok(stored) => {
            result.locations += 1;
            debug!(code = ?stored.code, "Seeded location");
            for child in &node.children {
                seed_location(service, child, stored.code.as_ref(), result);
            }
        }
        Err(e) => {
            let entry = match parent {
                Some(parent) => format!("{} under {parent}", node.location_type),
                None => node.location_type.to_string(),
            };
            warn!(entry = %entry, error = %e, "Failed to seed location");
            result.errors.push((entry, e.to_string()));
            result.skipped += node.children.iter().map(DemoLocation::count).sum::<usize>();
        }
    }
}

// =============================================================================
// Removal
// =============================================================================

/// Remove the demo master data seeded from `catalog`.
///
/// Only a store whose counts equal the catalogue's exactly is cleared, so
/// real records are never touched. An empty store is left alone. Locations
/// go first, children before parents, then item groups leaf first, then
/// derived units before their base units. The location total is recounted
/// afterwards.
///
/// Returns the number of records removed per kind.
///
/// # Errors
///
/// Returns [`SeedError::NotDemo`] if the counts differ from the catalogue,
/// or a repository error if a delete fails.
#[instrument(skip_all)]
pub fn remove_demo_data<S>(store: &S, catalog: &DemoCatalog) -> Result<DataCounts, SeedError>
where
    S: LocationStore + SettingsStore + ItemGroupStore + UomStore + ?Sized,
{
    let actual = DataCounts::of(store)?;
    let demo = catalog.counts();
    match DataStatus::classify(actual, demo) {
        DataStatus::Empty => {
            info!("No data to remove");
            return Ok(DataCounts::default());
        }
        DataStatus::Real => return Err(SeedError::NotDemo { actual, demo }),
        DataStatus::Demo => {}
    }

    let mut removed = DataCounts::default();

    // A child code always extends its parent's code.
    let mut locations = store.list(&LocationFilter::default())?;
    locations.sort_by_key(|location| {
        Reverse(location.code.as_ref().map_or(0, |code| code.as_str().len()))
    });
    for code in locations.into_iter().filter_map(|location| location.code) {
        store.delete(&code)?;
        removed.locations += 1;
    }

    let mut groups = Vec::new();
    let mut pending = store.child_groups(None)?;
    while let Some(group) = pending.pop() {
        pending.extend(store.child_groups(Some(&group.name))?);
        groups.push(group.name);
    }
    for name in groups.iter().rev() {
        store.delete_group(name)?;
        removed.item_groups += 1;
    }

    let (derived, base): (Vec<_>, Vec<_>) = store
        .list_uoms()?
        .into_iter()
        .partition(|uom| uom.base_uom.is_some());
    for uom in derived.into_iter().chain(base) {
        store.delete_uom(&uom.name)?;
        removed.uoms += 1;
    }

    store.update_settings(&mut |settings| {
        settings.stats.total_locations = store.count()?;
        Ok(())
    })?;

    info!(
        uoms = removed.uoms,
        item_groups = removed.item_groups,
        locations = removed.locations,
        "Demo data removed"
    );
    Ok(removed)
}
