//! Seed the store with demo master data, or remove it again.
//!
//! Reads a YAML catalogue of units of measure, item groups and a location
//! tree, validates it, and inserts it into an empty store. Location codes
//! are generated by the insert pipeline. Removal only proceeds while the
//! store holds exactly what the catalogue seeds.

use std::path::Path;

use tracing::{error, info};

use tech_store_registry::config::RegistryConfig;
use tech_store_registry::services::seeder::{
    DemoCatalog, remove_demo_data, seed_from_config, validate_catalog,
};

use super::{load_store, save_store};

/// Seed demo data from `file`, or from the bundled catalogue.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the catalogue is invalid,
/// or the store already holds data.
pub async fn demo_data(
    config: &RegistryConfig,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(file).await?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalogue validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let store = load_store(config).await?;
    let result = seed_from_config(&store, &catalog)?;
    save_store(config, &store).await?;

    info!("Seeding complete!");
    info!("  Units of measure: {}", result.uoms);
    info!("  Item groups: {}", result.item_groups);
    info!("  Locations: {}", result.locations);
    if result.skipped > 0 {
        info!("  Locations skipped (parent failed): {}", result.skipped);
    }

    if !result.errors.is_empty() {
        error!("  Errors: {}", result.errors.len());
        for (entry, err) in &result.errors {
            error!("    - {entry}: {err}");
        }
    }

    Ok(())
}

/// Remove demo data seeded from `file`, or from the bundled catalogue.
///
/// # Errors
///
/// Returns an error if the catalogue cannot be read or the store holds
/// anything other than exactly the catalogue's records.
pub async fn remove(
    config: &RegistryConfig,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(file).await?;
    let store = load_store(config).await?;

    let removed = remove_demo_data(store.as_ref(), &catalog)?;
    if removed.is_empty() {
        info!("No data to remove.");
        return Ok(());
    }
    save_store(config, &store).await?;

    info!("Demo data removed!");
    info!("  Units of measure: {}", removed.uoms);
    info!("  Item groups: {}", removed.item_groups);
    info!("  Locations: {}", removed.locations);
    Ok(())
}

async fn load_catalog(file: Option<&Path>) -> Result<DemoCatalog, Box<dyn std::error::Error>> {
    match file {
        Some(path) => {
            if !tokio::fs::try_exists(path).await? {
                return Err(format!("File not found: {}", path.display()).into());
            }
            info!(path = %path.display(), "Loading catalogue from file");
            let content = tokio::fs::read_to_string(path).await?;
            Ok(DemoCatalog::from_yaml(&content)?)
        }
        None => Ok(DemoCatalog::bundled()?),
    }
}
