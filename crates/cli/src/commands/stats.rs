//! Statistics and data status commands.

use tracing::info;

use tech_store_registry::config::RegistryConfig;
use tech_store_registry::db::SettingsStore;
use tech_store_registry::services::seeder::{DataCounts, DataStatus, DemoCatalog};

use super::load_store;

/// Show the system statistics kept on the settings record.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded.
pub async fn stats(config: &RegistryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config).await?;
    let stats = store.settings()?.stats;

    info!("System Statistics");
    info!("=================");
    info!("Total locations: {}", stats.total_locations);
    info!("Initialized: {}", stats.system_initialized);
    if let Some(first) = stats.first_location_created_at {
        info!("First location created: {}", first.to_rfc3339());
    }
    if let Some(last) = stats.last_sync_at {
        info!("Last sync: {}", last.to_rfc3339());
    }

    Ok(())
}

/// Show whether the store is empty, holds the demo catalogue, or real data.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded.
pub async fn status(config: &RegistryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config).await?;
    let counts = DataCounts::of(store.as_ref())?;
    let status = DataStatus::classify(counts, DemoCatalog::bundled()?.counts());

    info!("Data status: {status}");
    info!("  Units of measure: {}", counts.uoms);
    info!("  Item groups: {}", counts.item_groups);
    info!("  Locations: {}", counts.locations);

    Ok(())
}
