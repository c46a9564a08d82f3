//! CLI command implementations.
//!
//! Every store-backed command loads the JSON snapshot, runs against an
//! in-memory store and writes the snapshot back when it changed something.

pub mod location;
pub mod roman;
pub mod seed;
pub mod stats;

use std::sync::Arc;

use tracing::{debug, info};

use tech_store_registry::config::RegistryConfig;
use tech_store_registry::db::MemoryStore;
use tech_store_registry::services::LocationService;

/// Load the store from the snapshot file, or bootstrap a fresh one.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_store(
    config: &RegistryConfig,
) -> Result<Arc<MemoryStore>, Box<dyn std::error::Error>> {
    let path = &config.data_file;
    if !tokio::fs::try_exists(path).await? {
        info!(path = %path.display(), "No snapshot found, starting a fresh store");
        return Ok(Arc::new(MemoryStore::with_settings(config.initial_settings())));
    }

    let json = tokio::fs::read_to_string(path).await?;
    let store = MemoryStore::from_json(&json)?;
    debug!(path = %path.display(), "Loaded snapshot");
    Ok(Arc::new(store))
}

/// Write the store back to the snapshot file.
///
/// # Errors
///
/// Returns an error if the store cannot be serialized or the file written.
pub async fn save_store(
    config: &RegistryConfig,
    store: &MemoryStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = store.to_json()?;
    tokio::fs::write(&config.data_file, json).await?;
    debug!(path = %config.data_file.display(), "Saved snapshot");
    Ok(())
}

/// Build a location service honoring the configured allocation attempts.
pub fn location_service(
    config: &RegistryConfig,
    store: &Arc<MemoryStore>,
) -> LocationService<MemoryStore> {
    LocationService::new(Arc::clone(store))
        .with_allocation_attempts(config.allocation_attempts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use tech_store_core::{LocationCode, LocationType};
    use tech_store_registry::db::{LocationStore, SettingsStore};
    use tech_store_registry::services::seeder::{DataCounts, DataStatus, DemoCatalog};

    use super::*;

    /// Config whose snapshot lives in a per-test scratch file.
    fn scratch_config(name: &str) -> RegistryConfig {
        let data_file: PathBuf =
            std::env::temp_dir().join(format!("ts-cli-{name}-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&data_file);
        RegistryConfig {
            data_file,
            ..RegistryConfig::default()
        }
    }

    fn add_args(location_type: LocationType, parent: Option<&str>) -> location::AddArgs {
        location::AddArgs {
            location_type,
            parent: parent.map(|p| LocationCode::parse(p).unwrap()),
            segment: None,
            code: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_location_add_persists_snapshot_and_stats() {
        let config = scratch_config("location-add");

        location::add(&config, add_args(LocationType::Warehouse, None))
            .await
            .unwrap();
        location::add(&config, add_args(LocationType::Zone, Some("WH-1")))
            .await
            .unwrap();
        location::update(
            &config,
            &LocationCode::parse("WH-1-Z-A").unwrap(),
            Some("Cold storage".to_owned()),
            None,
        )
        .await
        .unwrap();

        let store = load_store(&config).await.unwrap();
        let zone = store
            .get(&LocationCode::parse("WH-1-Z-A").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(zone.display_name, "WH-1 - Z-A");
        assert_eq!(zone.description.as_deref(), Some("Cold storage"));
        assert_eq!(store.settings().unwrap().stats.total_locations, 2);

        stats::stats(&config).await.unwrap();
        std::fs::remove_file(&config.data_file).unwrap();
    }

    #[tokio::test]
    async fn test_seed_then_remove_through_snapshot() {
        let config = scratch_config("seed-remove");
        let demo = DemoCatalog::bundled().unwrap().counts();

        seed::demo_data(&config, None).await.unwrap();
        let store = load_store(&config).await.unwrap();
        let counts = DataCounts::of(store.as_ref()).unwrap();
        assert_eq!(DataStatus::classify(counts, demo), DataStatus::Demo);

        // A second seed is refused while data exists.
        assert!(seed::demo_data(&config, None).await.is_err());

        seed::remove(&config, None).await.unwrap();
        let store = load_store(&config).await.unwrap();
        assert!(DataCounts::of(store.as_ref()).unwrap().is_empty());

        stats::status(&config).await.unwrap();
        std::fs::remove_file(&config.data_file).unwrap();
    }

    #[tokio::test]
    async fn test_remove_refuses_real_data() {
        let config = scratch_config("remove-real");
        location::add(&config, add_args(LocationType::Warehouse, None))
            .await
            .unwrap();

        assert!(seed::remove(&config, None).await.is_err());
        let store = load_store(&config).await.unwrap();
        assert_eq!(store.count().unwrap(), 1);
        std::fs::remove_file(&config.data_file).unwrap();
    }
}
