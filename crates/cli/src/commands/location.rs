//! Location management commands.
//!
//! # Usage
//!
//! ```bash
//! ts-cli location add --type Warehouse
//! ts-cli location add --type Zone --parent WH-1
//! ts-cli location list --type Zone
//! ts-cli location next --type Rack --parent WH-1-Z-A
//! ts-cli location update WH-1 --description "Main warehouse"
//! ```

use tracing::info;

use tech_store_core::{LocationCode, LocationType};
use tech_store_registry::config::RegistryConfig;
use tech_store_registry::db::{LocationFilter, RepositoryError};
use tech_store_registry::models::NewLocation;

use super::{load_store, location_service, save_store};

/// Arguments of `location add`.
pub struct AddArgs {
    pub location_type: LocationType,
    pub parent: Option<LocationCode>,
    pub segment: Option<String>,
    pub code: Option<LocationCode>,
    pub description: Option<String>,
}

/// Create a location through the insert pipeline.
///
/// # Errors
///
/// Returns an error if validation fails or the snapshot cannot be written.
pub async fn add(config: &RegistryConfig, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config).await?;
    let service = location_service(config, &store);

    let mut new = NewLocation::of_type(args.location_type);
    new.parent = args.parent;
    new.segment_name = args.segment;
    new.code = args.code;
    new.description = args.description;

    let location = service.create(new)?;
    save_store(config, &store).await?;

    let code = location
        .code
        .as_ref()
        .map_or_else(String::new, ToString::to_string);
    info!("Created {} {code}", location.location_type);
    info!("  Display name: {}", location.display_name);
    Ok(())
}

/// List locations, optionally filtered by type and parent.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded.
pub async fn list(
    config: &RegistryConfig,
    location_type: Option<LocationType>,
    parent: Option<LocationCode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config).await?;
    let service = location_service(config, &store);

    let filter = LocationFilter {
        location_type,
        parent,
        enabled_only: false,
    };
    let locations = service.list(&filter)?;

    info!("Locations ({})", locations.len());
    for location in &locations {
        let code = location
            .code
            .as_ref()
            .map_or_else(String::new, ToString::to_string);
        let state = if location.enabled { "" } else { " (disabled)" };
        info!(
            "  {code:<28} {:<10} {}{state}",
            location.location_type, location.display_name
        );
    }
    Ok(())
}

/// Show the segment and code the next location would receive.
///
/// # Errors
///
/// Returns an error if the parent is missing for a nested type.
pub async fn next(
    config: &RegistryConfig,
    location_type: LocationType,
    parent: Option<&LocationCode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config).await?;
    let preview = location_service(config, &store).preview_next_segment(location_type, parent)?;

    info!("Next {location_type}: {}", preview.code);
    info!("  Segment: {}", preview.segment);
    Ok(())
}

/// Update the mutable fields of a location; the display name is recomputed.
///
/// # Errors
///
/// Returns an error if the location does not exist or the snapshot cannot
/// be written.
pub async fn update(
    config: &RegistryConfig,
    code: &LocationCode,
    description: Option<String>,
    enabled: Option<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config).await?;
    let service = location_service(config, &store);

    let mut location = service.get(code)?.ok_or(RepositoryError::NotFound)?;
    if description.is_some() {
        location.description = description;
    }
    if let Some(enabled) = enabled {
        location.enabled = enabled;
    }

    let saved = service.save(location)?;
    save_store(config, &store).await?;

    info!("Updated {code}");
    info!("  Display name: {}", saved.display_name);
    Ok(())
}
