//! Domain models for the registry.

pub mod item_group;
pub mod location;
pub mod settings;
pub mod uom;

pub use item_group::{ItemGroup, NewItemGroup};
pub use location::{Ancestry, Location, LocationField, NewLocation};
pub use settings::{BehaviorFlags, LevelNaming, NamingConfig, StoreSettings, SystemStats};
pub use uom::{NewUom, Uom, UomType};
