//! Business logic over the record stores.
//!
//! - [`locations`]: the location insert/save pipeline
//! - [`code_builder`], [`hierarchy`], [`stats`]: the pipeline stages
//! - [`item_groups`], [`uoms`]: category tree and units of measure
//! - [`seeder`]: demo master data

pub mod code_builder;
pub mod hierarchy;
pub mod item_groups;
pub mod locations;
pub mod seeder;
pub mod stats;
pub mod uoms;

pub use item_groups::ItemGroupService;
pub use locations::{LocationService, SegmentPreview};
pub use seeder::{DataCounts, DataStatus, DemoCatalog, SeedError, SeedResult};
pub use stats::StatsError;
pub use uoms::UomService;
