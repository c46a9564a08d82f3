//! Item group (category tree) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tech_store_core::{ItemGroupName, LocationCode, UomName};

/// A node of the item category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ItemGroup {
    pub name: ItemGroupName,
    /// Short unique code derived from the name (`ELECT`, `HT`).
    pub code: String,
    pub parent: Option<ItemGroupName>,
    /// Only groups may have children.
    pub is_group: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_uom: Option<UomName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_warehouse: Option<LocationCode>,
    #[serde(default)]
    pub has_serial_no: bool,
    #[serde(default)]
    pub has_batch_no: bool,
    #[serde(default)]
    pub allow_negative_stock: bool,
    #[serde(default)]
    pub auto_create_bins: bool,
    /// Number of immediate child groups.
    #[serde(default)]
    pub child_group_count: u32,
    /// Items filed directly under this group.
    #[serde(default)]
    pub item_count: u64,
    /// Items in this group and every group below it.
    #[serde(default)]
    pub total_item_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct NewItemGroup {
    pub name: ItemGroupName,
    /// Explicit code; generated from the name when absent.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub parent: Option<ItemGroupName>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_uom: Option<UomName>,
    #[serde(default)]
    pub default_warehouse: Option<LocationCode>,
    #[serde(default)]
    pub has_serial_no: bool,
    #[serde(default)]
    pub has_batch_no: bool,
    #[serde(default)]
    pub allow_negative_stock: bool,
    #[serde(default)]
    pub auto_create_bins: bool,
}

impl NewItemGroup {
    /// Input with only a name.
    #[must_use]
    pub const fn named(name: ItemGroupName) -> Self {
        Self {
            name,
            code: None,
            parent: None,
            is_group: false,
            description: None,
            default_uom: None,
            default_warehouse: None,
            has_serial_no: false,
            has_batch_no: false,
            allow_negative_stock: false,
            auto_create_bins: false,
        }
    }

    /// Mark the new record as a group that can hold sub-groups.
    #[must_use]
    pub const fn as_group(mut self) -> Self {
        self.is_group = true;
        self
    }

    /// Set the parent group.
    #[must_use]
    pub fn under(mut self, parent: ItemGroupName) -> Self {
        self.parent = Some(parent);
        self
    }
}
