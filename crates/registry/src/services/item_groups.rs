//! Item group service: the category tree.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use tech_store_core::ItemGroupName;

use crate::db::{ItemGroupStore, RepositoryError, UomStore};
use crate::error::{RegistryError, ValidationError};
use crate::models::{ItemGroup, NewItemGroup};

/// Code used when a name has no usable characters.
const FALLBACK_CODE: &str = "GRP";
const SINGLE_WORD_CODE_LENGTH: usize = 5;
const MIN_INITIALS: usize = 3;
/// Highest numeric suffix tried before code generation gives up.
pub const MAX_CODE_SUFFIX: u32 = 999;

/// Derive the base code for a group name.
///
/// A single word keeps its first five characters; several words use their
/// initials, padded with the first three characters of the name when there
/// are fewer than three. Only `A-Z` and `0-9` survive.
///
/// ```
/// use tech_store_registry::services::item_groups::code_base;
///
/// assert_eq!(code_base("Electronics"), "ELECT");
/// assert_eq!(code_base("Personal Protective Equipment"), "PPE");
/// assert_eq!(code_base("Hand Tools"), "HANT");
/// ```
#[must_use]
pub fn code_base(name: &str) -> String {
    let name = name.trim();
    let words: Vec<&str> = name.split_whitespace().collect();

    let raw: String = if words.len() <= 1 {
        name.chars().take(SINGLE_WORD_CODE_LENGTH).collect()
    } else {
        let initials: String = words.iter().filter_map(|w| w.chars().next()).collect();
        if initials.chars().count() < MIN_INITIALS {
            let head: String = name.chars().take(MIN_INITIALS).collect();
            let rest: String = words.iter().skip(1).filter_map(|w| w.chars().next()).collect();
            head + &rest
        } else {
            initials
        }
    };

    let code: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();
    if code.is_empty() {
        FALLBACK_CODE.to_owned()
    } else {
        code
    }
}

/// Item group service over a record store.
pub struct ItemGroupService<S> {
    store: Arc<S>,
}

impl<S> Clone for ItemGroupService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ItemGroupService<S>
where
    S: ItemGroupStore + UomStore,
{
    /// Create a new item group service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch a group by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get(&self, name: &ItemGroupName) -> Result<Option<ItemGroup>, RegistryError> {
        Ok(self.store.get_group(name)?)
    }

    /// Generate a code unique among stored groups: the base code, then the
    /// base followed by 1, 2, ... up to [`MAX_CODE_SUFFIX`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ItemGroupCodeExhausted`] if every suffix is
    /// taken, or an error if the store cannot be read.
    pub fn generate_code(&self, name: &ItemGroupName) -> Result<String, RegistryError> {
        let base = code_base(name.as_str());
        if !self.store.group_code_exists(&base)? {
            return Ok(base);
        }
        for counter in 1..=MAX_CODE_SUFFIX {
            let candidate = format!("{base}{counter}");
            if !self.store.group_code_exists(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(ValidationError::ItemGroupCodeExhausted {
            base,
            max: MAX_CODE_SUFFIX,
        }
        .into())
    }

    /// Create a group.
    ///
    /// Empty defaults and tracking flags are inherited from the parent.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is taken, the parent is
    /// missing or not a group, or the default unit does not exist.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub fn create(&self, new: NewItemGroup) -> Result<ItemGroup, RegistryError> {
        if self.store.get_group(&new.name)?.is_some() {
            return Err(ValidationError::DuplicateItemGroup(new.name).into());
        }

        let parent = match &new.parent {
            Some(parent_name) => {
                if *parent_name == new.name {
                    return Err(ValidationError::CircularReference(new.name).into());
                }
                Some(self.group_parent(parent_name)?)
            }
            None => None,
        };

        if let Some(uom) = &new.default_uom
            && self.store.get_uom(uom)?.is_none()
        {
            return Err(ValidationError::DefaultUomNotFound(uom.clone()).into());
        }

        let code = match new.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_uppercase(),
            _ => self.generate_code(&new.name)?,
        };

        let now = Utc::now();
        let mut group = ItemGroup {
            name: new.name,
            code,
            parent: new.parent,
            is_group: new.is_group,
            description: new.description,
            default_uom: new.default_uom,
            default_warehouse: new.default_warehouse,
            has_serial_no: new.has_serial_no,
            has_batch_no: new.has_batch_no,
            allow_negative_stock: new.allow_negative_stock,
            auto_create_bins: new.auto_create_bins,
            child_group_count: 0,
            item_count: 0,
            total_item_count: 0,
            created_at: now,
            updated_at: now,
        };
        if let Some(parent) = &parent {
            inherit_from(&mut group, parent);
        }

        let name = group.name.clone();
        let stored = match self.store.insert_group(group) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict(_)) => {
                return Err(ValidationError::DuplicateItemGroup(name).into());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(parent) = &stored.parent {
            self.refresh_child_count(parent);
        }
        info!(code = %stored.code, "Created item group");
        Ok(stored)
    }

    /// Move a group under a new parent, or to the root with `None`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either group is missing, the new parent
    /// is not a group, or the move would create a cycle.
    #[instrument(skip(self))]
    pub fn move_group(
        &self,
        name: &ItemGroupName,
        new_parent: Option<&ItemGroupName>,
    ) -> Result<ItemGroup, RegistryError> {
        let mut group = self.require(name)?;

        if let Some(parent_name) = new_parent {
            self.group_parent(parent_name)?;
            self.ensure_not_descendant(name, parent_name)?;
        }

        let old_parent = group.parent.take();
        group.parent = new_parent.cloned();
        group.updated_at = Utc::now();
        let stored = self.store.update_group(group)?;

        for parent in old_parent.iter().chain(new_parent) {
            self.refresh_child_count(parent);
            self.refresh_totals(parent);
        }
        Ok(stored)
    }

    /// Delete a group that holds no items and has no sub-groups.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::GroupHasItems`] if items are filed under
    /// the group, [`ValidationError::GroupHasChildren`] if sub-groups remain,
    /// or [`ValidationError::ItemGroupNotFound`].
    #[instrument(skip(self))]
    pub fn delete(&self, name: &ItemGroupName) -> Result<ItemGroup, RegistryError> {
        let group = self.require(name)?;

        let items = self.store.item_count(name)?;
        if items > 0 {
            return Err(ValidationError::GroupHasItems {
                name: name.clone(),
                count: items,
            }
            .into());
        }

        let children = self.store.child_groups(Some(name))?;
        if !children.is_empty() {
            return Err(ValidationError::GroupHasChildren {
                name: name.clone(),
                count: u32::try_from(children.len()).unwrap_or(u32::MAX),
            }
            .into());
        }

        let removed = self.store.delete_group(name)?;
        if let Some(parent) = &group.parent {
            self.refresh_child_count(parent);
            self.refresh_totals(parent);
        }
        info!("Deleted item group");
        Ok(removed)
    }

    /// Recalculate the item statistics of `name`, then of each ancestor.
    ///
    /// `item_count` comes from the store; `total_item_count` adds the stored
    /// totals of the immediate children, so refreshing from a leaf upwards
    /// keeps the whole chain consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ItemGroupNotFound`] for an unknown group,
    /// or an error if the store cannot be read or written.
    #[instrument(skip(self))]
    pub fn refresh_item_counts(&self, name: &ItemGroupName) -> Result<ItemGroup, RegistryError> {
        let group = self.recount_items(name)?;

        let mut seen = HashSet::from([name.clone()]);
        let mut parent = group.parent.clone();
        while let Some(current) = parent {
            if !seen.insert(current.clone()) {
                break;
            }
            parent = self.recount_items(&current)?.parent;
        }
        Ok(group)
    }

    /// Recalculate the item statistics of every group, leaves first.
    ///
    /// Returns the number of groups refreshed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    #[instrument(skip(self))]
    pub fn recalculate_all_item_counts(&self) -> Result<usize, RegistryError> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = self.store.child_groups(None)?;
        while let Some(group) = stack.pop() {
            if seen.insert(group.name.clone()) {
                stack.extend(self.store.child_groups(Some(&group.name))?);
                order.push(group.name);
            }
        }

        for name in order.iter().rev() {
            self.recount_items(name)?;
        }
        info!(groups = order.len(), "Recalculated item group statistics");
        Ok(order.len())
    }

    /// Names from the root down to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ItemGroupNotFound`] for an unknown group
    /// and [`RepositoryError::DataCorruption`] if the stored chain loops.
    pub fn hierarchy_path(&self, name: &ItemGroupName) -> Result<Vec<ItemGroupName>, RegistryError> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(self.require(name)?);

        while let Some(group) = current {
            if !seen.insert(group.name.clone()) {
                return Err(RepositoryError::DataCorruption(format!(
                    "item group chain loops at {}",
                    group.name
                ))
                .into());
            }
            current = match &group.parent {
                Some(parent) => self.store.get_group(parent)?,
                None => None,
            };
            path.push(group.name);
        }

        path.reverse();
        Ok(path)
    }

    /// Every group below `name`, depth first.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ItemGroupNotFound`] for an unknown group.
    pub fn descendants(&self, name: &ItemGroupName) -> Result<Vec<ItemGroupName>, RegistryError> {
        self.require(name)?;

        let mut found = Vec::new();
        let mut seen = HashSet::from([name.clone()]);
        let mut stack = vec![name.clone()];
        while let Some(current) = stack.pop() {
            let children = self.store.child_groups(Some(&current))?;
            // Reversed so the first child is visited first.
            for child in children.into_iter().rev() {
                if seen.insert(child.name.clone()) {
                    stack.push(child.name);
                }
            }
            if current != *name {
                found.push(current);
            }
        }
        Ok(found)
    }

    fn require(&self, name: &ItemGroupName) -> Result<ItemGroup, RegistryError> {
        self.store
            .get_group(name)?
            .ok_or_else(|| ValidationError::ItemGroupNotFound(name.clone()).into())
    }

    /// Load a prospective parent and check that it can hold sub-groups.
    fn group_parent(&self, name: &ItemGroupName) -> Result<ItemGroup, RegistryError> {
        let parent = self.require(name)?;
        if !parent.is_group {
            return Err(ValidationError::ParentNotGroup(name.clone()).into());
        }
        Ok(parent)
    }

    /// Walk up from `parent`; reaching `name` means `parent` is below it.
    fn ensure_not_descendant(
        &self,
        name: &ItemGroupName,
        parent: &ItemGroupName,
    ) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        let mut current = Some(parent.clone());
        while let Some(ancestor) = current {
            if ancestor == *name || !seen.insert(ancestor.clone()) {
                return Err(ValidationError::CircularReference(name.clone()).into());
            }
            current = self
                .store
                .get_group(&ancestor)?
                .and_then(|group| group.parent);
        }
        Ok(())
    }

    /// Recount the immediate children of `name`. Best effort.
    fn refresh_child_count(&self, name: &ItemGroupName) {
        if let Err(e) = self.recount_children(name) {
            warn!(group = %name, error = %e, "Failed to refresh child group count");
        }
    }

    /// Refresh item totals from `name` upwards. Best effort.
    fn refresh_totals(&self, name: &ItemGroupName) {
        if let Err(e) = self.refresh_item_counts(name) {
            warn!(group = %name, error = %e, "Failed to refresh item group totals");
        }
    }

    fn recount_items(&self, name: &ItemGroupName) -> Result<ItemGroup, RegistryError> {
        let mut group = self.require(name)?;
        let below = self
            .store
            .child_groups(Some(name))?
            .iter()
            .fold(0_u64, |sum, child| sum.saturating_add(child.total_item_count));

        group.item_count = self.store.item_count(name)?;
        group.total_item_count = group.item_count.saturating_add(below);
        group.updated_at = Utc::now();
        Ok(self.store.update_group(group)?)
    }

    fn recount_children(&self, name: &ItemGroupName) -> Result<(), RepositoryError> {
        let Some(mut group) = self.store.get_group(name)? else {
            return Ok(());
        };
        let count = self.store.child_groups(Some(name))?.len();
        group.child_group_count = u32::try_from(count).unwrap_or(u32::MAX);
        group.updated_at = Utc::now();
        self.store.update_group(group)?;
        Ok(())
    }
}

/// Copy empty defaults and unset flags from `parent`.
fn inherit_from(group: &mut ItemGroup, parent: &ItemGroup) {
    if group.default_uom.is_none() {
        group.default_uom.clone_from(&parent.default_uom);
    }
    if group.default_warehouse.is_none() {
        group.default_warehouse.clone_from(&parent.default_warehouse);
    }
    group.has_serial_no |= parent.has_serial_no;
    group.has_batch_no |= parent.has_batch_no;
    group.allow_negative_stock |= parent.allow_negative_stock;
    group.auto_create_bins |= parent.auto_create_bins;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tech_store_core::UomName;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewUom, UomType};
    use crate::services::uoms::UomService;

    fn name(s: &str) -> ItemGroupName {
        ItemGroupName::parse(s).unwrap()
    }

    fn service() -> ItemGroupService<MemoryStore> {
        ItemGroupService::new(Arc::new(MemoryStore::new()))
    }

    /// All Items > Tools > Hand Tools, with Tools and All Items as groups.
    fn tree(service: &ItemGroupService<MemoryStore>) {
        service
            .create(NewItemGroup::named(name("All Items")).as_group())
            .unwrap();
        service
            .create(NewItemGroup::named(name("Tools")).as_group().under(name("All Items")))
            .unwrap();
        service
            .create(NewItemGroup::named(name("Hand Tools")).under(name("Tools")))
            .unwrap();
    }

    #[test]
    fn test_code_base() {
        assert_eq!(code_base("Electronics"), "ELECT");
        assert_eq!(code_base("Raw Materials"), "RAWM");
        assert_eq!(code_base("Office Supplies & Stationery"), "OSS");
        assert_eq!(code_base("IT"), "IT");
        assert_eq!(code_base("***"), "GRP");
    }

    #[test]
    fn test_generated_codes_are_unique() {
        let service = service();
        let first = service.create(NewItemGroup::named(name("Electronics"))).unwrap();
        let second = service
            .create(NewItemGroup::named(name("Electrical")))
            .unwrap();
        let third = service
            .create(NewItemGroup::named(name("Electric Motors Etc")))
            .unwrap();

        assert_eq!(first.code, "ELECT");
        assert_eq!(second.code, "ELECT1");
        assert_eq!(third.code, "EME");
    }

    #[test]
    fn test_duplicate_name() {
        let service = service();
        service.create(NewItemGroup::named(name("Tools"))).unwrap();
        let err = service
            .create(NewItemGroup::named(name("Tools")))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::DuplicateItemGroup(name("Tools")))
        );
    }

    #[test]
    fn test_parent_must_be_group() {
        let service = service();
        service.create(NewItemGroup::named(name("Leaf"))).unwrap();
        let err = service
            .create(NewItemGroup::named(name("Child")).under(name("Leaf")))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::ParentNotGroup(name("Leaf")))
        );

        let err = service
            .create(NewItemGroup::named(name("Orphan")).under(name("Nowhere")))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::ItemGroupNotFound(name("Nowhere")))
        );
    }

    #[test]
    fn test_inheritance_from_parent() {
        let store = Arc::new(MemoryStore::new());
        UomService::new(Arc::clone(&store))
            .create(NewUom::new(UomName::parse("Each").unwrap(), "Ea", UomType::Quantity))
            .unwrap();
        let service = ItemGroupService::new(store);

        let mut parent = NewItemGroup::named(name("Electronics")).as_group();
        parent.default_uom = Some(UomName::parse("Each").unwrap());
        parent.has_serial_no = true;
        service.create(parent).unwrap();

        let child = service
            .create(NewItemGroup::named(name("Laptops")).under(name("Electronics")))
            .unwrap();
        assert_eq!(child.default_uom, Some(UomName::parse("Each").unwrap()));
        assert!(child.has_serial_no);
        assert!(!child.has_batch_no);
    }

    #[test]
    fn test_unknown_default_uom() {
        let service = service();
        let mut group = NewItemGroup::named(name("Fluids"));
        group.default_uom = Some(UomName::parse("Liter").unwrap());
        let err = service.create(group).unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::DefaultUomNotFound(_))
        ));
    }

    #[test]
    fn test_child_counts_follow_changes() {
        let service = service();
        tree(&service);
        assert_eq!(
            service.get(&name("All Items")).unwrap().unwrap().child_group_count,
            1
        );
        assert_eq!(
            service.get(&name("Tools")).unwrap().unwrap().child_group_count,
            1
        );

        service.delete(&name("Hand Tools")).unwrap();
        assert_eq!(
            service.get(&name("Tools")).unwrap().unwrap().child_group_count,
            0
        );
    }

    #[test]
    fn test_delete_with_children_is_rejected() {
        let service = service();
        tree(&service);
        let err = service.delete(&name("Tools")).unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::GroupHasChildren {
                name: name("Tools"),
                count: 1,
            })
        );
    }

    #[test]
    fn test_delete_with_items_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = ItemGroupService::new(Arc::clone(&store));
        tree(&service);
        store.set_item_count(&name("Hand Tools"), 4).unwrap();

        let err = service.delete(&name("Hand Tools")).unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::GroupHasItems {
                name: name("Hand Tools"),
                count: 4,
            })
        );
        assert!(service.get(&name("Hand Tools")).unwrap().is_some());

        store.set_item_count(&name("Hand Tools"), 0).unwrap();
        service.delete(&name("Hand Tools")).unwrap();
    }

    #[test]
    fn test_item_counts_roll_up() {
        let store = Arc::new(MemoryStore::new());
        let service = ItemGroupService::new(Arc::clone(&store));
        tree(&service);
        store.set_item_count(&name("Hand Tools"), 5).unwrap();
        store.set_item_count(&name("Tools"), 2).unwrap();

        let leaf = service.refresh_item_counts(&name("Hand Tools")).unwrap();
        assert_eq!((leaf.item_count, leaf.total_item_count), (5, 5));

        let tools = service.get(&name("Tools")).unwrap().unwrap();
        assert_eq!((tools.item_count, tools.total_item_count), (2, 7));
        let root = service.get(&name("All Items")).unwrap().unwrap();
        assert_eq!((root.item_count, root.total_item_count), (0, 7));

        // Moving the subtree away takes its items out of the root's total.
        service.move_group(&name("Tools"), None).unwrap();
        let root = service.get(&name("All Items")).unwrap().unwrap();
        assert_eq!(root.total_item_count, 0);
    }

    #[test]
    fn test_recalculate_all_item_counts() {
        let store = Arc::new(MemoryStore::new());
        let service = ItemGroupService::new(Arc::clone(&store));
        tree(&service);
        store.set_item_count(&name("Hand Tools"), 3).unwrap();
        store.set_item_count(&name("All Items"), 1).unwrap();

        assert_eq!(service.recalculate_all_item_counts().unwrap(), 3);
        let root = service.get(&name("All Items")).unwrap().unwrap();
        assert_eq!((root.item_count, root.total_item_count), (1, 4));
    }

    #[test]
    fn test_code_suffix_is_capped() {
        let store = Arc::new(MemoryStore::new());
        let service = ItemGroupService::new(Arc::clone(&store));
        let now = Utc::now();
        let taken = std::iter::once("TOOLS".to_owned())
            .chain((1..=MAX_CODE_SUFFIX).map(|n| format!("TOOLS{n}")));
        for (i, code) in taken.enumerate() {
            store
                .insert_group(ItemGroup {
                    name: name(&format!("Taken {i}")),
                    code,
                    parent: None,
                    is_group: false,
                    description: None,
                    default_uom: None,
                    default_warehouse: None,
                    has_serial_no: false,
                    has_batch_no: false,
                    allow_negative_stock: false,
                    auto_create_bins: false,
                    child_group_count: 0,
                    item_count: 0,
                    total_item_count: 0,
                    created_at: now,
                    updated_at: now,
                })
                .unwrap();
        }

        let err = service.generate_code(&name("Tools")).unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::ItemGroupCodeExhausted {
                base: "TOOLS".to_owned(),
                max: MAX_CODE_SUFFIX,
            })
        );
    }

    #[test]
    fn test_hierarchy_path_and_descendants() {
        let service = service();
        tree(&service);

        assert_eq!(
            service.hierarchy_path(&name("Hand Tools")).unwrap(),
            vec![name("All Items"), name("Tools"), name("Hand Tools")]
        );
        assert_eq!(
            service.descendants(&name("All Items")).unwrap(),
            vec![name("Tools"), name("Hand Tools")]
        );
        assert!(service.descendants(&name("Hand Tools")).unwrap().is_empty());
    }

    #[test]
    fn test_move_into_descendant_is_circular() {
        let service = service();
        tree(&service);
        let err = service
            .move_group(&name("All Items"), Some(&name("Tools")))
            .unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::CircularReference(name("All Items")))
        );
    }

    #[test]
    fn test_move_to_root() {
        let service = service();
        tree(&service);
        let moved = service.move_group(&name("Tools"), None).unwrap();
        assert_eq!(moved.parent, None);
        assert_eq!(
            service.get(&name("All Items")).unwrap().unwrap().child_group_count,
            0
        );
        assert_eq!(
            service.hierarchy_path(&name("Hand Tools")).unwrap(),
            vec![name("Tools"), name("Hand Tools")]
        );
    }
}
