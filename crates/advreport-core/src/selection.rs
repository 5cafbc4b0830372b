//! Multi-select tracking across a report page.

use crate::item::{Item, ItemId};

/// Bulk-action request parameters derived from a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkParams {
    pub report_method: String,
    /// Comma-joined ids currently marked selected.
    pub items: String,
    /// Act on everything matching the filter, not only `items`.
    pub global: bool,
}

/// Selected item ids in insertion order.
///
/// Entries may be soft-deselected (marked `false`) by the view before a
/// sweep with [`SelectionTracker::prune_unselected`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    entries: Vec<(ItemId, bool)>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id. Unknown ids become selected.
    pub fn toggle(&mut self, id: &ItemId) {
        match self.entries.iter_mut().find(|(k, _)| k == id) {
            Some(entry) => entry.1 = !entry.1,
            None => self.entries.push((id.clone(), true)),
        }
    }

    /// Mark one id explicitly, keeping its position if already present.
    pub fn set(&mut self, id: &ItemId, selected: bool) {
        match self.entries.iter_mut().find(|(k, _)| k == id) {
            Some(entry) => entry.1 = selected,
            None => self.entries.push((id.clone(), selected)),
        }
    }

    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.entries.iter().any(|(k, v)| k == id && *v)
    }

    pub fn select_all(&mut self, items: &[Item]) {
        for item in items {
            self.set(&item.item_id, true);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Follow the "select all" checkbox: all fetched ids, or nothing.
    pub fn sync_from_all_selected_flag(&mut self, all_selected: bool, items: &[Item]) {
        if all_selected {
            self.select_all(items);
        } else {
            self.clear();
        }
    }

    /// Drop entries marked `false`.
    pub fn prune_unselected(&mut self) {
        self.entries.retain(|(_, selected)| *selected);
    }

    /// Number of ids currently marked selected.
    pub fn count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| *v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.entries.iter().filter(|(_, v)| *v).map(|(k, _)| k)
    }

    /// Parameters for a bulk action on the current selection.
    pub fn to_action_params(&self, method: &str, all_selected_global: bool) -> BulkParams {
        let ids: Vec<&str> = self.selected_ids().map(ItemId::as_str).collect();
        BulkParams {
            report_method: method.to_string(),
            items: ids.join(","),
            global: all_selected_global,
        }
    }
}
