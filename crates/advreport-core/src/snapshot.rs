//! Report snapshots: the decoded result of one report fetch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::action::ActionDescriptor;
use crate::item::{Item, ItemId};
use crate::query::SortOrder;

/// Backend-reported context: the active ordering plus anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascending: Option<bool>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ReportExtra {
    /// The sort the backend applied, if it reported one.
    pub fn sort(&self) -> Option<SortOrder> {
        self.order_by.as_ref().map(|field| SortOrder {
            field: field.clone(),
            ascending: self.ascending.unwrap_or(false),
        })
    }
}

/// One page of report data plus pagination and action metadata.
///
/// Created fresh on every fetch and never patched across fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Item>,

    #[serde(default)]
    pub item_count: u64,

    #[serde(default = "default_items_per_page")]
    pub items_per_page: u64,

    /// Column headers.
    #[serde(default)]
    pub header: Value,

    #[serde(default, deserialize_with = "null_as_default")]
    pub filter_fields: Vec<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub search_fields: Vec<Value>,

    #[serde(default)]
    pub filter_values: Value,

    #[serde(default)]
    pub searchable_columns: Value,

    #[serde(default)]
    pub show_action_bar: bool,

    #[serde(default)]
    pub multiple_actions: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub multiple_action_list: Vec<ActionDescriptor>,

    /// Actions applying to the report as a whole.
    #[serde(default, deserialize_with = "null_as_default")]
    pub report_action_list: Vec<ActionDescriptor>,

    #[serde(default = "default_true")]
    pub report_header_visible: bool,

    #[serde(default)]
    pub compact: bool,

    #[serde(default)]
    pub all_selected: bool,

    /// Every item matching the filter is selected, not just this page.
    #[serde(default)]
    pub all_selected_global: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub extra: ReportExtra,
}

fn default_items_per_page() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for ReportSnapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            items_per_page: default_items_per_page(),
            header: Value::Null,
            filter_fields: Vec::new(),
            search_fields: Vec::new(),
            filter_values: Value::Null,
            searchable_columns: Value::Null,
            show_action_bar: false,
            multiple_actions: false,
            multiple_action_list: Vec::new(),
            report_action_list: Vec::new(),
            report_header_visible: true,
            compact: false,
            all_selected: false,
            all_selected_global: false,
            extra: ReportExtra::default(),
        }
    }
}

impl ReportSnapshot {
    /// Number of pages: 0 for an empty report, otherwise
    /// `floor((item_count - 1) / items_per_page) + 1`.
    pub fn page_count(&self) -> u32 {
        page_count(self.item_count, self.items_per_page)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.item_id == id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| &i.item_id == id)
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.item_id == id)
    }

    /// Remove an item from the page. Returns the removed item.
    pub fn remove_item(&mut self, id: &ItemId) -> Option<Item> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter().map(|i| &i.item_id)
    }

    pub fn has_search(&self) -> bool {
        !self.filter_fields.is_empty() || !self.search_fields.is_empty()
    }
}

/// Page count for `item_count` items at `items_per_page` per page.
pub fn page_count(item_count: u64, items_per_page: u64) -> u32 {
    if item_count == 0 {
        return 0;
    }
    let per_page = items_per_page.max(1);
    let pages = (item_count - 1) / per_page + 1;
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(21, 10), 3);
    }

    #[test]
    fn test_decode_backend_report() {
        let report: ReportSnapshot = serde_json::from_value(json!({
            "header": [["name", "Name"]],
            "items": [
                {"item_id": 1, "values": ["a"], "extra_information": "", "actions": []},
                {"item_id": 2, "values": ["b"], "extra_information": "", "actions": []}
            ],
            "item_count": 21,
            "items_per_page": 10,
            "filter_fields": null,
            "search_fields": ["name"],
            "multiple_actions": true,
            "multiple_action_list": [{"method": "archive", "confirm": "Sure?"}],
            "report_header_visible": true,
            "extra": {"order_by": "name", "ascending": true, "total": 3}
        }))
        .unwrap();

        assert_eq!(report.items.len(), 2);
        assert_eq!(report.page_count(), 3);
        assert!(report.filter_fields.is_empty());
        assert!(report.has_search());
        assert_eq!(report.extra.sort(), Some(SortOrder::ascending("name")));
        assert_eq!(report.extra.other.get("total"), Some(&json!(3)));
        assert!(report.multiple_action_list[0].requires_confirmation());
    }

    #[test]
    fn test_remove_item() {
        let mut report = ReportSnapshot {
            items: vec![Item::new("1"), Item::new("2"), Item::new("3")],
            ..ReportSnapshot::default()
        };
        let removed = report.remove_item(&ItemId::from("2")).unwrap();
        assert_eq!(removed.item_id, ItemId::from("2"));
        let ids: Vec<_> = report.item_ids().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(report.remove_item(&ItemId::from("9")).is_none());
    }
}
