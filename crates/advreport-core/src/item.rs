//! Report items.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::action::ActionDescriptor;
use crate::lazy::LazyDirective;

/// Opaque item identifier.
///
/// The backend emits ids as strings or integers; both decode to the same
/// textual form so ids can be joined into bulk parameters and compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => ItemId(s),
            RawId::Number(n) => ItemId(n.to_string()),
        })
    }
}

/// One row of a report.
///
/// Unknown keys sent by the backend are kept in `fields` so that shallow
/// merges from action responses round-trip everything the row carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,

    /// Column values, rendered by the view layer.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub values: Value,

    /// Expanded-row markup, possibly holding lazy-load directives.
    #[serde(default)]
    pub extra_information: String,

    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,

    /// UI-only expansion flag. Never sent or received.
    #[serde(skip)]
    pub expanded: bool,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    /// Create an item with only an id.
    pub fn new(item_id: impl Into<ItemId>) -> Self {
        Self {
            item_id: item_id.into(),
            values: Value::Null,
            extra_information: String::new(),
            actions: Vec::new(),
            expanded: false,
            fields: Map::new(),
        }
    }

    pub fn with_extra_information(mut self, markup: impl Into<String>) -> Self {
        self.extra_information = markup.into();
        self
    }

    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Look up one of this item's actions by method name.
    pub fn action(&self, method: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|a| a.method == method)
    }

    /// Lazy-load directives embedded in the expanded markup.
    pub fn lazy_directives(&self) -> Vec<LazyDirective> {
        LazyDirective::extract(&self.extra_information)
    }

    /// Shallow-merge an updated item payload onto this item.
    ///
    /// Every key in `update` overwrites the current value; keys absent from
    /// `update` are left untouched. The expansion flag is preserved.
    pub fn merge(&mut self, update: &Map<String, Value>) -> Result<(), serde_json::Error> {
        let expanded = self.expanded;
        let mut current = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in update {
            current.insert(key.clone(), value.clone());
        }

        let mut merged: Item = serde_json::from_value(Value::Object(current))?;
        merged.expanded = expanded;
        *self = merged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_id_from_number_and_string() {
        let a: ItemId = serde_json::from_value(json!(5)).unwrap();
        let b: ItemId = serde_json::from_value(json!("5")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "5");
    }

    #[test]
    fn test_item_decode_keeps_unknown_fields() {
        let item: Item = serde_json::from_value(json!({
            "item_id": 7,
            "values": ["a", "b"],
            "extra_information": "",
            "actions": [],
            "name": "seven"
        }))
        .unwrap();

        assert_eq!(item.item_id, ItemId::from("7"));
        assert_eq!(item.fields.get("name"), Some(&json!("seven")));
        assert!(!item.expanded);
    }

    #[test]
    fn test_merge_overwrites_returned_keys_only() {
        let mut item = Item::new("5").with_field("name", json!("a")).with_field("size", json!(3));
        item.expanded = true;

        let update = json!({"name": "b"});
        item.merge(update.as_object().unwrap()).unwrap();

        assert_eq!(item.item_id, ItemId::from("5"));
        assert_eq!(item.fields.get("name"), Some(&json!("b")));
        assert_eq!(item.fields.get("size"), Some(&json!(3)));
        assert!(item.expanded);
    }

    #[test]
    fn test_merge_updates_typed_fields() {
        let mut item = Item::new("1").with_extra_information("old");
        let update = json!({
            "extra_information": "new",
            "actions": [{"method": "archive"}]
        });
        item.merge(update.as_object().unwrap()).unwrap();

        assert_eq!(item.extra_information, "new");
        assert!(item.action("archive").is_some());
    }
}
