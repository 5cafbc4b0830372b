//! Action response decoding.
//!
//! A backend action response is classified into exactly one variant,
//! testing fields in a fixed priority order:
//!
//! 1. `link_action` - redirect to a regular view
//! 2. `success` - item update plus success message
//! 3. `response_form` - replacement form content (multi-step forms)
//! 4. `succeeded` / `failed` - per-item bulk outcome
//! 5. anything else - informational detail dialog
//!
//! Classification is total: unexpected shapes fall through to the
//! detail variant and are never errors.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::item::ItemId;

/// Nested link action of a redirect response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkAction {
    pub method: String,

    #[serde(default, deserialize_with = "object_or_empty")]
    pub data: Map<String, Value>,
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// A classified action response.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResponse {
    /// Navigate to the view of a nested link action.
    Redirect {
        link: LinkAction,
        /// Item the redirect applies to; absent for bulk redirects.
        item: Option<Value>,
    },

    /// The action succeeded.
    Success {
        message: String,
        /// Updated fields for the acted-on item. `None` means the item
        /// no longer belongs in this view.
        item: Option<Map<String, Value>>,
    },

    /// Replace the open form's content.
    ResponseForm(Value),

    /// Per-item outcome of a bulk action.
    BulkResult {
        succeeded: Map<String, Value>,
        failed: Map<String, Value>,
    },

    /// Anything else, shown as informational content.
    Detail {
        content: Value,
        style: Option<Value>,
    },
}

impl ActionResponse {
    /// Classify a raw response payload.
    pub fn classify(response: Value) -> Self {
        let Value::Object(fields) = response else {
            return ActionResponse::Detail {
                content: response,
                style: None,
            };
        };

        if let Some(link) = truthy_field(&fields, "link_action") {
            match LinkAction::deserialize(link) {
                Ok(link) => {
                    return ActionResponse::Redirect {
                        link,
                        item: truthy_field(&fields, "item").cloned(),
                    }
                }
                Err(e) => tracing::debug!("Ignoring malformed link_action: {}", e),
            }
        }

        if let Some(success) = truthy_field(&fields, "success") {
            let message = match success {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let item = match truthy_field(&fields, "item") {
                Some(Value::Object(map)) => Some(map.clone()),
                _ => None,
            };
            return ActionResponse::Success { message, item };
        }

        if let Some(form) = truthy_field(&fields, "response_form") {
            return ActionResponse::ResponseForm(form.clone());
        }

        let succeeded = truthy_field(&fields, "succeeded");
        let failed = truthy_field(&fields, "failed");
        if succeeded.is_some() || failed.is_some() {
            return ActionResponse::BulkResult {
                succeeded: as_object(succeeded),
                failed: as_object(failed),
            };
        }

        let content = truthy_field(&fields, "dialog_content").cloned();
        let style = truthy_field(&fields, "dialog_style").cloned();
        ActionResponse::Detail {
            content: content.unwrap_or(Value::Object(fields)),
            style,
        }
    }

    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionResponse::Redirect { .. } => "redirect",
            ActionResponse::Success { .. } => "success",
            ActionResponse::ResponseForm(_) => "response_form",
            ActionResponse::BulkResult { .. } => "bulk_result",
            ActionResponse::Detail { .. } => "detail",
        }
    }
}

/// The item id carried by a redirect's `item` payload, if any.
pub fn payload_item_id(item: &Value) -> Option<ItemId> {
    item.get("item_id")
        .and_then(|id| ItemId::deserialize(id).ok())
}

/// Truthiness as the backend contract uses it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| is_truthy(v))
}

fn as_object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
