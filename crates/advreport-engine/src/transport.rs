//! Backend transport for report views.
//!
//! The `ViewTransport` trait is the controller's only path to the backend.
//! It returns futures so the caller decides how to drive them, and it is
//! mockable for testing.
//!
//! ## Requests
//!
//! | action name       | params                                   |
//! |-------------------|------------------------------------------|
//! | `fetch`           | `{}` plus the query string               |
//! | `form`            | `{method, pk}`                           |
//! | `action`          | `{method, pk, data?}`                    |
//! | `multiple_action` | `{report_method, items, global, data?}`  |

use advreport_core::{BulkParams, ItemId, TransportError};
use futures::future::BoxFuture;
use serde_json::{Map, Value};

// =============================================================================
// Requests
// =============================================================================

/// One asynchronous call to the report view's backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewRequest {
    /// Retrieve a report snapshot.
    Fetch { query_string: String },

    /// Retrieve the form descriptor for an action.
    Form { method: String, pk: Option<ItemId> },

    /// Run a single-item action, optionally with submitted form data.
    Action {
        method: String,
        pk: Option<ItemId>,
        data: Option<String>,
    },

    /// Run a bulk action on a selection.
    MultipleAction {
        params: BulkParams,
        data: Option<String>,
    },
}

impl ViewRequest {
    /// Backend action name.
    pub fn action_name(&self) -> &'static str {
        match self {
            ViewRequest::Fetch { .. } => "fetch",
            ViewRequest::Form { .. } => "form",
            ViewRequest::Action { .. } => "action",
            ViewRequest::MultipleAction { .. } => "multiple_action",
        }
    }

    /// Request parameters as a JSON object.
    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        match self {
            ViewRequest::Fetch { .. } => {}
            ViewRequest::Form { method, pk } => {
                params.insert("method".into(), Value::String(method.clone()));
                params.insert("pk".into(), pk_value(pk.as_ref()));
            }
            ViewRequest::Action { method, pk, data } => {
                params.insert("method".into(), Value::String(method.clone()));
                params.insert("pk".into(), pk_value(pk.as_ref()));
                if let Some(data) = data {
                    params.insert("data".into(), Value::String(data.clone()));
                }
            }
            ViewRequest::MultipleAction { params: bulk, data } => {
                params = bulk_params_map(bulk);
                if let Some(data) = data {
                    params.insert("data".into(), Value::String(data.clone()));
                }
            }
        }
        params
    }

    pub fn query_string(&self) -> Option<&str> {
        match self {
            ViewRequest::Fetch { query_string } => Some(query_string),
            _ => None,
        }
    }

    /// The action method this request runs, if any.
    pub fn method(&self) -> Option<&str> {
        match self {
            ViewRequest::Fetch { .. } => None,
            ViewRequest::Form { method, .. } | ViewRequest::Action { method, .. } => Some(method),
            ViewRequest::MultipleAction { params, .. } => Some(&params.report_method),
        }
    }
}

fn pk_value(pk: Option<&ItemId>) -> Value {
    pk.map(|id| Value::String(id.to_string()))
        .unwrap_or(Value::Null)
}

/// `{report_method, items, global}` as a JSON object.
pub fn bulk_params_map(params: &BulkParams) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        "report_method".into(),
        Value::String(params.report_method.clone()),
    );
    map.insert("items".into(), Value::String(params.items.clone()));
    map.insert("global".into(), Value::Bool(params.global));
    map
}

// =============================================================================
// Links
// =============================================================================

/// Browser-navigable views used by link actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkView {
    /// Single-item action view.
    ActionView,
    /// Bulk action view.
    MultipleActionView,
}

impl LinkView {
    pub fn name(&self) -> &'static str {
        match self {
            LinkView::ActionView => "action_view",
            LinkView::MultipleActionView => "multiple_action_view",
        }
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Trait for backend operations.
///
/// Implementations own request concurrency limits, timeouts and retries;
/// the controller never retries.
pub trait ViewTransport: Send + Sync {
    /// Run a view action. Resolves to the decoded JSON response.
    fn action(&self, request: ViewRequest) -> BoxFuture<'static, Result<Value, TransportError>>;

    /// Build a browser-navigable URL for a link view.
    fn action_link(&self, view: LinkView, params: &Map<String, Value>) -> String;

    /// Fetch a raw content fragment (lazy content).
    fn get(&self, url: String) -> BoxFuture<'static, Result<String, TransportError>>;
}

// =============================================================================
// Mock Transport for Testing
// =============================================================================


#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_params() {
        let form = ViewRequest::Form {
            method: "edit".into(),
            pk: Some(ItemId::from("4")),
        };
        assert_eq!(form.action_name(), "form");
        assert_eq!(Value::Object(form.params()), json!({"method": "edit", "pk": "4"}));

        let action = ViewRequest::Action {
            method: "edit".into(),
            pk: None,
            data: Some("a=1".into()),
        };
        assert_eq!(
            Value::Object(action.params()),
            json!({"method": "edit", "pk": null, "data": "a=1"})
        );

        let bulk = ViewRequest::MultipleAction {
            params: BulkParams {
                report_method: "archive".into(),
                items: "1,2".into(),
                global: false,
            },
            data: None,
        };
        assert_eq!(bulk.action_name(), "multiple_action");
        assert_eq!(
            Value::Object(bulk.params()),
            json!({"report_method": "archive", "items": "1,2", "global": false})
        );
        assert_eq!(bulk.method(), Some("archive"));
    }

    #[test]
    fn test_fetch_request_carries_query_string() {
        let fetch = ViewRequest::Fetch {
            query_string: "?page=1".into(),
        };
        assert_eq!(fetch.query_string(), Some("?page=1"));
        assert!(fetch.params().is_empty());
    }

    #[tokio::test]
    async fn test_mock_transport_queue_and_log() {
        let transport = MockTransport::new()
            .respond("action", json!({"success": "ok"}))
            .fail("form", TransportError::Unavailable("down".into()));

        let ok = transport
            .action(ViewRequest::Action {
                method: "a".into(),
                pk: None,
                data: None,
            })
            .await;
        assert_eq!(ok.unwrap(), json!({"success": "ok"}));

        let err = transport
            .action(ViewRequest::Form {
                method: "a".into(),
                pk: None,
            })
            .await;
        assert!(err.is_err());

        let fetch = transport
            .action(ViewRequest::Fetch {
                query_string: "?".into(),
            })
            .await;
        assert_eq!(fetch.unwrap(), empty_report());

        assert_eq!(transport.calls().len(), 3);
    }

    #[test]
    fn test_mock_action_link() {
        let transport = MockTransport::new();
        let mut params = Map::new();
        params.insert("report_method".into(), json!("open"));
        params.insert("pk".into(), json!("5"));
        assert_eq!(
            transport.action_link(LinkView::ActionView, &params),
            "/action_view/?pk=5&report_method=open"
        );
    }
}
