//! Action dispatch.
//!
//! Decides what invoking an action means: leave for a link, show a form,
//! ask for confirmation, or call the backend. Dispatch is pure; the
//! controller carries out the returned [`Dispatch`].
//!
//! Decision order for a single-item action:
//!
//! 1. has a form and no data was submitted -> show the form
//! 2. is a link action -> navigate to its view
//! 3. requires confirmation and not forced -> ask first
//! 4. otherwise -> execute

use advreport_core::{ActionDescriptor, BulkParams, FormSpec, ItemId};
use serde_json::{Map, Value};

use crate::state::{ConfirmSurface, FormSession, PendingConfirmation};
use crate::transport::{bulk_params_map, LinkView, ViewRequest, ViewTransport};

// =============================================================================
// Calls
// =============================================================================

/// What an action acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    Item(ItemId),
    Bulk,
}

impl ActionTarget {
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            ActionTarget::Item(id) => Some(id),
            ActionTarget::Bulk => None,
        }
    }
}

/// The action and target a response is interpreted against.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionContext {
    pub action: ActionDescriptor,
    pub target: ActionTarget,
}

/// A ready-to-send backend call plus its interpretation context.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    pub request: ViewRequest,
    pub context: ActionContext,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Outcome of dispatching an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Leave the report for a regular view.
    Navigate(String),

    /// Retrieve the form first, then open it.
    FetchForm {
        request: ViewRequest,
        session: FormSession,
    },

    /// Open a form whose content is already known.
    OpenForm(FormSession),

    /// Hold the call until the user confirms.
    Confirm(PendingConfirmation),

    /// Call the backend now.
    Execute(ActionCall),
}

impl Dispatch {
    pub fn kind(&self) -> &'static str {
        match self {
            Dispatch::Navigate(_) => "navigate",
            Dispatch::FetchForm { .. } => "fetch_form",
            Dispatch::OpenForm(_) => "open_form",
            Dispatch::Confirm(_) => "confirm",
            Dispatch::Execute(_) => "execute",
        }
    }
}

/// Stateless action dispatcher.
pub struct ActionDispatcher;

impl ActionDispatcher {
    /// Dispatch a single-item action.
    ///
    /// With `force` set, a required confirmation is skipped.
    pub fn dispatch_item(
        links: &dyn ViewTransport,
        item_id: &ItemId,
        action: &ActionDescriptor,
        force: bool,
    ) -> Dispatch {
        let target = ActionTarget::Item(item_id.clone());

        if action.form.is_some() {
            return Self::show_form(action, target);
        }

        if action.is_link_action() {
            let params = action_view_params(item_id, &action.method, &Map::new());
            return Dispatch::Navigate(links.action_link(LinkView::ActionView, &params));
        }

        let call = ActionCall {
            request: ViewRequest::Action {
                method: action.method.clone(),
                pk: Some(item_id.clone()),
                data: None,
            },
            context: ActionContext {
                action: action.clone(),
                target,
            },
        };
        Self::confirm_or_execute(call, ConfirmSurface::Single, force)
    }

    /// Dispatch a bulk action on `params`.
    ///
    /// `data` carries submitted form fields; without it an action with a
    /// form shows the form first.
    pub fn dispatch_bulk(
        links: &dyn ViewTransport,
        action: &ActionDescriptor,
        params: BulkParams,
        data: Option<String>,
    ) -> Dispatch {
        if action.form.is_some() && data.is_none() {
            return Self::show_form(action, ActionTarget::Bulk);
        }

        if action.is_link_action() && !action.form.is_some() {
            let mut extra = Map::new();
            if let Some(data) = &data {
                extra.insert("data".into(), Value::String(data.clone()));
            }
            let params = bulk_view_params(&params, &extra);
            return Dispatch::Navigate(links.action_link(LinkView::MultipleActionView, &params));
        }

        let call = ActionCall {
            request: ViewRequest::MultipleAction { params, data },
            context: ActionContext {
                action: action.clone(),
                target: ActionTarget::Bulk,
            },
        };
        Self::confirm_or_execute(call, ConfirmSurface::Bulk, false)
    }

    /// Show the form of `action`: fetched on demand or prefetched.
    pub fn show_form(action: &ActionDescriptor, target: ActionTarget) -> Dispatch {
        let session = FormSession {
            action: action.clone(),
            content: Value::Null,
            target,
        };
        match &action.form {
            FormSpec::Descriptor(content) => Dispatch::OpenForm(FormSession {
                content: content.clone(),
                ..session
            }),
            _ => Dispatch::FetchForm {
                request: ViewRequest::Form {
                    method: action.method.clone(),
                    pk: session.target.item_id().cloned(),
                },
                session,
            },
        }
    }

    /// Submit `data` for the open form.
    ///
    /// Single-item forms execute directly; bulk forms go back through
    /// bulk dispatch with the current selection in `bulk`.
    pub fn submit_form(
        links: &dyn ViewTransport,
        session: &FormSession,
        data: String,
        bulk: Option<BulkParams>,
    ) -> Dispatch {
        match (&session.target, bulk) {
            (ActionTarget::Bulk, Some(params)) => {
                Self::dispatch_bulk(links, &session.action, params, Some(data))
            }
            (target, _) => Dispatch::Execute(ActionCall {
                request: ViewRequest::Action {
                    method: session.action.method.clone(),
                    pk: target.item_id().cloned(),
                    data: Some(data),
                },
                context: ActionContext {
                    action: session.action.clone(),
                    target: target.clone(),
                },
            }),
        }
    }

    /// Submit an inline form rendered inside an expanded item.
    pub fn inline_form(item_id: &ItemId, action: &ActionDescriptor, data: String) -> Dispatch {
        Dispatch::Execute(ActionCall {
            request: ViewRequest::Action {
                method: action.method.clone(),
                pk: Some(item_id.clone()),
                data: Some(data),
            },
            context: ActionContext {
                action: action.clone(),
                target: ActionTarget::Item(item_id.clone()),
            },
        })
    }

    fn confirm_or_execute(call: ActionCall, surface: ConfirmSurface, force: bool) -> Dispatch {
        if call.context.action.requires_confirmation() && !force {
            Dispatch::Confirm(PendingConfirmation { call, surface })
        } else {
            Dispatch::Execute(call)
        }
    }
}

// =============================================================================
// Link Parameters
// =============================================================================

/// `{report_method, pk}` plus `extra` for the single-item action view.
pub fn action_view_params(
    item_id: &ItemId,
    method: &str,
    extra: &Map<String, Value>,
) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("report_method".into(), Value::String(method.to_string()));
    params.insert("pk".into(), Value::String(item_id.to_string()));
    for (k, v) in extra {
        params.insert(k.clone(), v.clone());
    }
    params
}

/// Bulk parameters plus `extra` for the bulk action view.
pub fn bulk_view_params(params: &BulkParams, extra: &Map<String, Value>) -> Map<String, Value> {
    let mut map = bulk_params_map(params);
    for (k, v) in extra {
        map.insert(k.clone(), v.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use advreport_core::Confirm;
    use serde_json::json;

    fn bulk(method: &str) -> BulkParams {
        BulkParams {
            report_method: method.into(),
            items: "1,2".into(),
            global: false,
        }
    }

    #[test]
    fn test_plain_action_executes() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("approve");
        let dispatch = ActionDispatcher::dispatch_item(&links, &ItemId::from("3"), &action, false);

        let Dispatch::Execute(call) = dispatch else {
            panic!("expected execute, got {:?}", dispatch.kind());
        };
        assert_eq!(
            call.request,
            ViewRequest::Action {
                method: "approve".into(),
                pk: Some(ItemId::from("3")),
                data: None,
            }
        );
        assert_eq!(call.context.target, ActionTarget::Item(ItemId::from("3")));
    }

    #[test]
    fn test_confirm_unless_forced() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("delete").with_confirm(Confirm::Yes);
        let id = ItemId::from("3");

        let Dispatch::Confirm(pending) = ActionDispatcher::dispatch_item(&links, &id, &action, false)
        else {
            panic!("expected confirmation");
        };
        assert_eq!(pending.surface, ConfirmSurface::Single);
        assert_eq!(pending.action().method, "delete");

        let forced = ActionDispatcher::dispatch_item(&links, &id, &action, true);
        assert_eq!(forced.kind(), "execute");
    }

    #[test]
    fn test_link_action_navigates() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("open").as_link();
        let dispatch = ActionDispatcher::dispatch_item(&links, &ItemId::from("5"), &action, false);
        assert_eq!(
            dispatch,
            Dispatch::Navigate("/action_view/?pk=5&report_method=open".into())
        );
    }

    #[test]
    fn test_form_takes_precedence_over_link() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("edit")
            .as_link()
            .with_form(FormSpec::FetchOnDemand);
        let dispatch = ActionDispatcher::dispatch_item(&links, &ItemId::from("5"), &action, false);

        let Dispatch::FetchForm { request, session } = dispatch else {
            panic!("expected form fetch");
        };
        assert_eq!(
            request,
            ViewRequest::Form {
                method: "edit".into(),
                pk: Some(ItemId::from("5")),
            }
        );
        assert_eq!(session.content, Value::Null);
    }

    #[test]
    fn test_prefetched_form_opens_directly() {
        let action =
            ActionDescriptor::new("edit").with_form(FormSpec::Descriptor(json!("<form></form>")));
        let dispatch = ActionDispatcher::show_form(&action, ActionTarget::Bulk);
        let Dispatch::OpenForm(session) = dispatch else {
            panic!("expected open form");
        };
        assert_eq!(session.content, json!("<form></form>"));
        assert_eq!(session.target, ActionTarget::Bulk);
    }

    #[test]
    fn test_bulk_form_then_submission() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("tag").with_form(FormSpec::FetchOnDemand);

        let first = ActionDispatcher::dispatch_bulk(&links, &action, bulk("tag"), None);
        assert_eq!(first.kind(), "fetch_form");

        let session = FormSession {
            action: action.clone(),
            content: json!("<form/>"),
            target: ActionTarget::Bulk,
        };
        let submit =
            ActionDispatcher::submit_form(&links, &session, "tag=x".into(), Some(bulk("tag")));
        let Dispatch::Execute(call) = submit else {
            panic!("expected execute");
        };
        assert_eq!(
            call.request,
            ViewRequest::MultipleAction {
                params: bulk("tag"),
                data: Some("tag=x".into()),
            }
        );
    }

    #[test]
    fn test_bulk_link_navigates_with_selection() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("export").as_link();
        let dispatch = ActionDispatcher::dispatch_bulk(&links, &action, bulk("export"), None);
        assert_eq!(
            dispatch,
            Dispatch::Navigate(
                "/multiple_action_view/?global=false&items=1%2C2&report_method=export".into()
            )
        );
    }

    #[test]
    fn test_bulk_link_form_submission_executes() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("download")
            .as_link()
            .with_form(FormSpec::Descriptor(json!("<form/>")));

        let first = ActionDispatcher::dispatch_bulk(&links, &action, bulk("download"), None);
        assert_eq!(first.kind(), "open_form");

        let data = Some("fmt=csv".into());
        let submitted = ActionDispatcher::dispatch_bulk(&links, &action, bulk("download"), data);
        assert_eq!(submitted.kind(), "execute");
    }

    #[test]
    fn test_bulk_confirmation_surface() {
        let links = MockTransport::new();
        let action = ActionDescriptor::new("purge").with_confirm(Confirm::Prompt("Sure?".into()));
        let Dispatch::Confirm(pending) =
            ActionDispatcher::dispatch_bulk(&links, &action, bulk("purge"), None)
        else {
            panic!("expected confirmation");
        };
        assert_eq!(pending.surface, ConfirmSurface::Bulk);
        assert_eq!(pending.prompt(), Some("Sure?"));
    }

    #[test]
    fn test_single_form_submission() {
        let links = MockTransport::new();
        let session = FormSession {
            action: ActionDescriptor::new("edit").with_form(FormSpec::FetchOnDemand),
            content: json!("<form/>"),
            target: ActionTarget::Item(ItemId::from("9")),
        };
        let dispatch = ActionDispatcher::submit_form(&links, &session, "a=1".into(), None);
        let Dispatch::Execute(call) = dispatch else {
            panic!("expected execute");
        };
        assert_eq!(
            call.request,
            ViewRequest::Action {
                method: "edit".into(),
                pk: Some(ItemId::from("9")),
                data: Some("a=1".into()),
            }
        );
    }

    #[test]
    fn test_link_params_merge_extra() {
        let mut extra = Map::new();
        extra.insert("step".into(), json!(2));
        let params = action_view_params(&ItemId::from("4"), "wizard", &extra);
        assert_eq!(
            Value::Object(params),
            json!({"report_method": "wizard", "pk": "4", "step": 2})
        );
    }
}
