//! Action response interpretation.
//!
//! Applies a classified [`ActionResponse`] to the report state and returns
//! the side effects the controller still has to carry out. Interpretation
//! itself never awaits, so it runs under the state lock.

use advreport_core::{payload_item_id, ActionResponse, LazyDirective, ReportResult};

use crate::dispatcher::{action_view_params, bulk_view_params, ActionContext};
use crate::state::ReportState;
use crate::transport::{LinkView, ViewTransport};

/// Side effects left to perform after a response was applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Followup {
    /// Leave the report for this URL.
    pub navigate: Option<String>,

    /// Show this success message and fire the action's success hooks.
    pub success: Option<String>,

    /// Lazy content to load.
    pub lazy_loads: Vec<LazyDirective>,

    /// Re-fetch the report.
    pub refetch: bool,
}

pub struct ResponseInterpreter;

impl ResponseInterpreter {
    /// Apply `response` for the call described by `context`.
    pub fn apply(
        state: &mut ReportState,
        response: ActionResponse,
        context: &ActionContext,
        links: &dyn ViewTransport,
    ) -> ReportResult<Followup> {
        tracing::debug!(
            "Interpreting {} response for '{}'",
            response.kind(),
            context.action.method
        );

        match response {
            ActionResponse::Redirect { link, item } => {
                state.close_form();
                let pk = item.as_ref().and_then(|item| {
                    payload_item_id(item).or_else(|| context.target.item_id().cloned())
                });
                let url = match pk {
                    Some(pk) => links.action_link(
                        LinkView::ActionView,
                        &action_view_params(&pk, &link.method, &link.data),
                    ),
                    None => {
                        let params = state.bulk_params(&link.method);
                        state.select_bulk_action(None);
                        links.action_link(
                            LinkView::MultipleActionView,
                            &bulk_view_params(&params, &link.data),
                        )
                    }
                };
                Ok(Followup {
                    navigate: Some(url),
                    ..Default::default()
                })
            }

            ActionResponse::Success { message, item } => {
                let lazy_loads = match context.target.item_id() {
                    Some(id) => {
                        state.update_item(id, item.as_ref(), context.action.next_on_success)?
                    }
                    None => Vec::new(),
                };
                state.close_form();
                Ok(Followup {
                    success: Some(message),
                    lazy_loads,
                    ..Default::default()
                })
            }

            ActionResponse::ResponseForm(content) => {
                if !state.replace_form_content(content) {
                    tracing::debug!("Form response arrived with no form open");
                }
                Ok(Followup::default())
            }

            ActionResponse::BulkResult { succeeded, failed } => {
                state.record_bulk_outcome(succeeded, failed);
                Ok(Followup {
                    refetch: true,
                    ..Default::default()
                })
            }

            ActionResponse::Detail { content, style } => {
                state.close_form();
                state.select_bulk_action(None);
                state.open_detail(context.action.clone(), content, style);
                Ok(Followup::default())
            }
        }
    }
}
