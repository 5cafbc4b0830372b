//! Report Interaction Controller
//!
//! The controller is the only component the rendering layer talks to. It
//! composes fetching, lazy loading, dispatch and response interpretation
//! around a single [`ReportState`].
//!
//! ## Action Flow
//!
//! ```text
//! execute_action / execute_bulk_action / submit_form
//!        │
//!        ▼
//! ActionDispatcher ──► Navigate | FetchForm | OpenForm | Confirm
//!        │
//!        ▼ Execute
//! transport.action()
//!        │
//!        ├── error ──► close form, show error
//!        ▼
//! ActionResponse::classify
//!        │
//!        ▼
//! ResponseInterpreter::apply (under lock)
//!        │
//!        ▼
//! Followup: navigate, notify + hooks, lazy loads, refetch
//! ```
//!
//! ## Reactive State
//!
//! Every mutation goes through `update`, which applies it under the lock
//! and broadcasts the new state. The lock is never held across an await.

use std::sync::Arc;

use advreport_core::{
    ActionDescriptor, ActionList, ActionResponse, ControllerConfig, ItemId, LazyDirective,
    QueryParams, QueryState, ReportError, ReportResult,
};
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Map;
use tokio::sync::watch;

use crate::dispatcher::{action_view_params, ActionCall, ActionDispatcher, ActionTarget, Dispatch};
use crate::fetcher::ReportFetcher;
use crate::hooks::SuccessHooks;
use crate::interpreter::{Followup, ResponseInterpreter};
use crate::lazy_loader::LazyContentLoader;
use crate::notifier::{Navigator, Notifier};
use crate::state::{FormSession, ReportState};
use crate::transport::{LinkView, ViewTransport};

// =============================================================================
// Report Controller
// =============================================================================

pub struct ReportController {
    state: Mutex<ReportState>,
    tx: watch::Sender<ReportState>,
    rx: watch::Receiver<ReportState>,

    transport: Arc<dyn ViewTransport>,
    fetcher: ReportFetcher,
    lazy: LazyContentLoader,

    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    hooks: SuccessHooks,
}

impl ReportController {
    pub fn new(
        transport: Arc<dyn ViewTransport>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: ControllerConfig,
    ) -> Self {
        let lazy = LazyContentLoader::new(transport.clone(), config.base.clone());
        let state = ReportState::new(config, QueryState::default());
        let (tx, rx) = watch::channel(state.clone());
        Self {
            state: Mutex::new(state),
            tx,
            rx,
            fetcher: ReportFetcher::new(transport.clone()),
            lazy,
            transport,
            notifier,
            navigator,
            hooks: SuccessHooks::new(),
        }
    }

    /// Start from `query` instead of the default first page.
    pub fn with_query(self, query: QueryState) -> Self {
        self.update(|s| s.set_query(query));
        self
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ReportState> {
        self.rx.clone()
    }

    /// Clone of the current state.
    pub fn state(&self) -> ReportState {
        self.state.lock().clone()
    }

    /// Read the current state without cloning it.
    ///
    /// `f` runs under the state lock and must not call back into the
    /// controller.
    pub fn with_state<R>(&self, f: impl FnOnce(&ReportState) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn hooks(&self) -> &SuccessHooks {
        &self.hooks
    }

    /// Apply a mutation and broadcast the result.
    fn update<R>(&self, f: impl FnOnce(&mut ReportState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            (result, state.clone())
        };
        let _ = self.tx.send(snapshot);
        result
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Fetch the report for the current query.
    ///
    /// A completion that is no longer the latest issued fetch is dropped.
    pub async fn fetch_report(&self) -> ReportResult<()> {
        let (generation, query, mirror) = self.update(|s| {
            let (generation, query) = s.begin_fetch();
            (generation, query, s.config.update_location)
        });
        if mirror {
            self.navigator.replace_query(&query.params());
        }

        match self.fetcher.fetch(&query).await {
            Ok(snapshot) => {
                if let Some(loads) = self.update(|s| s.apply_snapshot(generation, snapshot)) {
                    self.load_lazy(loads).await;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Report fetch #{} failed: {}", generation, e);
                self.update(|s| s.fail_fetch(generation, e.to_string()));
                Err(e)
            }
        }
    }

    /// Follow an external location change.
    ///
    /// Returns false (and fetches nothing) when location tracking is off or
    /// the parameters match the current query.
    pub async fn on_location_change(&self, params: &QueryParams) -> ReportResult<bool> {
        let query = QueryState::from_params(params);
        let changed = self.update(|s| {
            if !s.config.update_location || (s.query == query && s.report.is_some()) {
                return false;
            }
            s.set_query(query);
            true
        });
        if changed {
            self.fetch_report().await?;
        }
        Ok(changed)
    }

    /// Go to page `n`. Returns false when `n` is out of range or current.
    pub async fn change_page(&self, n: u32) -> ReportResult<bool> {
        let moved = self.update(|s| match s.query.with_page(n, s.page_count()) {
            Some(query) => {
                s.set_query(query);
                true
            }
            None => false,
        });
        if moved {
            self.fetch_report().await?;
        }
        Ok(moved)
    }

    /// Sort by `field`, flipping direction if it is the active ascending sort.
    pub async fn change_order(&self, field: &str) -> ReportResult<()> {
        self.update(|s| {
            let active = s
                .report
                .as_ref()
                .and_then(|report| report.extra.sort())
                .or_else(|| s.query.sort().cloned());
            let query = s.query.toggle_sort(field, active.as_ref());
            s.set_query(query);
        });
        self.fetch_report().await
    }

    pub fn set_pending_filter(&self, key: &str, value: &str) {
        self.update(|s| s.set_pending_filter(key, value));
    }

    pub fn clear_pending_filter(&self, key: &str) {
        self.update(|s| s.clear_pending_filter(key));
    }

    /// Replace the applied filters with the pending ones.
    pub async fn apply_filters(&self) -> ReportResult<()> {
        self.update(|s| {
            let query = s.query.apply_pending_filters(&s.pending_filters);
            s.set_query(query);
        });
        self.fetch_report().await
    }

    /// Drop every filter, pending and applied.
    pub async fn remove_filters(&self) -> ReportResult<()> {
        self.update(|s| {
            s.pending_filters = QueryParams::new();
            let query = s.query.clear_filters();
            s.set_query(query);
        });
        self.fetch_report().await
    }

    // =========================================================================
    // Expansion and Selection
    // =========================================================================

    pub async fn toggle_expand(&self, id: &ItemId) -> ReportResult<()> {
        let loads = self.update(|s| s.toggle_expand(id))?;
        self.load_lazy(loads).await;
        Ok(())
    }

    pub fn toggle_selected(&self, id: &ItemId) {
        self.update(|s| s.toggle_selected(id));
    }

    pub fn set_item_selected(&self, id: &ItemId, selected: bool) {
        self.update(|s| s.set_item_selected(id, selected));
    }

    pub fn set_all_selected(&self, all_selected: bool) {
        self.update(|s| s.set_all_selected(all_selected));
    }

    pub fn set_all_selected_global(&self, global: bool) {
        self.update(|s| s.set_all_selected_global(global));
    }

    pub fn select_bulk_action(&self, method: Option<String>) {
        self.update(|s| s.select_bulk_action(method));
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Run one of an item's actions. `force` skips a required confirmation.
    pub async fn execute_action(&self, id: &ItemId, method: &str, force: bool) -> ReportResult<()> {
        let action = self.item_action(id, method)?;
        let dispatch = ActionDispatcher::dispatch_item(self.transport.as_ref(), id, &action, force);
        self.run_dispatch(dispatch).await
    }

    /// Run the selected bulk action on the current selection.
    pub async fn execute_bulk_action(&self, data: Option<String>) -> ReportResult<()> {
        let (action, params) = self.with_state(|s| {
            let method = s.bulk_action.clone().ok_or(ReportError::NoBulkAction)?;
            let report = s.report.as_ref().ok_or(ReportError::NoReport)?;
            let action = report
                .multiple_action_list
                .by_method(&method)
                .cloned()
                .ok_or_else(|| ReportError::ActionNotFound {
                    method: method.clone(),
                })?;
            Ok::<_, ReportError>((action, s.bulk_params(&method)))
        })?;

        let dispatch =
            ActionDispatcher::dispatch_bulk(self.transport.as_ref(), &action, params, data);
        if matches!(dispatch, Dispatch::Navigate(_)) {
            self.update(|s| s.select_bulk_action(None));
        }
        self.run_dispatch(dispatch).await
    }

    /// Submit a form rendered inline in an expanded item.
    pub async fn execute_inline_form_action(
        &self,
        id: &ItemId,
        method: &str,
        data: String,
    ) -> ReportResult<()> {
        let action = self.item_action(id, method)?;
        self.run_dispatch(ActionDispatcher::inline_form(id, &action, data))
            .await
    }

    /// Submit the open form with serialized `data`.
    pub async fn submit_form(&self, data: String) -> ReportResult<()> {
        let (session, bulk) = self.with_state(|s| {
            let session = s.form.clone().ok_or(ReportError::NoOpenForm)?;
            let bulk = match session.target {
                ActionTarget::Bulk => Some(s.bulk_params(&session.action.method)),
                ActionTarget::Item(_) => None,
            };
            Ok::<_, ReportError>((session, bulk))
        })?;

        let dispatch =
            ActionDispatcher::submit_form(self.transport.as_ref(), &session, data, bulk);
        self.run_dispatch(dispatch).await
    }

    /// Run the call awaiting confirmation.
    pub async fn confirm_pending(&self) -> ReportResult<()> {
        let pending = self
            .update(|s| s.take_pending())
            .ok_or(ReportError::NoPendingConfirmation)?;
        self.execute_call(pending.call).await
    }

    /// Drop the call awaiting confirmation. Returns false if there was none.
    pub fn cancel_pending(&self) -> bool {
        self.update(|s| s.take_pending()).is_some()
    }

    pub fn close_form(&self) -> bool {
        self.update(|s| s.close_form())
    }

    pub fn close_detail(&self) -> bool {
        self.update(|s| s.close_detail())
    }

    pub fn dismiss_error(&self) {
        self.update(|s| s.dismiss_error());
    }

    /// Navigation URL for a link action without a form, empty otherwise.
    pub fn action_link(&self, id: &ItemId, method: &str) -> String {
        match self.item_action(id, method) {
            Ok(action) if action.is_link_action() && !action.form.is_some() => {
                self.transport.action_link(
                    LinkView::ActionView,
                    &action_view_params(id, method, &Map::new()),
                )
            }
            _ => String::new(),
        }
    }

    fn item_action(&self, id: &ItemId, method: &str) -> ReportResult<ActionDescriptor> {
        self.with_state(|s| {
            let report = s.report.as_ref().ok_or(ReportError::NoReport)?;
            let item = report
                .item(id)
                .ok_or_else(|| ReportError::ItemNotFound(id.clone()))?;
            item.action(method)
                .cloned()
                .ok_or_else(|| ReportError::ActionNotFound {
                    method: method.to_string(),
                })
        })
    }

    // =========================================================================
    // Dispatch Execution
    // =========================================================================

    async fn run_dispatch(&self, dispatch: Dispatch) -> ReportResult<()> {
        tracing::debug!("Dispatch: {}", dispatch.kind());
        match dispatch {
            Dispatch::Navigate(url) => {
                tracing::info!("Navigating to {}", url);
                self.navigator.navigate(&url);
                Ok(())
            }
            Dispatch::FetchForm { request, session } => {
                match self.transport.action(request).await {
                    Ok(content) => self.update(|s| s.open_form(FormSession { content, ..session })),
                    Err(e) => {
                        tracing::warn!("Form fetch for '{}' failed: {}", session.action.method, e)
                    }
                }
                Ok(())
            }
            Dispatch::OpenForm(session) => {
                self.update(|s| s.open_form(session));
                Ok(())
            }
            Dispatch::Confirm(pending) => {
                self.update(|s| s.set_pending(pending));
                Ok(())
            }
            Dispatch::Execute(call) => self.execute_call(call).await,
        }
    }

    async fn execute_call(&self, call: ActionCall) -> ReportResult<()> {
        let ActionCall { request, context } = call;
        tracing::info!(
            "Executing '{}' via {}",
            context.action.method,
            request.action_name()
        );

        let raw = match self.transport.action(request).await {
            Ok(raw) => raw,
            Err(e) => {
                let error = ReportError::from(e);
                self.handle_action_error(&error);
                return Err(error);
            }
        };

        let response = ActionResponse::classify(raw);
        let transport = self.transport.as_ref();
        let followup =
            match self.update(|s| ResponseInterpreter::apply(s, response, &context, transport)) {
                Ok(followup) => followup,
                Err(error) => {
                    self.handle_action_error(&error);
                    return Err(error);
                }
            };
        self.perform(followup, &context.action).await
    }

    async fn perform(&self, followup: Followup, action: &ActionDescriptor) -> ReportResult<()> {
        if let Some(url) = followup.navigate {
            tracing::info!("Navigating to {}", url);
            self.navigator.navigate(&url);
        }
        if let Some(message) = followup.success {
            self.notifier.show_success(&message);
            self.hooks.fire(action);
        }
        self.load_lazy(followup.lazy_loads).await;
        if followup.refetch {
            self.fetch_report().await?;
        }
        Ok(())
    }

    fn handle_action_error(&self, error: &ReportError) {
        let message = error.to_string();
        tracing::warn!("Action failed: {}", message);
        self.update(|s| s.show_action_error(message.clone()));
        self.notifier.show_error(&message);
    }

    async fn load_lazy(&self, directives: Vec<LazyDirective>) {
        if directives.is_empty() {
            return;
        }
        let mut fetches = self.lazy.fetch(directives);
        while let Some((token, content)) = fetches.next().await {
            self.update(|s| s.store_lazy_content(token, content));
        }
    }
}
