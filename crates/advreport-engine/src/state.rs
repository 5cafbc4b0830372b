//! Report view state.
//!
//! `ReportState` is the single explicit state record of a report view.
//! Each mutation is a named method; the controller applies them under its
//! lock and broadcasts the result. The rendering layer only ever reads
//! cloned states and the predicates defined here.

use std::collections::HashMap;

use advreport_core::{
    is_truthy, ActionDescriptor, BulkParams, ControllerConfig, Item, ItemId, LazyDirective,
    QueryParams, QueryState, ReportError, ReportResult, ReportSnapshot, SelectionTracker,
};
use serde_json::{json, Map, Value};

use crate::dispatcher::{ActionCall, ActionTarget};

// =============================================================================
// Surfaces
// =============================================================================

/// Which confirmation surface a pending call is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmSurface {
    Single,
    Bulk,
}

/// A call held back until the user confirms it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub call: ActionCall,
    pub surface: ConfirmSurface,
}

impl PendingConfirmation {
    pub fn action(&self) -> &ActionDescriptor {
        &self.call.context.action
    }

    /// Rendered prompt text, if the backend supplied one.
    pub fn prompt(&self) -> Option<&str> {
        self.action().confirm_message()
    }
}

/// An open form: the descriptor it belongs to plus its current content.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSession {
    pub action: ActionDescriptor,
    /// Current form payload; replaced in place by multi-step responses.
    pub content: Value,
    pub target: ActionTarget,
}

/// Informational dialog opened by an unclassified action response.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailDialog {
    pub action: ActionDescriptor,
    pub content: Value,
    pub style: Value,
}

/// Per-item outcome of the last bulk action, keyed by item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub succeeded: Map<String, Value>,
    pub failed: Map<String, Value>,
}

impl BulkOutcome {
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }

    /// Whether a truthy outcome is recorded for `id`.
    pub fn has_result_for(&self, id: &ItemId) -> bool {
        [&self.succeeded, &self.failed]
            .iter()
            .any(|map| map.get(id.as_str()).is_some_and(is_truthy))
    }
}

// =============================================================================
// Report State
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ReportState {
    pub config: ControllerConfig,

    /// Applied query: what the last fetch was issued for.
    pub query: QueryState,

    /// Filter edits not yet applied.
    pub pending_filters: QueryParams,

    pub report: Option<ReportSnapshot>,

    /// Message of the last failed report fetch.
    pub error: Option<String>,

    pub loading: bool,

    pub selection: SelectionTracker,

    /// Method chosen in the bulk-action selector.
    pub bulk_action: Option<String>,

    pub bulk_outcome: BulkOutcome,

    /// Lazy content keyed by directive token.
    pub lazy_content: HashMap<String, String>,

    pub form: Option<FormSession>,

    pub pending: Option<PendingConfirmation>,

    pub detail: Option<DetailDialog>,

    /// Message of the last failed action.
    pub error_message: Option<String>,

    /// Id of the latest issued fetch.
    pub generation: u64,
}

impl ReportState {
    pub fn new(config: ControllerConfig, query: QueryState) -> Self {
        Self {
            config,
            pending_filters: query.filters().clone(),
            query,
            report: None,
            error: None,
            loading: false,
            selection: SelectionTracker::new(),
            bulk_action: None,
            bulk_outcome: BulkOutcome::default(),
            lazy_content: HashMap::new(),
            form: None,
            pending: None,
            detail: None,
            error_message: None,
            generation: 0,
        }
    }

    // =========================================================================
    // Fetch Lifecycle
    // =========================================================================

    /// Issue a new fetch. Returns its generation and the query to send.
    pub fn begin_fetch(&mut self) -> (u64, QueryState) {
        self.generation += 1;
        self.loading = true;
        self.pending_filters = self.query.filters().clone();
        tracing::debug!(
            "Issued fetch #{} for {}",
            self.generation,
            self.query.to_query_string()
        );
        (self.generation, self.query.clone())
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Install a fetched snapshot.
    ///
    /// Returns `None` when `generation` is stale; the state is untouched.
    /// Otherwise returns the lazy directives to load for an auto-expanded
    /// sole item.
    pub fn apply_snapshot(
        &mut self,
        generation: u64,
        snapshot: ReportSnapshot,
    ) -> Option<Vec<LazyDirective>> {
        if !self.is_latest(generation) {
            tracing::debug!(
                "Discarding stale fetch #{} (latest #{})",
                generation,
                self.generation
            );
            return None;
        }

        let sole_item = (snapshot.item_count == 1)
            .then(|| snapshot.items.first().map(|item| item.item_id.clone()))
            .flatten();

        self.loading = false;
        self.error = None;
        self.selection.clear();
        self.lazy_content.clear();
        self.report = Some(snapshot);
        tracing::debug!("Applied fetch #{}", generation);

        let loads = match sole_item {
            Some(id) => match self.position(&id) {
                Some(index) => self.expand_at(index),
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        Some(loads)
    }

    /// Record a failed fetch. Returns false if `generation` is stale.
    pub fn fail_fetch(&mut self, generation: u64, message: String) -> bool {
        if !self.is_latest(generation) {
            tracing::debug!("Discarding stale fetch failure #{}", generation);
            return false;
        }
        self.loading = false;
        self.error = Some(message);
        true
    }

    pub fn set_query(&mut self, query: QueryState) {
        self.query = query;
    }

    // =========================================================================
    // Filters
    // =========================================================================

    pub fn set_pending_filter(&mut self, key: &str, value: &str) {
        self.pending_filters.insert(key, value);
    }

    pub fn clear_pending_filter(&mut self, key: &str) {
        self.pending_filters.remove(key);
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Flip an item's expansion. Returns lazy directives to load when the
    /// item became expanded and has expandable content.
    pub fn toggle_expand(&mut self, id: &ItemId) -> ReportResult<Vec<LazyDirective>> {
        if self.config.select_mode {
            tracing::debug!("Ignoring expand of {} in select mode", id);
            return Ok(Vec::new());
        }
        let report = self.report.as_mut().ok_or(ReportError::NoReport)?;
        let index = report
            .position(id)
            .ok_or_else(|| ReportError::ItemNotFound(id.clone()))?;

        let item = &mut report.items[index];
        if item.expanded {
            item.expanded = false;
            tracing::debug!("Collapsed item {}", id);
            return Ok(Vec::new());
        }
        Ok(self.expand_at(index))
    }

    fn expand_at(&mut self, index: usize) -> Vec<LazyDirective> {
        if self.config.select_mode {
            return Vec::new();
        }
        let outcome = &self.bulk_outcome;
        let Some(item) = self.report.as_mut().and_then(|r| r.items.get_mut(index)) else {
            return Vec::new();
        };
        if item.expanded || !has_expandable_content(item, outcome) {
            return Vec::new();
        }
        item.expanded = true;
        tracing::debug!("Expanded item {}", item.item_id);
        item.lazy_directives()
    }

    /// Store one fetched lazy fragment under its directive token.
    pub fn store_lazy_content(&mut self, token: String, content: String) {
        self.lazy_content.insert(token, content);
    }

    // =========================================================================
    // Item Updates
    // =========================================================================

    /// Apply a successful action's item payload.
    ///
    /// `Some(fields)` shallow-merges onto the item; `None` removes it. With
    /// `next_on_success` the following item is expanded and the acted-on
    /// one collapsed. Returns the lazy directives to load.
    pub fn update_item(
        &mut self,
        id: &ItemId,
        update: Option<&Map<String, Value>>,
        next_on_success: bool,
    ) -> ReportResult<Vec<LazyDirective>> {
        let report = self.report.as_mut().ok_or(ReportError::NoReport)?;
        let index = report
            .position(id)
            .ok_or_else(|| ReportError::ItemNotFound(id.clone()))?;
        let advance = next_on_success && index + 1 < report.items.len();
        let mut loads = Vec::new();

        match update {
            Some(fields) => {
                report.items[index].merge(fields)?;
                tracing::debug!("Updated item {}", id);
                if advance {
                    report.items[index].expanded = false;
                    loads.extend(self.expand_at(index + 1));
                }
                if let Some(item) = self.item_at(index).filter(|item| item.expanded) {
                    loads.extend(item.lazy_directives());
                }
            }
            None => {
                if advance {
                    loads.extend(self.expand_at(index + 1));
                }
                if let Some(report) = self.report.as_mut() {
                    report.items.remove(index);
                }
                self.selection.set(id, false);
                self.selection.prune_unselected();
                tracing::debug!("Removed item {}", id);
            }
        }
        Ok(loads)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn toggle_selected(&mut self, id: &ItemId) {
        self.selection.toggle(id);
        if !self.selection.is_selected(id) {
            self.clear_all_selected_flag();
        }
        self.selection.prune_unselected();
    }

    /// Mark one item. Deselecting also clears the "all selected" flag.
    pub fn set_item_selected(&mut self, id: &ItemId, selected: bool) {
        self.selection.set(id, selected);
        if !selected {
            self.clear_all_selected_flag();
        }
        self.selection.prune_unselected();
    }

    pub fn set_all_selected(&mut self, all_selected: bool) {
        match self.report.as_mut() {
            Some(report) => {
                report.all_selected = all_selected;
                self.selection
                    .sync_from_all_selected_flag(all_selected, &report.items);
            }
            None => self.selection.sync_from_all_selected_flag(all_selected, &[]),
        }
        tracing::debug!(
            "Select all = {}, {} selected",
            all_selected,
            self.selection.count()
        );
    }

    pub fn set_all_selected_global(&mut self, global: bool) {
        if let Some(report) = self.report.as_mut() {
            report.all_selected_global = global;
        }
    }

    fn clear_all_selected_flag(&mut self) {
        if let Some(report) = self.report.as_mut() {
            report.all_selected = false;
        }
    }

    pub fn select_bulk_action(&mut self, method: Option<String>) {
        self.bulk_action = method.filter(|m| !m.is_empty());
    }

    /// Bulk parameters for `method` on the current selection.
    pub fn bulk_params(&self, method: &str) -> BulkParams {
        let global = self
            .report
            .as_ref()
            .is_some_and(|report| report.all_selected_global);
        self.selection.to_action_params(method, global)
    }

    /// Record a bulk result: selection, bulk method and form are cleared.
    pub fn record_bulk_outcome(&mut self, succeeded: Map<String, Value>, failed: Map<String, Value>) {
        tracing::debug!(
            "Bulk outcome: {} succeeded, {} failed",
            succeeded.len(),
            failed.len()
        );
        self.bulk_outcome = BulkOutcome { succeeded, failed };
        self.bulk_action = None;
        self.form = None;
        self.selection.clear();
        self.clear_all_selected_flag();
    }

    // =========================================================================
    // Surfaces
    // =========================================================================

    pub fn open_form(&mut self, session: FormSession) {
        tracing::debug!("Opened form for '{}'", session.action.method);
        self.form = Some(session);
    }

    /// Returns false if no form was open.
    pub fn close_form(&mut self) -> bool {
        self.form.take().is_some()
    }

    /// Replace the open form's content. Returns false if no form is open.
    pub fn replace_form_content(&mut self, content: Value) -> bool {
        match self.form.as_mut() {
            Some(form) => {
                form.content = content;
                true
            }
            None => false,
        }
    }

    pub fn set_pending(&mut self, pending: PendingConfirmation) {
        tracing::debug!("Awaiting confirmation for '{}'", pending.action().method);
        self.pending = Some(pending);
    }

    pub fn take_pending(&mut self) -> Option<PendingConfirmation> {
        self.pending.take()
    }

    pub fn open_detail(&mut self, action: ActionDescriptor, content: Value, style: Option<Value>) {
        let style = style.unwrap_or_else(|| self.default_dialog_style());
        self.detail = Some(DetailDialog {
            action,
            content,
            style,
        });
    }

    pub fn close_detail(&mut self) -> bool {
        self.detail.take().is_some()
    }

    /// Record an action failure. Closes any open form.
    pub fn show_action_error(&mut self, message: String) {
        self.form = None;
        self.error_message = Some(message);
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    fn default_dialog_style(&self) -> Value {
        json!({ "width": self.config.dialog_width })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.report.as_ref()?.item(id)
    }

    fn item_at(&self, index: usize) -> Option<&Item> {
        self.report.as_ref()?.items.get(index)
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.report.as_ref()?.position(id)
    }

    pub fn page_count(&self) -> u32 {
        self.report.as_ref().map_or(0, ReportSnapshot::page_count)
    }

    pub fn show_search(&self) -> bool {
        self.report.as_ref().is_some_and(ReportSnapshot::has_search)
    }

    pub fn show_action_select(&self) -> bool {
        self.report
            .as_ref()
            .is_some_and(|report| report.multiple_actions && !self.selection.is_empty())
    }

    pub fn show_header(&self) -> bool {
        let Some(report) = self.report.as_ref() else {
            return false;
        };
        report.report_header_visible
            && self.config.single_action.is_none()
            && (self.show_search() || self.show_action_select())
    }

    pub fn has_applied_filters(&self) -> bool {
        self.query.has_filters() && self.show_search()
    }

    pub fn has_expanded_content(&self, item: &Item) -> bool {
        has_expandable_content(item, &self.bulk_outcome)
    }

    /// Whether `action` renders as a standalone button.
    pub fn is_single_action(&self, action: &ActionDescriptor) -> bool {
        !action.is_inline_form_action() && self.config.lists_single_action(&action.method)
    }

    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selection.is_selected(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.count()
    }

    /// Lazy content for `token`, if loaded.
    pub fn lazy(&self, token: &str) -> Option<&str> {
        self.lazy_content.get(token).map(String::as_str)
    }
}

impl Default for ReportState {
    fn default() -> Self {
        Self::new(ControllerConfig::default(), QueryState::default())
    }
}

fn has_expandable_content(item: &Item, outcome: &BulkOutcome) -> bool {
    !item.extra_information.is_empty()
        || !item.actions.is_empty()
        || outcome.has_result_for(&item.item_id)
}
