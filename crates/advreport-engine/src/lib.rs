//! Interaction controller for server-driven report views.
//!
//! This crate provides:
//! - `ReportController` - the single entry point for a rendering layer
//! - `ViewTransport` - the backend seam, plus `Notifier`/`Navigator`
//! - Action dispatch and response interpretation
//! - Lazy content loading and success hooks

pub mod controller;
pub mod dispatcher;
pub mod fetcher;
pub mod hooks;
pub mod interpreter;
pub mod lazy_loader;
pub mod notifier;
pub mod state;
pub mod transport;

pub use controller::ReportController;
pub use dispatcher::{ActionCall, ActionContext, ActionDispatcher, ActionTarget, Dispatch};
pub use fetcher::ReportFetcher;
pub use hooks::{SuccessCallback, SuccessHooks, ALL_ACTIONS};
pub use interpreter::{Followup, ResponseInterpreter};
pub use lazy_loader::{LazyContentLoader, LAZY_ERROR_MARKER};
pub use notifier::{LogNotifier, Navigator, Notifier};
pub use state::{
    BulkOutcome, ConfirmSurface, DetailDialog, FormSession, PendingConfirmation, ReportState,
};
pub use transport::{bulk_params_map, LinkView, ViewRequest, ViewTransport};

// Re-export core types for convenience
pub use advreport_core::{
    ControllerConfig, ItemId, QueryParams, QueryState, ReportError, ReportResult, TransportError,
};
