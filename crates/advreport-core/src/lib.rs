//! Core types for server-driven report views.
//!
//! This crate contains the data model shared by the controller and its
//! front ends:
//! - Report snapshots, items and action descriptors
//! - Query state and its URL encoding
//! - Selection tracking
//! - Lazy-content directives
//! - Action response classification
//! - Configuration and error types

mod action;
mod config;
mod error;
mod item;
mod lazy;
mod query;
mod response;
mod selection;
mod snapshot;

pub use action::{ActionDescriptor, ActionList, Confirm, FormSpec};
pub use config::{default_config_path, ControllerConfig};
pub use error::{ConfigError, ReportError, ReportResult, TransportError};
pub use item::{Item, ItemId};
pub use lazy::{LazyDirective, DIRECTIVE_MARKER, LAZY_KIND};
pub use query::{
    percent_decode, percent_encode, QueryParams, QueryState, SortOrder, ORDER_KEY, PAGE_KEY,
};
pub use response::{is_truthy, payload_item_id, ActionResponse, LinkAction};
pub use selection::{BulkParams, SelectionTracker};
pub use snapshot::{page_count, ReportExtra, ReportSnapshot};
