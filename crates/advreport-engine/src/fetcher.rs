//! Report snapshot retrieval.

use advreport_core::{QueryState, ReportResult, ReportSnapshot};
use std::sync::Arc;

use crate::transport::{ViewRequest, ViewTransport};

/// Fetches and decodes report snapshots for a query.
pub struct ReportFetcher {
    transport: Arc<dyn ViewTransport>,
}

impl ReportFetcher {
    pub fn new(transport: Arc<dyn ViewTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the snapshot for `query`.
    pub async fn fetch(&self, query: &QueryState) -> ReportResult<ReportSnapshot> {
        let query_string = query.to_query_string();
        tracing::debug!("Fetching report {}", query_string);

        let raw = self
            .transport
            .action(ViewRequest::Fetch { query_string })
            .await?;
        let snapshot: ReportSnapshot = serde_json::from_value(raw)?;

        tracing::debug!(
            "Fetched {} of {} item(s)",
            snapshot.items.len(),
            snapshot.item_count
        );
        Ok(snapshot)
    }
}
