//! Lazy content loading for expanded items.
//!
//! Expanded markup may embed `lazydiv__<item_id>__<method>` directives.
//! Each one becomes an independent GET of `<base>action/<method>/<item_id>/`;
//! fetches run concurrently and results are yielded as they complete.

use advreport_core::LazyDirective;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;

use crate::transport::ViewTransport;

/// Content stored for a directive whose fetch failed.
pub const LAZY_ERROR_MARKER: &str = "error";

/// In-flight lazy fetches, yielding `(token, content)` in completion order.
pub type LazyFetches = FuturesUnordered<BoxFuture<'static, (String, String)>>;

pub struct LazyContentLoader {
    transport: Arc<dyn ViewTransport>,
    base: String,
}

impl LazyContentLoader {
    pub fn new(transport: Arc<dyn ViewTransport>, base: impl Into<String>) -> Self {
        Self {
            transport,
            base: base.into(),
        }
    }

    /// Start a fetch per directive. Failures resolve to
    /// [`LAZY_ERROR_MARKER`] and never abort the others.
    pub fn fetch(&self, directives: Vec<LazyDirective>) -> LazyFetches {
        if !directives.is_empty() {
            tracing::debug!("Loading {} lazy fragment(s)", directives.len());
        }
        directives
            .into_iter()
            .map(|directive| {
                let url = directive.url(&self.base);
                let request = self.transport.get(url.clone());
                async move {
                    match request.await {
                        Ok(content) => (directive.token, content),
                        Err(e) => {
                            tracing::warn!("Lazy fetch {} failed: {}", url, e);
                            (directive.token, LAZY_ERROR_MARKER.to_string())
                        }
                    }
                }
                .boxed()
            })
            .collect()
    }

    /// Fetch every directive and collect the results in completion order.
    pub async fn load(&self, directives: Vec<LazyDirective>) -> Vec<(String, String)> {
        self.fetch(directives).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use advreport_core::TransportError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_load_all_directives() {
        let markup = r#"<div ng-bind-html-unsafe="lazydiv__7__history"></div>
                        <div ng-bind-html-unsafe="lazydiv__7__notes"></div>"#;
        let transport = Arc::new(
            MockTransport::new()
                .with_fragment("/r/action/history/7/", Ok("<ul></ul>".into())),
        );
        let loader = LazyContentLoader::new(transport.clone(), "/r/");

        let mut results = loader.load(LazyDirective::extract(markup)).await;
        results.sort();

        assert_eq!(
            results,
            vec![
                ("lazydiv__7__history".to_string(), "<ul></ul>".to_string()),
                (
                    "lazydiv__7__notes".to_string(),
                    "content of /r/action/notes/7/".to_string()
                ),
            ]
        );
        assert_eq!(transport.gets().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_stores_marker() {
        let transport = Arc::new(MockTransport::new().with_fragment(
            "/r/action/history/7/",
            Err(TransportError::Request {
                status: 404,
                message: "missing".into(),
            }),
        ));
        let loader = LazyContentLoader::new(transport, "/r/");

        let results = loader
            .load(LazyDirective::extract(
                r#"<p ng-bind-html-unsafe="lazydiv__7__history"></p>"#,
            ))
            .await;
        assert_eq!(
            results,
            vec![("lazydiv__7__history".to_string(), LAZY_ERROR_MARKER.to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_arrive_in_completion_order() {
        let markup = r#"<div ng-bind-html-unsafe="lazydiv__7__history"></div>
                        <div ng-bind-html-unsafe="lazydiv__7__notes"></div>"#;
        let transport = Arc::new(MockTransport::new().with_fragment_after(
            "/r/action/history/7/",
            Duration::from_millis(100),
            Ok("slow".into()),
        ));
        let loader = LazyContentLoader::new(transport, "/r/");

        let tokens: Vec<String> = loader
            .load(LazyDirective::extract(markup))
            .await
            .into_iter()
            .map(|(token, _)| token)
            .collect();
        assert_eq!(tokens, vec!["lazydiv__7__notes", "lazydiv__7__history"]);
    }

    #[tokio::test]
    async fn test_no_directives_no_requests() {
        let transport = Arc::new(MockTransport::new());
        let loader = LazyContentLoader::new(transport.clone(), "/r/");
        assert!(loader.load(Vec::new()).await.is_empty());
        assert!(transport.gets().is_empty());
    }
}
