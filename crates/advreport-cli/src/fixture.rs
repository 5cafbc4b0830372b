//! Fixture-directory transport.
//!
//! Serves recorded backend responses from a directory:
//!
//! | request                   | file                               |
//! |---------------------------|------------------------------------|
//! | `fetch`                   | `fetch.json`                       |
//! | `form` for `m`            | `form_m.json`                      |
//! | `action` for `m`          | `action_m.json`                    |
//! | `multiple_action` for `m` | `multiple_action_m.json`           |
//! | lazy content `m` of `id`  | `lazy/m_id.html`                   |
//!
//! A missing file answers with status 404.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use advreport_core::{QueryParams, TransportError};
use advreport_engine::{LinkView, ViewRequest, ViewTransport};
use futures::future::BoxFuture;
use serde_json::{Map, Value};

pub struct FixtureTransport {
    dir: PathBuf,
}

impl FixtureTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn response_path(&self, request: &ViewRequest) -> PathBuf {
        let file = match request.method() {
            Some(method) => format!("{}_{}.json", request.action_name(), method),
            None => format!("{}.json", request.action_name()),
        };
        self.dir.join(file)
    }

    /// Map `<base>action/<method>/<id>/` to `lazy/<method>_<id>.html`.
    fn fragment_path(&self, url: &str) -> Option<PathBuf> {
        let mut segments = url.trim_end_matches('/').rsplit('/');
        let id = segments.next().filter(|s| !s.is_empty())?;
        let method = segments.next().filter(|s| !s.is_empty())?;
        if segments.next()? != "action" {
            return None;
        }
        Some(self.dir.join("lazy").join(format!("{}_{}.html", method, id)))
    }
}

fn read_fixture(path: &Path) -> Result<String, TransportError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TransportError::Request {
            status: 404,
            message: format!("no fixture at {}", path.display()),
        },
        _ => TransportError::Unavailable(format!("{}: {}", path.display(), e)),
    })
}

impl ViewTransport for FixtureTransport {
    fn action(&self, request: ViewRequest) -> BoxFuture<'static, Result<Value, TransportError>> {
        let path = self.response_path(&request);
        tracing::debug!(
            "{} {:?} -> {}",
            request.action_name(),
            serde_json::Value::Object(request.params()),
            path.display()
        );
        Box::pin(async move {
            let text = read_fixture(&path)?;
            serde_json::from_str(&text)
                .map_err(|e| TransportError::Decode(format!("{}: {}", path.display(), e)))
        })
    }

    fn action_link(&self, view: LinkView, params: &Map<String, Value>) -> String {
        let params: QueryParams = params
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k.clone(), s.clone()),
                other => (k.clone(), other.to_string()),
            })
            .collect();
        format!("/{}/{}", view.name(), params.to_query_string())
    }

    fn get(&self, url: String) -> BoxFuture<'static, Result<String, TransportError>> {
        let path = self.fragment_path(&url);
        Box::pin(async move {
            match path {
                Some(path) => read_fixture(&path),
                None => Err(TransportError::Request {
                    status: 404,
                    message: format!("no fixture for {}", url),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advreport_core::{BulkParams, ItemId};
    use serde_json::json;
    use tempfile::TempDir;

    fn fixtures() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("fetch.json"), r#"{"items": [], "item_count": 0}"#)
            .unwrap();
        std::fs::write(dir.path().join("action_approve.json"), r#"{"success": "ok"}"#).unwrap();
        std::fs::write(
            dir.path().join("multiple_action_archive.json"),
            r#"{"succeeded": {}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("form_edit.json"), "not json").unwrap();
        std::fs::create_dir(dir.path().join("lazy")).unwrap();
        std::fs::write(dir.path().join("lazy").join("history_5.html"), "<ul/>").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serves_recorded_responses() {
        let dir = fixtures();
        let transport = FixtureTransport::new(dir.path());

        let fetched = transport
            .action(ViewRequest::Fetch {
                query_string: "?page=1".into(),
            })
            .await
            .unwrap();
        assert_eq!(fetched["item_count"], json!(0));

        let action = transport
            .action(ViewRequest::Action {
                method: "approve".into(),
                pk: Some(ItemId::from("5")),
                data: None,
            })
            .await
            .unwrap();
        assert_eq!(action, json!({"success": "ok"}));

        let bulk = transport
            .action(ViewRequest::MultipleAction {
                params: BulkParams {
                    report_method: "archive".into(),
                    items: "5".into(),
                    global: false,
                },
                data: None,
            })
            .await
            .unwrap();
        assert_eq!(bulk, json!({"succeeded": {}}));
    }

    #[tokio::test]
    async fn test_missing_fixture_is_404() {
        let dir = fixtures();
        let transport = FixtureTransport::new(dir.path());

        let err = transport
            .action(ViewRequest::Action {
                method: "delete".into(),
                pk: None,
                data: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_malformed_fixture_is_decode_error() {
        let dir = fixtures();
        let transport = FixtureTransport::new(dir.path());

        let err = transport
            .action(ViewRequest::Form {
                method: "edit".into(),
                pk: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_lazy_fragments() {
        let dir = fixtures();
        let transport = FixtureTransport::new(dir.path());

        let fragment = transport.get("/r/action/history/5/".into()).await.unwrap();
        assert_eq!(fragment, "<ul/>");

        assert!(transport.get("/r/action/notes/5/".into()).await.is_err());
        assert!(transport.get("/r/other/5/".into()).await.is_err());
    }

    #[test]
    fn test_action_link() {
        let transport = FixtureTransport::new("unused");
        let mut params = Map::new();
        params.insert("report_method".into(), json!("open"));
        params.insert("pk".into(), json!("5"));
        assert_eq!(
            transport.action_link(LinkView::ActionView, &params),
            "/action_view/?pk=5&report_method=open"
        );
    }
}
