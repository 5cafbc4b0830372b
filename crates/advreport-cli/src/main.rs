//! `advreport` - replay a report view against recorded backend responses.
//!
//! Startup order:
//! 1. Initialize tracing
//! 2. Parse arguments and load the controller config
//! 3. Fetch the report, then run the requested interactions
//! 4. Print the resulting state

mod args;
mod error;
mod fixture;
mod summary;

use std::process::ExitCode;
use std::sync::Arc;

use advreport_core::{default_config_path, ControllerConfig, ItemId, QueryParams, QueryState};
use advreport_engine::{LogNotifier, Navigator, ReportController, ReportResult};
use clap::Parser;
use parking_lot::Mutex;

use args::CliArgs;
use error::CliResult;
use fixture::FixtureTransport;

/// Initialize the tracing subscriber for structured logging.
///
/// Log levels can be controlled via the `RUST_LOG` environment variable:
/// - `RUST_LOG=debug` - Enable debug logs for all modules
/// - `RUST_LOG=warn,advreport=info` - Quieter output
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info")
            .add_directive("advreport=debug".parse().expect("valid directive"))
            .add_directive("advreport_engine=debug".parse().expect("valid directive"))
            .add_directive("advreport_core=debug".parse().expect("valid directive"))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
}

/// Navigator that logs and remembers where the view went.
#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        tracing::info!("Navigate: {}", url);
        self.visited.lock().push(url.to_string());
    }

    fn replace_query(&self, params: &QueryParams) {
        tracing::debug!("Location: {}", params.to_query_string());
    }
}

fn load_config(args: &CliArgs) -> CliResult<ControllerConfig> {
    let config = match &args.config {
        Some(path) => ControllerConfig::load(path)?,
        None => match default_config_path() {
            Some(path) => ControllerConfig::load_or_default(&path)?,
            None => ControllerConfig::default(),
        },
    };
    Ok(config)
}

/// Log a failed interaction; the controller already recorded it on the state.
fn note(result: ReportResult<()>, what: &str) {
    if let Err(e) = result {
        tracing::warn!("{} failed: {}", what, e);
    }
}

/// Submit a form the last action opened, then confirm what it asks for.
async fn settle(controller: &ReportController, args: &CliArgs) {
    if let Some(data) = &args.form_data {
        if controller.with_state(|s| s.form.is_some()) {
            note(controller.submit_form(data.clone()).await, "Form submission");
        }
    }
    if args.confirm && controller.with_state(|s| s.pending.is_some()) {
        note(controller.confirm_pending().await, "Confirmation");
    }
}

async fn run(args: CliArgs) -> CliResult<String> {
    let config = load_config(&args)?;
    let transport = Arc::new(FixtureTransport::new(&args.fixtures));
    let navigator = Arc::new(RecordingNavigator::default());

    let mut controller =
        ReportController::new(transport, Arc::new(LogNotifier), navigator.clone(), config);
    if let Some(query) = &args.query {
        controller = controller.with_query(QueryState::from_params(&QueryParams::parse(query)));
    }

    controller.fetch_report().await?;

    for id in &args.expand {
        controller.toggle_expand(&ItemId::from(id.as_str())).await?;
    }

    for action in &args.action {
        note(
            controller
                .execute_action(&action.item_id, &action.method, false)
                .await,
            &format!("Action {}:{}", action.item_id, action.method),
        );
        settle(&controller, &args).await;
    }

    if let Some(bulk) = &args.bulk {
        for id in &bulk.item_ids {
            controller.set_item_selected(id, true);
        }
        controller.select_bulk_action(Some(bulk.method.clone()));
        note(
            controller.execute_bulk_action(None).await,
            &format!("Bulk action {}", bulk.method),
        );
        settle(&controller, &args).await;
    }

    Ok(summary::render(&controller.state(), &navigator.visited()))
}

fn main() -> ExitCode {
    init_tracing();
    let args = CliArgs::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", error::CliError::from(e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(summary) => {
            print!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    fn fixtures() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(&dir, "config.toml", "base = \"/r/\"\nupdate_location = true\n");
        write(
            &dir,
            "fetch.json",
            r#"{
                "items": [
                    {"item_id": 5, "extra_information": "<p ng-bind-html-unsafe=\"lazydiv__5__history\"></p>",
                     "actions": [{"method": "approve"}, {"method": "delete", "confirm": true}]},
                    {"item_id": 6, "actions": [{"method": "approve"}]}
                ],
                "item_count": 2,
                "items_per_page": 10,
                "multiple_actions": true,
                "multiple_action_list": [{"method": "archive", "form": "<form/>"}]
            }"#,
        );
        write(&dir, "action_approve.json", r#"{"success": "Approved", "item": {"state": "ok"}}"#);
        write(&dir, "action_delete.json", r#"{"success": "Deleted"}"#);
        write(&dir, "multiple_action_archive.json", r#"{"succeeded": {"5": true}, "failed": {}}"#);
        write(&dir, "lazy/history_5.html", "<ul><li>created</li></ul>");
        dir
    }

    fn args(dir: &TempDir, extra: &[&str]) -> CliArgs {
        let config = dir.path().join("config.toml");
        let mut argv = vec![
            "advreport".to_string(),
            dir.path().display().to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_run_expand_and_actions() {
        let dir = fixtures();
        let summary = run(args(
            &dir,
            &["--expand", "5", "--action", "6:approve", "--action", "5:delete", "--confirm"],
        ))
        .await
        .unwrap();

        assert!(summary.contains("lazy lazydiv__5__history: 25 byte(s)"));
        assert!(summary.contains("items: 1 of 2"));
        assert!(summary.contains("[ ]  6 actions=[approve]"));
        assert!(!summary.contains("awaiting confirmation"));
    }

    #[tokio::test]
    async fn test_run_bulk_with_form() {
        let dir = fixtures();
        let summary = run(args(
            &dir,
            &["--bulk", "archive:5,6", "--form-data", "reason=old"],
        ))
        .await
        .unwrap();

        assert!(summary.contains("bulk outcome: 1 succeeded, 0 failed"));
        assert!(summary.contains("selected: 0"));
        assert!(!summary.contains("form:"));
    }

    #[tokio::test]
    async fn test_run_reports_missing_action_fixture() {
        let dir = fixtures();
        write(
            &dir,
            "fetch.json",
            r#"{"items": [{"item_id": 7, "actions": [{"method": "reject"}]}], "item_count": 1}"#,
        );
        let summary = run(args(&dir, &["--action", "7:reject"])).await.unwrap();
        assert!(summary.contains("action error: Request failed (404)"));
    }

    #[tokio::test]
    async fn test_run_missing_fetch_fails() {
        let dir = TempDir::new().unwrap();
        write(&dir, "config.toml", "");
        assert!(run(args(&dir, &[])).await.is_err());
    }
}
