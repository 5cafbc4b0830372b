//! Plain-text rendering of a report state.

use std::fmt::Write;

use advreport_engine::{ActionTarget, ReportState};

/// Render `state` plus any navigations the run triggered.
pub fn render(state: &ReportState, navigations: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "query: {}", state.query.to_query_string());

    if let Some(error) = &state.error {
        let _ = writeln!(out, "fetch error: {}", error);
    }

    if let Some(report) = &state.report {
        let _ = writeln!(
            out,
            "items: {} of {} (page {}/{})",
            report.items.len(),
            report.item_count,
            state.query.page(),
            state.page_count()
        );
        for item in &report.items {
            let marker = match (item.expanded, state.is_selected(&item.item_id)) {
                (true, true) => "[+*]",
                (true, false) => "[+] ",
                (false, true) => "[*] ",
                (false, false) => "[ ] ",
            };
            let actions: Vec<&str> = item.actions.iter().map(|a| a.method.as_str()).collect();
            let _ = writeln!(
                out,
                "  {} {} actions=[{}]",
                marker,
                item.item_id,
                actions.join(",")
            );
        }
    }

    let _ = writeln!(out, "selected: {}", state.selected_count());
    if let Some(method) = &state.bulk_action {
        let _ = writeln!(out, "bulk action: {}", method);
    }
    if !state.bulk_outcome.is_empty() {
        let _ = writeln!(
            out,
            "bulk outcome: {} succeeded, {} failed",
            state.bulk_outcome.succeeded.len(),
            state.bulk_outcome.failed.len()
        );
    }

    let mut tokens: Vec<&String> = state.lazy_content.keys().collect();
    tokens.sort();
    for token in tokens {
        let content = state.lazy(token).unwrap_or_default();
        let _ = writeln!(out, "lazy {}: {} byte(s)", token, content.len());
    }

    if let Some(form) = &state.form {
        let target = match &form.target {
            ActionTarget::Item(id) => format!("item {}", id),
            ActionTarget::Bulk => "bulk".to_string(),
        };
        let _ = writeln!(out, "form: {} ({})", form.action.method, target);
    }
    if let Some(pending) = &state.pending {
        let _ = writeln!(
            out,
            "awaiting confirmation: {} {}",
            pending.action().method,
            pending.prompt().unwrap_or_default()
        );
    }
    if let Some(detail) = &state.detail {
        let _ = writeln!(out, "detail ({}): {}", detail.action.method, detail.content);
    }
    if let Some(message) = &state.error_message {
        let _ = writeln!(out, "action error: {}", message);
    }
    for url in navigations {
        let _ = writeln!(out, "navigated: {}", url);
    }
    out
}
