//! Collaborators the controller reports to: user notifications and the
//! browser location.

use advreport_core::QueryParams;

/// Surfaces short messages to the user.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Positive confirmation, e.g. after an action succeeded.
    fn show_success(&self, message: &str);

    /// Failure message for an action that went wrong.
    fn show_error(&self, message: &str);
}

/// The view's location.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Leave the report for `url`.
    fn navigate(&self, url: &str);

    /// Mirror the current query into the location without navigating.
    fn replace_query(&self, params: &QueryParams);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_success(&self, message: &str) {
        tracing::info!("Success: {}", message);
    }

    fn show_error(&self, message: &str) {
        tracing::error!("Error: {}", message);
    }
}
