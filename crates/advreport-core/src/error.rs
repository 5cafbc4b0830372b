//! Error types for the report controller.

use thiserror::Error;

use crate::item::ItemId;

/// Failures reported by a view transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("Request failed ({status}): {message}")]
    Request { status: u16, message: String },

    /// The backend answered but the payload could not be read.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The transport could not reach the backend at all.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Controller errors - surfaced to the rendering layer as messages.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response did not match the expected shape.
    #[error("Malformed report payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The referenced item is not part of the current snapshot.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// The referenced action is not offered for the target.
    #[error("Action not found: {method}")]
    ActionNotFound { method: String },

    /// No report has been fetched yet.
    #[error("No report loaded")]
    NoReport,

    /// A form operation was requested while no form is open.
    #[error("No form is open")]
    NoOpenForm,

    /// Confirmation was requested while nothing awaits confirmation.
    #[error("Nothing is awaiting confirmation")]
    NoPendingConfirmation,

    /// A bulk action was requested without a chosen bulk method.
    #[error("No bulk action selected")]
    NoBulkAction,
}

/// Result type alias using ReportError.
pub type ReportResult<T> = Result<T, ReportError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_message() {
        let error = TransportError::Request {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "Request failed (500): boom");
    }

    #[test]
    fn test_report_error_is_transparent_for_transport() {
        let error: ReportError = TransportError::Unavailable("offline".to_string()).into();
        assert_eq!(error.to_string(), "Transport unavailable: offline");
        assert!(matches!(error, ReportError::Transport(_)));
    }

    #[test]
    fn test_item_not_found_names_item() {
        let error = ReportError::ItemNotFound(ItemId::from("42"));
        assert!(error.to_string().contains("42"));
    }
}
