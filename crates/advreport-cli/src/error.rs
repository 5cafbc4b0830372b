use advreport_core::{ConfigError, ReportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
