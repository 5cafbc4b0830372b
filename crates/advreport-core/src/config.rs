//! Controller configuration.
//!
//! These are the per-view parameters a report view is mounted with. They
//! can be written in a TOML file; every field has a default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Per-view controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// URL prefix for lazy-content fetches, e.g. `/backoffice/reports/orders/`.
    pub base: String,

    /// Mirror query state into the location and follow location changes.
    pub update_location: bool,

    /// View embedded as a picker; rows never expand.
    pub select_mode: bool,

    /// `"*"` or a comma list of methods rendered as standalone buttons.
    pub single_action: Option<String>,

    /// Width used for detail dialogs that don't specify a style.
    pub dialog_width: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base: "/".to_string(),
            update_location: true,
            select_mode: false,
            single_action: None,
            dialog_width: "auto".to_string(),
        }
    }
}

impl ControllerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded controller config from {:?}", path);
        Ok(config)
    }

    /// Load from `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Whether `method` is listed as a standalone action.
    pub fn lists_single_action(&self, method: &str) -> bool {
        match self.single_action.as_deref() {
            None | Some("") => false,
            Some("*") => true,
            Some(list) => list.split(',').any(|m| m.trim() == method),
        }
    }
}

/// Get the default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("advreport").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.base, "/");
        assert!(config.update_location);
        assert!(!config.select_mode);
        assert_eq!(config.dialog_width, "auto");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
            base = "/bo/orders/"
            single_action = "approve,reject"
            "#,
        )
        .unwrap();
        assert_eq!(config.base, "/bo/orders/");
        assert!(config.update_location);
        assert!(config.lists_single_action("reject"));
        assert!(!config.lists_single_action("delete"));
    }

    #[test]
    fn test_wildcard_single_action() {
        let config = ControllerConfig {
            single_action: Some("*".to_string()),
            ..ControllerConfig::default()
        };
        assert!(config.lists_single_action("anything"));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ControllerConfig::from_toml_str("base = [");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "select_mode = true").unwrap();

        let config = ControllerConfig::load(file.path()).unwrap();
        assert!(config.select_mode);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ControllerConfig::load_or_default(&dir.path().join("none.toml")).unwrap();
        assert_eq!(config, ControllerConfig::default());
    }
}
