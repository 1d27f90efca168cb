use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "tabula.config.json";

/// Tunables of the structural editing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Deviation accepted when matching a coordinate to a column boundary
    #[serde(default = "default_boundary_tolerance")]
    pub boundary_tolerance: f32,

    /// Width hint for new and synthetic columns
    #[serde(default = "default_column_width")]
    pub default_column_width: f32,

    /// Base-36 characters in generated ids
    #[serde(default = "default_id_length")]
    pub id_length: usize,

    /// Regeneration attempts on id collision
    #[serde(default = "default_id_retry_limit")]
    pub id_retry_limit: usize,

    /// Rebalance irregular tables after column inserts and deletes
    #[serde(default)]
    pub balance_after_column_edit: bool,
}

fn default_boundary_tolerance() -> f32 {
    2.0
}

fn default_column_width() -> f32 {
    100.0
}

fn default_id_length() -> usize {
    tabula_model::ids::DEFAULT_ID_LENGTH
}

fn default_id_retry_limit() -> usize {
    tabula_model::ids::DEFAULT_RETRY_LIMIT
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load config from a file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self, EditorError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            boundary_tolerance: default_boundary_tolerance(),
            default_column_width: default_column_width(),
            id_length: default_id_length(),
            id_retry_limit: default_id_retry_limit(),
            balance_after_column_edit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "boundaryTolerance": 4,
            "defaultColumnWidth": 80,
            "balanceAfterColumnEdit": true
        }"#;

        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.boundary_tolerance, 4.0);
        assert_eq!(config.default_column_width, 80.0);
        assert!(config.balance_after_column_edit);
        assert_eq!(config.id_length, 6);
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.boundary_tolerance, 2.0);
        assert_eq!(config.default_column_width, 100.0);
        assert!(!config.balance_after_column_edit);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = EngineConfig::load(Path::new("/definitely/not/here.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
