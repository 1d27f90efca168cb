use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tabula_editor::{EngineConfig, DEFAULT_CONFIG_NAME};
use tracing::debug;

/// Resolve the engine config: an explicit path must exist, otherwise
/// `tabula.config.json` in `cwd` is used when present
pub fn load(cwd: &Path, explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            path.to_path_buf()
        }
        None => default_path(cwd),
    };

    debug!(path = %path.display(), exists = path.exists(), "Loading engine config");
    EngineConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

pub fn default_path(cwd: &Path) -> PathBuf {
    cwd.join(DEFAULT_CONFIG_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path(), None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_reads_config_from_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            default_path(dir.path()),
            r#"{ "boundaryTolerance": 5, "balanceAfterColumnEdit": true }"#,
        )
        .unwrap();

        let config = load(dir.path(), None).unwrap();
        assert_eq!(config.boundary_tolerance, 5.0);
        assert!(config.balance_after_column_edit);
        assert_eq!(config.default_column_width, 100.0);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(load(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(default_path(dir.path()), "{ not json").unwrap();
        let err = load(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
