//! Configuration loading.
//!
//! Sources, first match wins:
//! 1. an explicit path (CLI `--config`), which must exist;
//! 2. `<root>/.depscope.yaml` in the analyzed directory;
//! 3. `config.yaml` in the per-user config directory;
//! 4. built-in defaults.

pub mod schema;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DepScopeError, Result};

pub use schema::{AnalyzerConfig, ExcludeConfig};

/// Per-project config file name.
pub const CONFIG_FILE_NAME: &str = ".depscope.yaml";

/// Load the effective configuration for a run rooted at `root`.
pub fn load_config(explicit: Option<&Path>, root: Option<&Path>) -> Result<AnalyzerConfig> {
    match resolve_config_path(explicit, root, user_config_path()) {
        Some(path) => load_from_file(&path),
        None => {
            debug!("no config file found, using defaults");
            Ok(AnalyzerConfig::default())
        }
    }
}

/// Parse one YAML config file.
pub fn load_from_file(path: &Path) -> Result<AnalyzerConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DepScopeError::Config(format!("cannot read {}: {e}", path.display())))?;
    let mut config = parse_yaml(&text)
        .map_err(|e| DepScopeError::Config(format!("{}: {e}", path.display())))?;
    config.exclude.normalize();
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn parse_yaml(text: &str) -> std::result::Result<AnalyzerConfig, serde_yaml::Error> {
    // An empty file deserializes as unit, not as an empty mapping.
    if text.trim().is_empty() {
        return Ok(AnalyzerConfig::default());
    }
    serde_yaml::from_str(text)
}

/// `config.yaml` inside the platform's per-user config directory.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "depscope")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}

fn resolve_config_path(
    explicit: Option<&Path>,
    root: Option<&Path>,
    user: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(candidate) = root.map(|r| r.join(CONFIG_FILE_NAME)) {
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    user.filter(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("custom.yaml");
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();
        let found = resolve_config_path(Some(explicit.as_path()), Some(tmp.path()), None);
        assert_eq!(found, Some(explicit));
    }

    #[test]
    fn project_file_before_user_file() {
        let tmp = TempDir::new().unwrap();
        let user = tmp.path().join("user.yaml");
        std::fs::write(&user, "").unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = resolve_config_path(None, Some(tmp.path()), Some(user.clone()));
        assert_eq!(found, Some(tmp.path().join(CONFIG_FILE_NAME)));

        let other = TempDir::new().unwrap();
        let found = resolve_config_path(None, Some(other.path()), Some(user.clone()));
        assert_eq!(found, Some(user));
    }

    #[test]
    fn missing_everything_means_defaults() {
        let tmp = TempDir::new().unwrap();
        let found = resolve_config_path(None, Some(tmp.path()), Some(tmp.path().join("nope")));
        assert_eq!(found, None);
    }

    #[test]
    fn load_from_file_applies_extras() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "exclude:\n  extra_dirs: [vendor]\nrespect_gitignore: true\n")
            .unwrap();
        let config = load_from_file(&path).unwrap();
        assert!(config.respect_gitignore);
        assert!(config.is_excluded("vendor"));
        assert!(config.is_excluded("node_modules"));
    }

    #[test]
    fn empty_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(load_from_file(&path).unwrap(), AnalyzerConfig::default());
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "exclude: [not, a, mapping\n").unwrap();
        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, DepScopeError::Config(_)));
    }

    #[test]
    fn missing_explicit_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(Some(tmp.path().join("absent.yaml").as_path()), None).unwrap_err();
        assert!(matches!(err, DepScopeError::Config(_)));
    }
}
