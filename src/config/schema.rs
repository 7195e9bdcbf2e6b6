//! Configuration data structures for depscope.
//!
//! Defines the YAML config format: exclusion lists and directory-walk
//! behavior. Every field has a default so partial files are valid.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Names skipped before recursion or parsing.
    #[serde(default)]
    pub exclude: ExcludeConfig,

    /// Honor `.gitignore` files when listing a local directory.
    #[serde(default)]
    pub respect_gitignore: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            exclude: ExcludeConfig::default(),
            respect_gitignore: false,
        }
    }
}

impl AnalyzerConfig {
    /// Whether an entry with this file or directory name is skipped.
    ///
    /// Names are matched exactly against both lists regardless of entry kind.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.files.contains(name) || self.exclude.dirs.contains(name)
    }
}

// ---------------------------------------------------------------------------
// ExcludeConfig
// ---------------------------------------------------------------------------

/// Exact-name exclusion lists.
///
/// `files` and `dirs` replace the defaults when present; `extra_files` and
/// `extra_dirs` are added on top of whatever `files` and `dirs` end up being.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeConfig {
    #[serde(default = "default_excluded_files")]
    pub files: BTreeSet<String>,

    #[serde(default = "default_excluded_dirs")]
    pub dirs: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_dirs: Vec<String>,
}

impl Default for ExcludeConfig {
    fn default() -> Self {
        Self {
            files: default_excluded_files(),
            dirs: default_excluded_dirs(),
            extra_files: Vec::new(),
            extra_dirs: Vec::new(),
        }
    }
}

impl ExcludeConfig {
    /// Fold `extra_files` / `extra_dirs` into the main sets.
    pub(crate) fn normalize(&mut self) {
        self.files.extend(self.extra_files.drain(..));
        self.dirs.extend(self.extra_dirs.drain(..));
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Tooling and manifest files that are never part of the analyzed sources.
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "README.md",
    "LICENSE",
    "vite.config.ts",
    "vite.config.js",
    "tsconfig.json",
    "webpack.config.js",
    "yarn.lock",
    ".gitignore",
    ".eslintrc.cjs",
    ".prettierrc",
    ".prettierrc.json",
    ".prettierrc.json5",
    ".prettierrc.yaml",
    ".prettierrc.yml",
    "config.json",
    "tsconfig.app.json",
    "index.html",
    "vite-env.d.ts",
    "prompt",
    "jest.config.js",
    "babel.config.js",
    "jest.config.ts",
    "jest.config.json",
    "jest.setup.ts",
    "jest.setup.js",
    "jest.setup.json",
    "jest.setup.babel.js",
    "jest.setup.babel.ts",
    "jest.setup.babel.json",
    "tsconfig.node.json",
    "postcss.config.js",
    "tailwind.config.js",
    "tailwind.config.ts",
    "eslint.config.js",
];

pub const DEFAULT_EXCLUDED_DIRS: &[&str] =
    &["node_modules", ".git", "dist", "build", "coverage", ".bolt"];

fn default_version() -> String {
    "1.0".to_string()
}

fn default_excluded_files() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect()
}

fn default_excluded_dirs() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(!config.respect_gitignore);
        assert_eq!(config.exclude.files.len(), DEFAULT_EXCLUDED_FILES.len());
        assert_eq!(config.exclude.dirs.len(), DEFAULT_EXCLUDED_DIRS.len());
    }

    #[test_case("node_modules" ; "dependency dir")]
    #[test_case(".git" ; "vcs dir")]
    #[test_case("package.json" ; "manifest")]
    #[test_case("vite-env.d.ts" ; "ambient types")]
    #[test_case("prompt" ; "bare name")]
    fn default_exclusions(name: &str) {
        assert!(AnalyzerConfig::default().is_excluded(name));
    }

    #[test_case("src" ; "source dir")]
    #[test_case("index.ts" ; "entry file")]
    #[test_case("Package.json" ; "case sensitive")]
    fn not_excluded(name: &str) {
        assert!(!AnalyzerConfig::default().is_excluded(name));
    }

    #[test]
    fn serde_yaml_roundtrip() {
        let mut config = AnalyzerConfig::default();
        config.respect_gitignore = true;
        config.exclude.dirs.insert("vendor".into());

        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: AnalyzerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "respect_gitignore: true\n";
        let config: AnalyzerConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.respect_gitignore);
        assert_eq!(config.version, "1.0");
        assert!(config.is_excluded("node_modules"));
    }

    #[test]
    fn explicit_list_replaces_defaults() {
        let yaml = "exclude:\n  dirs: [vendor]\n";
        let config: AnalyzerConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.is_excluded("vendor"));
        assert!(!config.is_excluded("node_modules"));
        assert!(config.is_excluded("package.json"));
    }

    #[test]
    fn extras_extend_defaults() {
        let yaml = "exclude:\n  extra_dirs: [vendor]\n  extra_files: [setup.ts]\n";
        let mut config: AnalyzerConfig = serde_yaml::from_str(yaml).unwrap();
        config.exclude.normalize();
        assert!(config.is_excluded("vendor"));
        assert!(config.is_excluded("setup.ts"));
        assert!(config.is_excluded("node_modules"));
        assert!(config.exclude.extra_dirs.is_empty());
    }
}
