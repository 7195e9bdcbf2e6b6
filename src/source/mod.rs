//! Where project files come from.
//!
//! The analysis run only needs two things from a source tree: the entries of
//! one directory, and the text behind a file entry. [`SourceTreeProvider`]
//! captures exactly that, so the run works the same over a local checkout
//! ([`LocalTreeProvider`]) or an in-memory map of files
//! ([`MemoryTreeProvider`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ignore::WalkBuilder;
use regex::Regex;
use tracing::debug;

use crate::error::{DepScopeError, Result};

// ---------------------------------------------------------------------------
// Provider interface
// ---------------------------------------------------------------------------

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    File {
        name: String,
        /// Project-relative, `/`-separated.
        path: String,
        /// Opaque handle for [`SourceTreeProvider::fetch_content`].
        content_ref: String,
    },
    Dir {
        name: String,
        path: String,
    },
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Dir { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Dir { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir { .. })
    }
}

/// A listable, readable project tree.
///
/// Both operations fail with [`DepScopeError::Fetch`].
pub trait SourceTreeProvider {
    /// Entries directly under `path` (`""` is the root), in a stable order.
    fn list(&self, path: &str) -> Result<Vec<TreeEntry>>;

    /// Full text of a file entry.
    fn fetch_content(&self, content_ref: &str) -> Result<String>;
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

// ---------------------------------------------------------------------------
// LocalTreeProvider
// ---------------------------------------------------------------------------

/// A directory on the local filesystem.
///
/// Symlinks are skipped. With `respect_gitignore`, entries matched by
/// `.gitignore` files (also outside a git repository) are left out of
/// listings.
#[derive(Debug, Clone)]
pub struct LocalTreeProvider {
    base: PathBuf,
    respect_gitignore: bool,
}

impl LocalTreeProvider {
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        if !base.is_dir() {
            return Err(DepScopeError::fetch(
                base.display().to_string(),
                "not a directory",
            ));
        }
        Ok(Self {
            base,
            respect_gitignore: false,
        })
    }

    #[must_use]
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        if rel.is_empty() {
            self.base.clone()
        } else {
            self.base.join(rel)
        }
    }
}

impl SourceTreeProvider for LocalTreeProvider {
    fn list(&self, path: &str) -> Result<Vec<TreeEntry>> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Err(DepScopeError::fetch(
                dir.display().to_string(),
                "not a directory",
            ));
        }

        let mut builder = WalkBuilder::new(&dir);
        builder
            .max_depth(Some(1))
            .hidden(false)
            .ignore(false)
            .git_global(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let mut entries = Vec::new();
        for result in builder.build() {
            let entry = result.map_err(|e| DepScopeError::fetch(dir.display().to_string(), e))?;
            if entry.depth() == 0 {
                continue;
            }
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() {
                debug!(path = %entry.path().display(), "skipping symlink");
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = join_path(path, &name);
            if file_type.is_dir() {
                entries.push(TreeEntry::Dir { name, path: rel });
            } else if file_type.is_file() {
                entries.push(TreeEntry::File {
                    name,
                    content_ref: rel.clone(),
                    path: rel,
                });
            }
        }
        Ok(entries)
    }

    /// Invalid UTF-8 is replaced with U+FFFD rather than failing the file.
    fn fetch_content(&self, content_ref: &str) -> Result<String> {
        let bytes = std::fs::read(self.resolve(content_ref))
            .map_err(|e| DepScopeError::fetch(content_ref, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!(path = content_ref, "decoding non-UTF-8 file lossily");
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryTreeProvider
// ---------------------------------------------------------------------------

/// Files held in memory, keyed by project-relative path. Directories are
/// implied by the paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryTreeProvider {
    files: BTreeMap<String, String>,
}

impl MemoryTreeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        self.files
            .insert(path.trim_start_matches('/').to_string(), content.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceTreeProvider for MemoryTreeProvider {
    fn list(&self, path: &str) -> Result<Vec<TreeEntry>> {
        let dir = path.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut by_name: BTreeMap<&str, TreeEntry> = BTreeMap::new();
        for file_path in self.files.keys() {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            let entry = match rest.split_once('/') {
                Some((name, _)) => TreeEntry::Dir {
                    name: name.to_string(),
                    path: join_path(dir, name),
                },
                None => TreeEntry::File {
                    name: rest.to_string(),
                    path: file_path.clone(),
                    content_ref: file_path.clone(),
                },
            };
            let name = rest.split('/').next().unwrap_or(rest);
            by_name.entry(name).or_insert(entry);
        }

        if by_name.is_empty() && !dir.is_empty() {
            return Err(DepScopeError::fetch(dir, "no such directory"));
        }
        Ok(by_name.into_values().collect())
    }

    fn fetch_content(&self, content_ref: &str) -> Result<String> {
        self.files
            .get(content_ref)
            .cloned()
            .ok_or_else(|| DepScopeError::fetch(content_ref, "no such file"))
    }
}

// ---------------------------------------------------------------------------
// RepoLocator
// ---------------------------------------------------------------------------

static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/(.*?)/?$").expect("valid GitHub URL regex")
});

/// A validated root identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocator {
    /// A local directory (plain path or `file://` URL).
    Local(PathBuf),
    /// `https://github.com/<owner>/<repo>/<path>`; `path` may be empty.
    GitHub {
        owner: String,
        repo: String,
        path: String,
    },
}

impl RepoLocator {
    /// Validate `input` before anything is fetched.
    ///
    /// Anything URL-shaped that is neither a `file://` URL nor a GitHub tree
    /// URL fails with [`DepScopeError::InvalidUrlFormat`].
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DepScopeError::InvalidUrlFormat(input.to_string()));
        }
        if let Some(rest) = input.strip_prefix("file://") {
            if rest.is_empty() {
                return Err(DepScopeError::InvalidUrlFormat(input.to_string()));
            }
            return Ok(Self::Local(PathBuf::from(rest)));
        }

        if let Some(caps) = GITHUB_URL.captures(input) {
            return Ok(Self::GitHub {
                owner: caps[1].to_string(),
                repo: caps[2].to_string(),
                path: caps[3].to_string(),
            });
        }

        if input.contains("://") || input.starts_with("github.com/") {
            return Err(DepScopeError::InvalidUrlFormat(input.to_string()));
        }
        Ok(Self::Local(PathBuf::from(input)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::GitHub { .. })
    }
}

impl std::fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::GitHub { owner, repo, path } if path.is_empty() => {
                write!(f, "github.com/{owner}/{repo}")
            }
            Self::GitHub { owner, repo, path } => write!(f, "github.com/{owner}/{repo}/{path}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
