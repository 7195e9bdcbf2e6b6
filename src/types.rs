//! Core domain types for depscope.
//!
//! The project tree ([`ProjectNode`]), the per-file call edges
//! ([`FunctionCallEdge`]) and the coarse cross-file dependency records
//! ([`FunctionDependency`]) are plain values: built once per analysis run and
//! handed to the caller, never shared.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Source dialects the analyzer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
}

impl Language {
    /// Map a file extension (including the dot, case-insensitive) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            ".ts" => Some(Self::TypeScript),
            ".tsx" => Some(Self::Tsx),
            ".js" => Some(Self::JavaScript),
            ".jsx" => Some(Self::Jsx),
            _ => None,
        }
    }

    /// Detect the language from the text after the last `.` of a file name or
    /// path. Names without a recognized extension yield `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
        Self::from_extension(&format!(".{ext}"))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
        }
    }

    /// Parse from a string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "typescript" | "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "javascript" | "js" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SyntaxTree
// ---------------------------------------------------------------------------

/// A parsed file: the tree-sitter tree plus the dialect it was parsed with.
///
/// The tree does not own the source text; callers pair it with the file's
/// `raw_text` (see [`ProjectNode::parsed`]). Cloning is cheap because
/// tree-sitter trees are reference counted.
#[derive(Clone)]
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    language: Language,
}

impl SyntaxTree {
    pub fn new(tree: tree_sitter::Tree, language: Language) -> Self {
        Self { tree, language }
    }

    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language)
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// Whether a [`ProjectNode`] is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Dir => "dir",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectNode
// ---------------------------------------------------------------------------

/// A file or directory of the analyzed project.
///
/// `path` is the primary key. `imports` holds paths of other nodes in the same
/// tree (a back-reference by key, never an owning pointer), so cyclic imports
/// are representable without cyclic ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectNode {
    pub id: String,
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip)]
    pub syntax_tree: Option<SyntaxTree>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProjectNode>,
}

impl ProjectNode {
    /// A file node with no source attached.
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(NodeKind::File, name.into(), path.into(), Vec::new())
    }

    /// A directory node owning `children` in the given order.
    pub fn dir(
        name: impl Into<String>,
        path: impl Into<String>,
        children: Vec<ProjectNode>,
    ) -> Self {
        Self::new(NodeKind::Dir, name.into(), path.into(), children)
    }

    fn new(kind: NodeKind, name: String, path: String, children: Vec<ProjectNode>) -> Self {
        Self {
            id: make_node_id(kind, &path),
            name,
            path,
            kind,
            language: None,
            raw_text: None,
            syntax_tree: None,
            imports: Vec::new(),
            children,
        }
    }

    /// Attach source text (and its parse, if it succeeded) to a file node.
    pub fn with_source(
        mut self,
        language: Language,
        raw_text: String,
        syntax_tree: Option<SyntaxTree>,
    ) -> Self {
        self.language = Some(language);
        self.raw_text = Some(raw_text);
        self.syntax_tree = syntax_tree;
        self
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    /// The syntax tree together with the text it was parsed from.
    pub fn parsed(&self) -> Option<(&SyntaxTree, &str)> {
        match (&self.syntax_tree, &self.raw_text) {
            (Some(tree), Some(text)) => Some((tree, text.as_str())),
            _ => None,
        }
    }

    /// All nodes of this subtree, depth-first pre-order, starting with `self`.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// All file nodes of this subtree in pre-order.
    pub fn files(&self) -> impl Iterator<Item = &ProjectNode> {
        self.iter().filter(|n| n.is_file())
    }

    /// Clone everything except `children` and `imports`.
    pub(crate) fn clone_shallow(&self) -> ProjectNode {
        ProjectNode {
            id: self.id.clone(),
            name: self.name.clone(),
            path: self.path.clone(),
            kind: self.kind,
            language: self.language,
            raw_text: self.raw_text.clone(),
            syntax_tree: self.syntax_tree.clone(),
            imports: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Total number of `imports` entries across the subtree.
    pub fn import_count(&self) -> usize {
        self.files().map(|f| f.imports.len()).sum()
    }
}

/// Build a deterministic node ID: `{kind}:{first 16 hex chars of sha256(path)}`.
pub fn make_node_id(kind: NodeKind, path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    let hex = hex::encode(digest);
    format!("{}:{}", kind.as_str(), &hex[..16])
}

// ---------------------------------------------------------------------------
// Call graph
// ---------------------------------------------------------------------------

/// How a call target was matched against the bindings of its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Declared or bound to a function in the same file.
    Local,
    /// Bound by an import declaration in the same file.
    Imported,
    Unknown,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Imported => "imported",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a call expression: 1-based line, 0-based column.
///
/// `column` counts UTF-8 bytes from the start of the line, as tree-sitter
/// reports it, not UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallLocation {
    pub line: u32,
    pub column: u32,
}

/// One call site inside a named function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallEdge {
    /// `name` or `object.property`.
    pub callee: String,
    pub caller: String,
    pub location: CallLocation,
    pub resolution: Resolution,
    /// Module specifier the callee was imported from; set iff `Imported`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_source: Option<String>,
    /// File the call lives in. Filled by the analysis run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Where a top-level function declaration was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSite {
    pub file_path: String,
    pub file_id: String,
}

/// A name-matched cross-file dependency. `caller` and `callee` are the same
/// identifier; see [`crate::resolution::linker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDependency {
    pub caller: String,
    pub callee: String,
    /// File containing the call.
    pub file: String,
    pub declared_in: FunctionSite,
}

// ---------------------------------------------------------------------------
// FileError
// ---------------------------------------------------------------------------

/// A file that could not be parsed. The run records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub path: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
