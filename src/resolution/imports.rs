//! Import path resolution and the file-level import graph.
//!
//! # Strategy
//!
//! 1. For each parsed file, read the source string of every top-level
//!    `import` declaration, in order.
//! 2. Skip package imports (anything not starting with `.`).
//! 3. Resolve the specifier against the importing file's directory with
//!    [`resolve_import_path`]. This is plain string arithmetic; the result may
//!    not exist.
//! 4. Look the result up with [`find_by_path`], which ignores a trailing
//!    `.js/.jsx/.ts/.tsx` on both sides, and record the found file's `path`.
//!
//! Unresolvable imports are dropped silently. Cycles are fine: `imports`
//! holds keys, not nodes.

use tracing::debug;

use crate::indexer::parser::{named_children, string_value};
use crate::types::{ProjectNode, SyntaxTree};

/// Extensions removed before comparing paths in [`find_by_path`].
const SOURCE_EXTENSIONS: &[&str] = &[".tsx", ".jsx", ".ts", ".js"];

/// Resolve a relative import specifier against the file that contains it.
///
/// Returns `None` for specifiers that do not start with `.`: package imports
/// are not project-internal and the caller must skip them.
///
/// `../` segments are counted wherever they occur and all of them are removed
/// from the tail; that many trailing directories are dropped from the
/// importing file's directory. Running out of directories is not an error,
/// the directory part simply becomes empty.
///
/// ```
/// use depscope::resolution::imports::resolve_import_path;
///
/// assert_eq!(
///     resolve_import_path("../../a/b.ts", "src/x/y/z.ts").as_deref(),
///     Some("src/a/b.ts")
/// );
/// assert_eq!(
///     resolve_import_path("./sibling", "src/a/b.ts").as_deref(),
///     Some("src/a/sibling")
/// );
/// assert_eq!(resolve_import_path("react", "src/a/b.ts"), None);
/// ```
pub fn resolve_import_path(specifier: &str, importing_file: &str) -> Option<String> {
    if !is_relative_import(specifier) {
        return None;
    }

    let current_dir = parent_dir(importing_file);

    if specifier.starts_with("../") {
        let levels = specifier.matches("../").count();
        let remaining = specifier.replace("../", "");
        let segments: Vec<&str> = current_dir.split('/').collect();
        let keep = segments.len().saturating_sub(levels);
        let mut parts: Vec<&str> = segments[..keep].to_vec();
        parts.push(&remaining);
        return Some(parts.join("/"));
    }

    let normalized = specifier.strip_prefix("./").unwrap_or(specifier);
    if current_dir.is_empty() {
        Some(normalized.to_string())
    } else {
        Some(format!("{current_dir}/{normalized}"))
    }
}

/// Check if an import specifier points inside the project.
pub fn is_relative_import(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// Everything before the last `/`, or `""` for a root-level file.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Remove one trailing source extension, if present.
pub fn strip_source_extension(path: &str) -> &str {
    SOURCE_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .unwrap_or(path)
}

/// Find the first file whose path equals `target_path`, ignoring a trailing
/// source extension on both sides.
///
/// Searches `tree` itself and then its descendants depth-first, pre-order, in
/// stored child order. Directories never match.
pub fn find_by_path<'a>(tree: &'a ProjectNode, target_path: &str) -> Option<&'a ProjectNode> {
    let target = strip_source_extension(target_path);
    tree.files()
        .find(|file| strip_source_extension(&file.path) == target)
}

/// Source strings of the top-level import declarations, in order.
///
/// `import x = require("…")` and re-exports (`export … from`) are not import
/// declarations and are not returned.
pub fn import_sources<'s>(tree: &SyntaxTree, source: &'s str) -> Vec<&'s str> {
    named_children(tree.root_node())
        .into_iter()
        .filter(|n| n.kind() == "import_statement")
        .filter_map(|n| n.child_by_field_name("source"))
        .filter_map(|s| string_value(s, source))
        .collect()
}

/// Resolve every file's imports against the whole tree.
///
/// Returns a freshly built tree; `tree` is left untouched. Each file's
/// `imports` is recomputed from its syntax tree, so running this on an
/// already-resolved tree gives the same result. Files without a syntax tree
/// end up with no imports.
pub fn build_import_graph(tree: &ProjectNode) -> ProjectNode {
    rebuild(tree, tree)
}

fn rebuild(node: &ProjectNode, root: &ProjectNode) -> ProjectNode {
    let mut copy = node.clone_shallow();

    if node.is_dir() {
        copy.children = node.children.iter().map(|c| rebuild(c, root)).collect();
        return copy;
    }

    if let Some((syntax, text)) = node.parsed() {
        for specifier in import_sources(syntax, text) {
            let Some(resolved) = resolve_import_path(specifier, &node.path) else {
                continue;
            };
            match find_by_path(root, &resolved) {
                Some(found) => copy.imports.push(found.path.clone()),
                None => debug!(file = %node.path, %specifier, "unresolved import"),
            }
        }
    }
    copy
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
