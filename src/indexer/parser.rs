//! Native tree-sitter parser wrapper: the syntax tree provider.
//!
//! Grammars are statically linked, so there is no runtime setup. Tree-sitter
//! always produces a tree, recovering from bad input with `ERROR` and
//! `MISSING` nodes; [`CodeParser::parse`] turns the first such node into a
//! [`DepScopeError::Syntax`] so a broken file is reported instead of being
//! half-analyzed.

use tree_sitter::Node;

use crate::error::{DepScopeError, Result};
use crate::types::{Language, SyntaxTree};

/// Thin wrapper around native tree-sitter parsing.
///
/// Zero-sized and `Send + Sync`: a fresh `tree_sitter::Parser` is created per
/// call because the underlying C object is `!Send`.
pub struct CodeParser;

impl CodeParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse `content` with the grammar for `language`.
    ///
    /// Fails with [`DepScopeError::Syntax`] (1-based line, 0-based column) if
    /// the text does not parse cleanly.
    pub fn parse(&self, content: &str, language: Language) -> Result<SyntaxTree> {
        let ts_lang = Self::get_ts_language(language);

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&ts_lang)
            .map_err(|e| DepScopeError::Parse(format!("Language version mismatch: {e}")))?;

        let tree = parser.parse(content, None).ok_or_else(|| {
            DepScopeError::Parse("tree-sitter returned None (timeout or cancellation)".into())
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(syntax_error(root, content));
        }
        Ok(SyntaxTree::new(tree, language))
    }

    /// Return the native `tree_sitter::Language` for a [`Language`] variant.
    ///
    /// TypeScript files get the plain TypeScript grammar (so `<T>expr` casts
    /// parse), `.tsx` gets the TSX grammar and JavaScript with or without JSX
    /// uses the JavaScript grammar.
    #[must_use]
    pub fn get_ts_language(language: Language) -> tree_sitter::Language {
        match language {
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::JavaScript | Language::Jsx => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    /// Detect the [`Language`] for a file path based on its extension.
    #[must_use]
    pub fn detect_language(file_path: &str) -> Option<Language> {
        Language::from_path(file_path)
    }

}

impl Default for CodeParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Describe the first `ERROR` or `MISSING` node in document order.
fn syntax_error(root: Node<'_>, source: &str) -> DepScopeError {
    let bad = descendants(root).find(|n| n.is_error() || n.is_missing());
    let Some(node) = bad else {
        return DepScopeError::Syntax {
            line: 1,
            column: 0,
            message: "unparseable input".into(),
        };
    };

    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = node_text(node, source)
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(40)
            .collect();
        if snippet.is_empty() {
            "unexpected end of input".to_string()
        } else {
            format!("unexpected `{snippet}`")
        }
    };

    DepScopeError::Syntax {
        line: pos.row as u32 + 1,
        column: pos.column as u32,
        message,
    }
}

// ---------------------------------------------------------------------------
// Traversal helpers
// ---------------------------------------------------------------------------

/// `node` and all of its descendants, depth-first pre-order.
///
/// Walks a single [`tree_sitter::TreeCursor`] rooted at `node`, so the walk
/// never leaves that subtree.
pub fn descendants<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    let mut cursor = node.walk();
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let current = cursor.node();
        if !cursor.goto_first_child() {
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    done = true;
                    break;
                }
            }
        }
        Some(current)
    })
}

/// Named children of `node` in source order.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// The source text a node spans. Empty if the range is not valid UTF-8 slicing.
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// The value of a string literal node, without its quotes.
pub fn string_value<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    if node.kind() != "string" {
        return None;
    }
    let raw = node_text(node, source);
    if raw.len() < 2 {
        return None;
    }
    raw.get(1..raw.len() - 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
