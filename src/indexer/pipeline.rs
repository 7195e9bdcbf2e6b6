//! Analysis pipeline: walk a source tree, parse each source file, collect call
//! edges, then build the import graph and cross-file dependencies.
//!
//! The run is single-threaded. Directory recursion finishes before import
//! resolution starts, because an import may point anywhere in the tree.
//!
//! Per recognized file:
//! 1. Fetch its text from the provider
//! 2. Parse it with the grammar chosen by extension
//! 3. Run call analysis on the parsed tree and tag each edge with the file
//!
//! A file with a syntax error keeps its text, gets no syntax tree, and is
//! recorded in [`AnalysisResult::file_errors`]; the run continues. Provider
//! failures abort the run.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::{DepScopeError, Result};
use crate::indexer::parser::CodeParser;
use crate::observability::RunMetrics;
use crate::resolution::calls::analyze_tree;
use crate::resolution::imports::build_import_graph;
use crate::resolution::linker::link_dependencies;
use crate::source::{SourceTreeProvider, TreeEntry};
use crate::types::{FileError, FunctionCallEdge, FunctionDependency, Language, ProjectNode};

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress notifications, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    /// A file entry is about to be processed (its name, not its path).
    Parsing(&'a str),
    /// The run finished successfully. Sent exactly once, last.
    Complete,
}

/// Receiver of [`Progress`] events. Implemented for every `FnMut(Progress)`.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress<'_>);
}

impl<F> ProgressSink for F
where
    F: FnMut(Progress<'_>),
{
    fn report(&mut self, progress: Progress<'_>) {
        self(progress)
    }
}

/// A sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: Progress<'_>) {}
}

// ---------------------------------------------------------------------------
// Options and result
// ---------------------------------------------------------------------------

/// Options for a single analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Provider-relative directory to start from; `""` is the provider root.
    pub root_path: String,
}

impl AnalysisOptions {
    pub fn at(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Directory node for `root_path`, with resolved `imports` on its files.
    pub tree: ProjectNode,
    /// Call edges of every parsed file, concatenated in traversal order.
    pub call_edges: Vec<FunctionCallEdge>,
    pub dependencies: Vec<FunctionDependency>,
    pub file_errors: Vec<FileError>,
    pub metrics: RunMetrics,
}

/// State owned by one run; handed back inside [`AnalysisResult`].
#[derive(Debug, Default)]
struct RunAccumulator {
    call_edges: Vec<FunctionCallEdge>,
    file_errors: Vec<FileError>,
    metrics: RunMetrics,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Runs analyses over one [`SourceTreeProvider`].
pub struct AnalysisPipeline<'p, P: SourceTreeProvider + ?Sized> {
    provider: &'p P,
    config: AnalyzerConfig,
    parser: CodeParser,
}

impl<'p, P: SourceTreeProvider + ?Sized> AnalysisPipeline<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            config: AnalyzerConfig::default(),
            parser: CodeParser::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Analyze the tree under `options.root_path`.
    pub fn analyze<S>(&self, options: &AnalysisOptions, progress: &mut S) -> Result<AnalysisResult>
    where
        S: ProgressSink + ?Sized,
    {
        let start = Instant::now();
        let root_path = options.root_path.trim_matches('/');
        info!(root = %root_path, "starting analysis");

        let mut acc = RunAccumulator::default();
        let children = self.scan_dir(root_path, &mut acc, progress)?;
        let root_name = root_path.rsplit('/').next().unwrap_or(root_path);
        let scanned = ProjectNode::dir(root_name, root_path, children);

        let tree = build_import_graph(&scanned);
        let dependencies = link_dependencies(&tree);

        let RunAccumulator {
            call_edges,
            file_errors,
            mut metrics,
        } = acc;
        metrics.import_edges = tree.import_count();
        metrics.call_edges = call_edges.len();
        metrics.dependencies = dependencies.len();
        metrics.set_duration(start.elapsed());

        progress.report(Progress::Complete);
        info!(
            files = metrics.files_visited,
            parsed = metrics.files_parsed,
            failures = metrics.parse_failures,
            imports = metrics.import_edges,
            calls = metrics.call_edges,
            dependencies = metrics.dependencies,
            duration_ms = metrics.duration_ms,
            "analysis complete"
        );

        Ok(AnalysisResult {
            tree,
            call_edges,
            dependencies,
            file_errors,
            metrics,
        })
    }

    fn scan_dir<S>(
        &self,
        path: &str,
        acc: &mut RunAccumulator,
        progress: &mut S,
    ) -> Result<Vec<ProjectNode>>
    where
        S: ProgressSink + ?Sized,
    {
        let entries = self.provider.list(path)?;
        let mut nodes = Vec::with_capacity(entries.len());

        for entry in entries {
            if self.config.is_excluded(entry.name()) {
                debug!(path = entry.path(), "excluded");
                acc.metrics.excluded_entries += 1;
                continue;
            }
            match entry {
                TreeEntry::File {
                    name,
                    path,
                    content_ref,
                } => {
                    progress.report(Progress::Parsing(&name));
                    acc.metrics.files_visited += 1;
                    nodes.push(self.load_file(name, path, &content_ref, acc)?);
                }
                TreeEntry::Dir { name, path } => {
                    acc.metrics.dirs_visited += 1;
                    let children = self.scan_dir(&path, acc, progress)?;
                    nodes.push(ProjectNode::dir(name, path, children));
                }
            }
        }
        Ok(nodes)
    }

    fn load_file(
        &self,
        name: String,
        path: String,
        content_ref: &str,
        acc: &mut RunAccumulator,
    ) -> Result<ProjectNode> {
        let node = ProjectNode::file(name, path);
        let Some(language) = Language::from_path(&node.name) else {
            return Ok(node);
        };

        let text = self.provider.fetch_content(content_ref)?;
        match self.parser.parse(&text, language) {
            Ok(syntax) => {
                let edges = analyze_tree(&syntax, &text);
                debug!(path = %node.path, calls = edges.len(), "parsed");
                acc.metrics.files_parsed += 1;
                acc.call_edges.extend(edges.into_iter().map(|mut edge| {
                    edge.file_path = Some(node.path.clone());
                    edge
                }));
                Ok(node.with_source(language, text, Some(syntax)))
            }
            Err(DepScopeError::Syntax {
                line,
                column,
                message,
            }) => {
                warn!(path = %node.path, line, column, %message, "skipping file with syntax error");
                acc.metrics.parse_failures += 1;
                acc.file_errors.push(FileError {
                    path: node.path.clone(),
                    line,
                    column,
                    message,
                });
                Ok(node.with_source(language, text, None))
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
