//! depscope: dependency graphs for JavaScript and TypeScript projects.
//!
//! Builds a file-level import graph and a function-level call graph (with
//! `local` / `imported` / `unknown` resolution) from a source tree, plus a
//! coarse list of cross-file function dependencies.

pub mod cli;
pub mod config;
pub mod error;
pub mod indexer;
pub mod observability;
pub mod resolution;
pub mod source;
pub mod types;

pub use error::{DepScopeError, Result};
pub use indexer::{AnalysisOptions, AnalysisPipeline, AnalysisResult, Progress};
pub use types::{FunctionCallEdge, FunctionDependency, ProjectNode, Resolution};
