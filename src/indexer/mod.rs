//! Indexer: parse source files and run an analysis over a whole tree.

pub mod parser;
pub mod pipeline;

pub use parser::CodeParser;
pub use pipeline::{
    AnalysisOptions, AnalysisPipeline, AnalysisResult, NoProgress, Progress, ProgressSink,
};
