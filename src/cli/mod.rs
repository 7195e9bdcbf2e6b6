//! Command-line front end.
//!
//! `depscope analyze <root>` runs a full analysis and prints a JSON report;
//! `depscope calls <file>` prints one file's call edges; `depscope resolve`
//! shows how a relative import specifier resolves.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use tracing::info;

use crate::config::load_config;
use crate::error::{DepScopeError, Result};
use crate::indexer::pipeline::{AnalysisOptions, AnalysisPipeline, AnalysisResult, Progress};
use crate::resolution::calls::analyze_with;
use crate::resolution::imports::resolve_import_path;
use crate::source::{LocalTreeProvider, RepoLocator};
use crate::types::Language;

#[derive(Parser, Debug)]
#[command(name = "depscope", version)]
#[command(about = "Import and call graphs for JavaScript/TypeScript projects", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to <root>/.depscope.yaml, then the user config)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Hide the progress spinner
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a project directory
    Analyze {
        /// Local directory, file:// URL or GitHub tree URL
        root: String,

        /// Report section to print
        #[arg(long, value_enum, default_value_t = Section::All)]
        only: Section,

        /// Skip entries matched by .gitignore files
        #[arg(long)]
        gitignore: bool,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the call edges of a single source file
    Calls {
        file: PathBuf,

        /// Dialect override (ts, tsx, js, jsx); defaults to the extension
        #[arg(long)]
        language: Option<String>,
    },

    /// Resolve a relative import specifier against an importing file
    Resolve {
        specifier: String,

        /// Project-relative path of the importing file
        #[arg(long)]
        from: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Section {
    All,
    Tree,
    Calls,
    Dependencies,
    Errors,
    Metrics,
}

/// Execute a parsed command line, writing its output to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::Analyze {
            root,
            only,
            gitignore,
            output,
        } => {
            let report = analyze_root(root, cli.config.as_deref(), *gitignore, cli.quiet)?;
            let value = select_section(report, *only);
            match output {
                Some(path) => {
                    let mut file = std::fs::File::create(path)?;
                    write_json(&mut file, &value, cli.pretty)?;
                    info!(path = %path.display(), "report written");
                    Ok(())
                }
                None => write_json(out, &value, cli.pretty),
            }
        }
        Command::Calls { file, language } => {
            let language = pick_language(file, language.as_deref())?;
            let source = std::fs::read_to_string(file)?;
            let edges = analyze_with(&source, language)?;
            write_json(out, &serde_json::to_value(edges)?, cli.pretty)
        }
        Command::Resolve { specifier, from } => {
            let resolved = resolve_import_path(specifier, from);
            let value = json!({
                "specifier": specifier,
                "from": from,
                "resolved": resolved,
            });
            write_json(out, &value, cli.pretty)
        }
    }
}

fn analyze_root(
    root: &str,
    config_path: Option<&Path>,
    gitignore: bool,
    quiet: bool,
) -> Result<Value> {
    let path = match RepoLocator::parse(root)? {
        RepoLocator::Local(path) => path,
        remote @ RepoLocator::GitHub { .. } => {
            return Err(DepScopeError::fetch(
                remote.to_string(),
                "remote trees are not supported; clone the repository and pass its local path",
            ));
        }
    };

    let mut config = load_config(config_path, Some(path.as_path()))?;
    config.respect_gitignore |= gitignore;
    let provider = LocalTreeProvider::new(&path)?.respect_gitignore(config.respect_gitignore);

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        new_spinner()?
    };
    let mut on_progress = |progress: Progress<'_>| match progress {
        Progress::Parsing(name) => spinner.set_message(format!("Parsing {name}")),
        Progress::Complete => spinner.finish_with_message("Parsing Complete"),
    };

    let result = AnalysisPipeline::new(&provider)
        .with_config(config)
        .analyze(&AnalysisOptions::default(), &mut on_progress);
    if result.is_err() {
        spinner.abandon();
    }
    report(&path, result?)
}

fn new_spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg} [{elapsed_precise}]")
        .map_err(|e| DepScopeError::Other(format!("invalid spinner template: {e}")))?;
    spinner.set_style(style);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(spinner)
}

fn report(root: &Path, result: AnalysisResult) -> Result<Value> {
    Ok(json!({
        "root": root.display().to_string(),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "tree": serde_json::to_value(&result.tree)?,
        "call_edges": serde_json::to_value(&result.call_edges)?,
        "dependencies": serde_json::to_value(&result.dependencies)?,
        "file_errors": serde_json::to_value(&result.file_errors)?,
        "metrics": serde_json::to_value(&result.metrics)?,
    }))
}

fn select_section(mut report: Value, section: Section) -> Value {
    let key = match section {
        Section::All => return report,
        Section::Tree => "tree",
        Section::Calls => "call_edges",
        Section::Dependencies => "dependencies",
        Section::Errors => "file_errors",
        Section::Metrics => "metrics",
    };
    report.get_mut(key).map(Value::take).unwrap_or(Value::Null)
}

fn pick_language(file: &Path, flag: Option<&str>) -> Result<Language> {
    if let Some(name) = flag {
        return Language::from_str_loose(name)
            .ok_or_else(|| DepScopeError::Other(format!("unknown language: {name}")));
    }
    Ok(Language::from_path(&file.to_string_lossy()).unwrap_or(Language::Tsx))
}

fn write_json(out: &mut dyn Write, value: &Value, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
