use std::process::ExitCode;

use clap::Parser;
use depscope::cli::{run, Cli};
use depscope::observability::init_logging;

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "depscope failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
