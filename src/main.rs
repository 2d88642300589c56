//! Binary entrypoint for the `docshift` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    docshift::init_tracing();
    // Recording is handled in commands::dispatch via DOCSHIFT_RECORD=<path>.
    match docshift::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
