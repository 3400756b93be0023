//! stepsort - Dependency-aware reordering for STEP CAD files

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = stepsort_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
