//! Notepack CLI - normalize exported note archives

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = notepack::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
