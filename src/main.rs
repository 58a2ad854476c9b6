//! lnm binary: lattice family indexing and device naming

use std::process::ExitCode;

use latticenames::cli;
use latticenames::ui::output;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
