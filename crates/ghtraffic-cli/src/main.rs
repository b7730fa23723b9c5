use ghtraffic_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = Cli::run_from_args() {
        for line in cli::failure_details(&err) {
            eprintln!("{}", line);
        }
        tracing::error!("update failed: {:#}", err);
        eprintln!("ghtraffic error: {:#}", err);
        std::process::exit(1);
    }
}
