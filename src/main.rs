// src/main.rs

use std::process::ExitCode;

use jobmatrix::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("jobmatrix error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("jobmatrix error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
