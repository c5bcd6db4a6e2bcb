use std::process::ExitCode;

use clap::Parser;

use doc_batch_convert::cli::Cli;
use doc_batch_convert::orchestrator::{exit_code, run_command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = run_command(cli).await;
    ExitCode::from(exit_code(&outcome))
}
