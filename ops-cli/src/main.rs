use clap::Parser;
use colored::Colorize;

use error_common::log_error;
use ops_cli::{run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log_error("ips-billing", &e);
        eprintln!("{} [{}] {}", "Error:".bright_red().bold(), e.code(), e);
        std::process::exit(e.exit_code());
    }
}
