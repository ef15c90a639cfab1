//! pdfmix - Convert documents, spreadsheets and images and merge them into one PDF.

use clap::Parser;
use env_logger::Env;
use std::process;

use pdfmix::app;
use pdfmix::cli::Cli;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    // Run the application and handle errors
    if let Err(err) = app::run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}
