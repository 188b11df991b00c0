// intervention-ranker - main.rs
// Binary entry point: logging setup, argument parsing, dispatch

use clap::Parser;
use intervention_ranker::cli::{dispatch, Cli};
use std::process::exit;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        eprintln!("error: {e:#}");
        exit(1);
    }
}
