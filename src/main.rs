//! Main entry point for sheetwatch CLI

use clap::Parser;
use sheetwatch::cli::Cli;
use sheetwatch::commands::execute_command;

fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set up verbose logging if requested
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Execute the command
    if let Err(e) = execute_command(cli.command, cli.workspace.as_deref()) {
        // An overlapping run is an expected outcome for scheduled
        // invocations, not a failure
        if e.is_contention() {
            eprintln!("⏭️  {}", e);
            std::process::exit(0);
        }

        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
