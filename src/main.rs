//! Barabara - Command-line preview of a convention-based controllers directory.
//!
//! Walks the controllers directory, derives every route the router would register
//! and, when an OpenAPI configuration is given, prints the aggregated document.
//!
//! # Usage
//!
//! ```bash
//! barabara [OPTIONS] <CONTROLLERS_PATH>
//! ```
//!
//! # Examples
//!
//! List the registered routes:
//! ```bash
//! barabara ./src/controllers
//! ```
//!
//! Generate the OpenAPI document as JSON:
//! ```bash
//! barabara ./src/controllers -c openapi.yaml -f json -o openapi.json
//! ```

use anyhow::Result;
use barabara::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Barabara starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    Ok(())
}
