//! Postman collection generator - command-line tool for Express.js projects.
//!
//! Scans an Express.js project, extracts every route registration it can see statically and
//! writes a Postman Collection v2.1 file.
//!
//! # Usage
//!
//! ```bash
//! postman-from-source [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Generate a collection for the project in the current directory:
//! ```bash
//! postman-from-source
//! ```
//!
//! Name the collection and point it at a staging server:
//! ```bash
//! postman-from-source -p ./shop -n "Shop API" -b https://staging.shop.test
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! postman-from-source -p ./shop -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use postman_from_source::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists, validate afterwards
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Postman collection generator starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    match cli::run(args)? {
        Some(path) => {
            info!("Done! Import {} into Postman.", path.display());
            Ok(())
        }
        None => {
            warn!("Failed to generate collection.");
            std::process::exit(1);
        }
    }
}
