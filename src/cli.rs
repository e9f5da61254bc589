use crate::collection::CollectionBuilder;
use crate::config::{load_config, Config, GeneratorOptions, DEFAULT_CONFIG_FILE};
use crate::extractor::express::ExpressExtractor;
use crate::loader::FsLoader;
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, write_to_file};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Postman collection generator - builds a Postman collection from Express.js route files
#[derive(Parser, Debug, Default)]
#[command(name = "postman-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Express.js project (default: current directory)
    #[arg(short = 'p', long = "project", value_name = "PATH")]
    pub project_path: Option<PathBuf>,

    /// Output path for the collection file, relative to the project
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Collection name (default: "Express API Collection")
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Base URL for the API (default: http://localhost:3000)
    #[arg(short = 'b', long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Collection description
    #[arg(short = 'd', long = "description", value_name = "DESC")]
    pub description: Option<String>,

    /// Path to a config file (default: ./.postmanrc.json when present)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File patterns to include (default: **/*.js)
    #[arg(short = 'i', long = "include", value_name = "PATTERNS", num_args = 1..)]
    pub include: Option<Vec<String>>,

    /// File patterns to exclude (default: node_modules/** test/** tests/**)
    #[arg(short = 'e', long = "exclude", value_name = "PATTERNS", num_args = 1..)]
    pub exclude: Option<Vec<String>>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Flags that take part in option merging, in config file shape.
    fn overrides(&self) -> Config {
        Config {
            project_path: self.project_path.clone(),
            output_path: self.output_path.clone(),
            collection_name: self.name.clone(),
            base_url: self.base_url.clone(),
            description: self.description.clone(),
            include_patterns: self.include.clone(),
            exclude_patterns: self.exclude.clone(),
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if let Some(ref project) = args.project_path {
        if !project.is_dir() {
            anyhow::bail!(
                "Project path is not a directory: {}",
                project.display()
            );
        }
    }

    if let Some(ref config) = args.config {
        info!("Config file: {}", config.display());
    }

    Ok(args)
}

/// Loads the config file named by `--config`, or `.postmanrc.json` in `cwd` when present.
///
/// A config that fails to load is reported and ignored.
fn load_config_for(args: &CliArgs, cwd: &Path) -> Config {
    let path = match &args.config {
        Some(path) => cwd.join(path),
        None => {
            let default = cwd.join(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                debug!("No {} in {}", DEFAULT_CONFIG_FILE, cwd.display());
                return Config::default();
            }
            default
        }
    };

    match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Could not load config from {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Run the main workflow.
///
/// Returns the path of the written collection, or `None` when no routes were found. Nothing
/// is written in that case.
pub fn run(args: CliArgs) -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    run_in(args, &cwd)
}

/// Runs the workflow with `cwd` as the working directory for config lookup and defaults.
pub fn run_in(args: CliArgs, cwd: &Path) -> Result<Option<PathBuf>> {
    // Step 1: Merge configuration
    let config = load_config_for(&args, cwd);
    let options = GeneratorOptions::resolve(args.overrides(), config, cwd);
    let project_path = cwd.join(&options.project_path);

    info!("Starting Postman collection generation...");
    info!("Project path: {}", project_path.display());
    if !project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            project_path.display()
        );
    }

    // Step 2: Scan for source files
    info!("Scanning for route files...");
    let scan_result = FileScanner::new(project_path.clone())
        .with_patterns(
            options.include_patterns.clone(),
            options.exclude_patterns.clone(),
        )
        .scan()
        .context("Failed to scan project directory")?;

    info!("Found {} files to analyze", scan_result.source_files.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }

    // Step 3: Extract routes
    info!("Parsing routes...");
    let mut extractor =
        ExpressExtractor::new(FsLoader).context("Failed to initialise the JavaScript parser")?;
    let summary = extractor.analyze_files(&scan_result.source_files);
    let routes = extractor.into_routes();
    info!("Extracted {} routes", routes.len());

    if routes.is_empty() {
        warn!("No routes found. Make sure your Express routes are in the scanned files.");
        return Ok(None);
    }

    // Step 4: Build collection
    info!("Converting to Postman collection...");
    let mut builder = CollectionBuilder::new()
        .with_info(options.collection_name.clone(), options.description.clone())
        .with_base_url(options.base_url.clone());
    builder
        .add_routes(&routes)
        .context("Failed to build the collection")?;
    let collection = builder.build();

    // Step 5: Serialize and write
    let content = serialize_json(&collection)?;
    let output_path = GeneratorOptions {
        project_path: project_path.clone(),
        ..options
    }
    .output_file();
    write_to_file(&content, &output_path)?;
    info!("Collection saved to: {}", output_path.display());

    // Step 6: Display summary
    info!("Summary:");
    info!("  - Files scanned: {}", scan_result.source_files.len());
    info!("  - Files analyzed: {}", summary.analyzed);
    info!("  - Files skipped: {}", summary.skipped.len());
    info!("  - Routes found: {}", routes.len());
    info!("  - Folders: {}", collection.item.len());

    Ok(Some(output_path))
}
