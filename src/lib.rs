//! Postman collection generator - Postman collections from Express.js source code.
//!
//! This library statically analyses Express.js route files and produces a Postman Collection
//! v2.1 document. Nothing is executed: routes, parameters and request bodies are recovered
//! from the syntax tree alone, following handler references across `require`/`import`
//! boundaries into controller modules.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Walks the project directory and selects files by glob patterns
//! 2. [`parser`] - Parses JavaScript/TypeScript into the owned tree of [`ast`]
//! 3. [`imports`] - Collects `require`/`import` bindings and resolves module paths
//! 4. [`detector`] - Finds mount and route registration calls
//! 5. [`extractor`] - Resolves handlers and assembles one route per registration
//! 6. [`collection`] - Groups routes into a Postman collection
//! 7. [`serializer`] - Writes the collection as JSON
//!
//! Sources are read through the [`loader::SourceLoader`] trait, so the analysis can run over
//! the file system or over in-memory sources.
//!
//! # Example Usage
//!
//! ```no_run
//! use postman_from_source::{
//!     collection::CollectionBuilder,
//!     extractor::express::ExpressExtractor,
//!     loader::FsLoader,
//!     scanner::FileScanner,
//!     serializer::serialize_json,
//! };
//! use std::path::PathBuf;
//!
//! // Scan project directory
//! let scan_result = FileScanner::new(PathBuf::from("./my-express-app")).scan().unwrap();
//!
//! // Extract routes
//! let mut extractor = ExpressExtractor::new(FsLoader).unwrap();
//! extractor.analyze_files(&scan_result.source_files);
//!
//! // Build and serialize the collection
//! let mut builder = CollectionBuilder::new().with_base_url("http://localhost:8080");
//! builder.add_routes(extractor.routes()).unwrap();
//! let json = serialize_json(&builder.build()).unwrap();
//! println!("{}", json);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod ast;
pub mod cli;
pub mod collection;
pub mod config;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod imports;
pub mod loader;
pub mod parser;
pub mod scanner;
pub mod serializer;
