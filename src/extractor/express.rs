use crate::ast::Node;
use crate::detector::{RouteCall, RouteCallDetector};
use crate::error::Result;
use crate::extractor::fields::{analyze_handler, RouteFields};
use crate::extractor::handler::HandlerResolver;
use crate::extractor::path::{extract_path_params, infer_base_path, normalize_path};
use crate::extractor::{BodyKind, HttpMethod, RouteInfo};
use crate::imports::{collect_imports, ImportMap};
use crate::loader::{FsLoader, SourceLoader};
use crate::parser::{AstParser, ParsedFile};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Express route extractor.
///
/// Files are analysed one at a time, in the order they are given. For each file the import
/// bindings are collected first, then every route registration call becomes one
/// [`RouteInfo`], appended to the extractor's result list. Routes are never deduplicated:
/// the same method and path registered in two files yields two routes.
///
/// Parsed handler files, import maps and resolved handlers are cached for the lifetime of the
/// extractor (or until [`ExpressExtractor::clear`]).
pub struct ExpressExtractor<L = FsLoader> {
    loader: L,
    parser: AstParser,
    resolver: HandlerResolver,
    imports: HashMap<PathBuf, ImportMap>,
    routes: Vec<RouteInfo>,
}

/// Outcome of analysing a batch of files.
#[derive(Debug, Default)]
pub struct AnalysisSummary {
    /// Files that were parsed and analysed
    pub analyzed: usize,
    /// Files skipped because they could not be read or parsed
    pub skipped: Vec<PathBuf>,
    /// Routes added by this batch
    pub routes: usize,
}

impl<L: SourceLoader> ExpressExtractor<L> {
    /// Creates an extractor reading sources through `loader`.
    pub fn new(loader: L) -> Result<Self> {
        Ok(Self {
            loader,
            parser: AstParser::new()?,
            resolver: HandlerResolver::new(),
            imports: HashMap::new(),
            routes: Vec::new(),
        })
    }

    /// Analyses every file in order. Files that fail to read or parse are logged and skipped;
    /// they never abort the batch.
    pub fn analyze_files(&mut self, paths: &[PathBuf]) -> AnalysisSummary {
        let mut summary = AnalysisSummary::default();
        for path in paths {
            match self.analyze_file(path, None) {
                Ok(count) => {
                    summary.analyzed += 1;
                    summary.routes += count;
                }
                Err(e) => {
                    warn!("Could not parse {}: {}", path.display(), e);
                    summary.skipped.push(path.clone());
                }
            }
        }
        debug!(
            "Analysed {} files, skipped {}, found {} routes",
            summary.analyzed,
            summary.skipped.len(),
            summary.routes
        );
        summary
    }

    /// Reads and analyses one file. Returns the number of routes it contributed.
    ///
    /// `base_hint` is the base path the file is mounted under. When it is absent or empty,
    /// the base is inferred from the file's location (see [`infer_base_path`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed. No routes are added then.
    pub fn analyze_file(&mut self, path: &Path, base_hint: Option<&str>) -> Result<usize> {
        let parsed = self.parser.parse_file(path, &self.loader)?;
        Ok(self.analyze_parsed(&parsed, base_hint))
    }

    /// Analyses source text for `path` without going through the loader.
    pub fn analyze_source(
        &mut self,
        path: &Path,
        source: &str,
        base_hint: Option<&str>,
    ) -> Result<usize> {
        let parsed = self.parser.parse_source(path, source)?;
        Ok(self.analyze_parsed(&parsed, base_hint))
    }

    /// Analyses an already parsed file. Returns the number of routes it contributed.
    pub fn analyze_parsed(&mut self, parsed: &ParsedFile, base_hint: Option<&str>) -> usize {
        let default_base = base_hint
            .filter(|hint| !hint.is_empty())
            .map(str::to_string)
            .or_else(|| infer_base_path(&parsed.path))
            .unwrap_or_default();
        debug!(
            "Analysing {} with base path '{}'",
            parsed.path.display(),
            default_base
        );

        let imports = collect_imports(parsed);
        let before = self.routes.len();

        // Mount calls replace the base path for every call visited after them.
        let mut base_path = default_base;
        for call in RouteCallDetector::detect(parsed) {
            match call {
                RouteCall::Mount { path } => {
                    debug!("Base path set to '{}'", path);
                    base_path = path.to_string();
                }
                RouteCall::Register {
                    method,
                    path,
                    handlers,
                } => {
                    let route = self.assemble(method, &base_path, path, handlers, parsed, &imports);
                    debug!("Adding route: {} {}", route.method, route.path);
                    self.routes.push(route);
                }
            }
        }

        self.imports.insert(parsed.path.clone(), imports);
        self.routes.len() - before
    }

    /// All routes found so far, in discovery order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<RouteInfo> {
        self.routes
    }

    /// Import bindings recorded for an analysed file.
    pub fn imports_of(&self, path: &Path) -> Option<&ImportMap> {
        self.imports.get(path)
    }

    /// Forgets all routes and cached analysis state.
    pub fn clear(&mut self) {
        self.routes.clear();
        self.imports.clear();
        self.resolver.clear();
    }

    fn assemble(
        &mut self,
        method: HttpMethod,
        base_path: &str,
        route_path: &str,
        handlers: &[Node],
        parsed: &ParsedFile,
        imports: &ImportMap,
    ) -> RouteInfo {
        let path = normalize_path(base_path, route_path);
        let mut fields = RouteFields::new();
        let mut handler_refs = Vec::new();

        for handler in handlers {
            if let Some(name) = handler_name(handler) {
                handler_refs.push(name);
            }
            match self
                .resolver
                .resolve(handler, parsed, imports, &mut self.parser, &self.loader)
            {
                Some(function) => analyze_handler(&function, &mut fields),
                None => debug!("Unresolved handler for {} {}", method, path),
            }
        }

        if method.accepts_body() && !fields.body.is_empty() && fields.body_kind.is_none() {
            fields.body_kind = Some(BodyKind::Json);
        }

        RouteInfo {
            method,
            path_params: extract_path_params(&path),
            path,
            source_file: parsed.path.clone(),
            query_params: fields.query,
            body_params: fields.body,
            body_kind: fields.body_kind,
            headers: Vec::new(),
            handler_refs,
        }
    }
}

/// Symbolic name of a handler argument: `name` or `object.method`.
fn handler_name(node: &Node) -> Option<String> {
    match node {
        Node::Identifier(name) => Some(name.clone()),
        Node::Member { object, property } => object
            .as_identifier()
            .map(|object| format!("{}.{}", object, property)),
        _ => None,
    }
}
