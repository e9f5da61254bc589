//! Handler resolution with per-run memoisation.
//!
//! A handler argument of a route registration can be an inline function, a bare identifier,
//! or an `object.method` reference. Identifiers and members are looked up in the importing
//! file's [`ImportMap`]; the module they come from is parsed and searched for the matching
//! function. Results (including misses) are cached by target file and symbol, and parsed
//! target files are cached by path. Nothing is ever invalidated: files are assumed not to
//! change while a run is in progress.
//!
//! Resolution stops at the first definition found. An object property whose value is just
//! another identifier (`{ create: createOrder }`) is recognised as an alias but not followed.

use crate::ast::{Function, Node, Pattern};
use crate::imports::{resolve_module_path, ImportMap, DEFAULT_EXPORT};
use crate::loader::SourceLoader;
use crate::parser::{AstParser, ParsedFile};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// What a cache entry refers to within its file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A function bound to a name (`function f`, `const f = ...`, `exports.f = ...`)
    Function(String),
    /// A method reached through an imported object (`controller.create`)
    Method { object: String, method: String },
}

/// Cache key: the file that defines the handler and the symbol within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    pub file: PathBuf,
    pub symbol: Symbol,
}

/// Resolves handler arguments to function bodies.
///
/// One resolver lives for one analysis run and is not meant to be shared between threads.
#[derive(Debug, Default)]
pub struct HandlerResolver {
    files: HashMap<PathBuf, Option<Rc<ParsedFile>>>,
    handlers: HashMap<HandlerKey, Option<Rc<Function>>>,
}

impl HandlerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `argument`, a handler passed in `current`, to the function it denotes.
    ///
    /// Returns `None` when the handler cannot be found; this is never an error.
    pub fn resolve<L>(
        &mut self,
        argument: &Node,
        current: &ParsedFile,
        imports: &ImportMap,
        parser: &mut AstParser,
        loader: &L,
    ) -> Option<Rc<Function>>
    where
        L: SourceLoader + ?Sized,
    {
        match argument {
            Node::Function(function) => Some(Rc::clone(function)),
            Node::Identifier(name) => match imports.get(name) {
                Some(binding) => {
                    let target =
                        resolve_module_path(&binding.origin_module, &current.path, loader)?;
                    let key = HandlerKey {
                        file: target,
                        symbol: Symbol::Function(binding.exported_name.clone()),
                    };
                    self.lookup(key, parser, loader)
                }
                None => self.resolve_local(name, current),
            },
            Node::Member { object, property } => {
                let object = object.as_identifier()?;
                let binding = imports.get(object)?;
                let target = resolve_module_path(&binding.origin_module, &current.path, loader)?;
                let key = HandlerKey {
                    file: target,
                    symbol: Symbol::Method {
                        object: object.to_string(),
                        method: property.clone(),
                    },
                };
                self.lookup(key, parser, loader)
            }
            _ => None,
        }
    }

    /// Number of cached (file, symbol) entries, hits and misses alike.
    pub fn cached_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Drops every cached file and handler.
    pub fn clear(&mut self) {
        self.files.clear();
        self.handlers.clear();
    }

    /// A handler defined in the same file it is registered in.
    fn resolve_local(&mut self, name: &str, current: &ParsedFile) -> Option<Rc<Function>> {
        let key = HandlerKey {
            file: current.path.clone(),
            symbol: Symbol::Function(name.to_string()),
        };
        if let Some(cached) = self.handlers.get(&key) {
            return cached.clone();
        }
        let found = find_function(current, name);
        debug!(
            "Local handler {} in {}: {}",
            name,
            current.path.display(),
            if found.is_some() { "found" } else { "not found" }
        );
        self.handlers.insert(key, found.clone());
        found
    }

    fn lookup<L>(
        &mut self,
        key: HandlerKey,
        parser: &mut AstParser,
        loader: &L,
    ) -> Option<Rc<Function>>
    where
        L: SourceLoader + ?Sized,
    {
        if let Some(cached) = self.handlers.get(&key) {
            debug!("Handler cache hit: {:?}", key);
            return cached.clone();
        }

        let found = self.parsed(&key.file, parser, loader).and_then(|file| match &key.symbol {
            Symbol::Function(name) => find_function(&file, name),
            Symbol::Method { method, .. } => find_method(&file, method),
        });

        debug!(
            "Resolved {:?}: {}",
            key,
            if found.is_some() { "found" } else { "not found" }
        );
        self.handlers.insert(key, found.clone());
        found
    }

    fn parsed<L>(
        &mut self,
        path: &Path,
        parser: &mut AstParser,
        loader: &L,
    ) -> Option<Rc<ParsedFile>>
    where
        L: SourceLoader + ?Sized,
    {
        if let Some(cached) = self.files.get(path) {
            return cached.clone();
        }
        let parsed = match parser.parse_file(path, loader) {
            Ok(parsed) => Some(Rc::new(parsed)),
            Err(e) => {
                warn!("Could not parse handler file {}: {}", path.display(), e);
                None
            }
        };
        self.files.insert(path.to_path_buf(), parsed.clone());
        parsed
    }
}

/// Finds a function bound to `name`: a declaration, a variable initialised with a function,
/// or an assignment such as `exports.name = ...`. For the default export, `module.exports =`
/// and `export default` functions also match. The first match in document order wins.
pub fn find_function(file: &ParsedFile, name: &str) -> Option<Rc<Function>> {
    first_match(file, |node| function_binding(node, name))
}

/// Finds a method named `method` in a module that exports an object of handlers.
///
/// Object properties with a function value match, as do the bindings accepted by
/// [`find_function`]. A property whose value is only an identifier is an alias and does not
/// match by itself.
pub fn find_method(file: &ParsedFile, method: &str) -> Option<Rc<Function>> {
    first_match(file, |node| match node {
        Node::Object(properties) => properties
            .iter()
            .filter(|property| property.key.as_deref() == Some(method))
            .find_map(|property| match &property.value {
                Node::Function(function) => Some(Rc::clone(function)),
                Node::Identifier(alias) => {
                    debug!("{} is an alias of {}, not followed", method, alias);
                    None
                }
                _ => None,
            }),
        _ => function_binding(node, method),
    })
}

fn first_match<F>(file: &ParsedFile, mut matcher: F) -> Option<Rc<Function>>
where
    F: FnMut(&Node) -> Option<Rc<Function>>,
{
    let mut found = None;
    file.walk(&mut |node| {
        if found.is_none() {
            found = matcher(node);
        }
    });
    found
}

fn function_binding(node: &Node, name: &str) -> Option<Rc<Function>> {
    match node {
        Node::Function(function) if function.name.as_deref() == Some(name) => {
            Some(Rc::clone(function))
        }
        Node::VariableDeclarator {
            target: Pattern::Identifier(local),
            init: Some(init),
        } if local == name => init.as_function().cloned(),
        Node::Assignment { left, right } => match left.as_ref() {
            Node::Member { property, .. } if property == name => right.as_function().cloned(),
            Node::Member { object, property }
                if name == DEFAULT_EXPORT
                    && property == "exports"
                    && object.as_identifier() == Some("module") =>
            {
                right.as_function().cloned()
            }
            _ => None,
        },
        Node::ExportDefault(value) if name == DEFAULT_EXPORT => value.as_function().cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::collect_imports;
    use crate::loader::MemoryLoader;

    const ROUTES: &str = "/app/routes/orders.js";

    const ORDER_CONTROLLER: &str = r#"
        const orderService = require('../service/orderService');

        const getAllOrders = (req, res) => {
            const { status, page } = req.query;
            res.json(orderService.fetchOrders({ status, page }));
        };

        function createOrder(req, res) {
            const { customerId, items } = req.body;
            res.status(201).json({ customerId, items });
        }

        module.exports = {
            getAllOrders,
            createOrder,
            cancelOrder: async (req, res) => {
                res.json({ reason: req.body.reason });
            },
            archive: getAllOrders,
        };
    "#;

    struct Fixture {
        loader: MemoryLoader,
        parser: AstParser,
        routes: ParsedFile,
        imports: ImportMap,
    }

    fn fixture(routes_code: &str, files: &[(&str, &str)]) -> Fixture {
        let mut loader = MemoryLoader::new();
        for (path, code) in files {
            loader.insert(*path, *code);
        }
        let mut parser = AstParser::new().unwrap();
        let routes = parser.parse_source(Path::new(ROUTES), routes_code).unwrap();
        let imports = collect_imports(&routes);
        Fixture {
            loader,
            parser,
            routes,
            imports,
        }
    }

    /// Handler argument of the first call in the routes file.
    fn handler_argument(routes: &ParsedFile) -> Node {
        let mut argument = None;
        routes.walk(&mut |node| {
            if let Node::Call { arguments, .. } = node {
                if argument.is_none() && arguments.len() > 1 {
                    argument = arguments.last().cloned();
                }
            }
        });
        argument.expect("routes file registers a handler")
    }

    fn resolve(fixture: &mut Fixture, resolver: &mut HandlerResolver) -> Option<Rc<Function>> {
        let argument = handler_argument(&fixture.routes);
        resolver.resolve(
            &argument,
            &fixture.routes,
            &fixture.imports,
            &mut fixture.parser,
            &fixture.loader,
        )
    }

    #[test]
    fn test_inline_handler_is_returned_directly() {
        let mut fx = fixture("router.get('/', (req, res) => res.send('ok'));", &[]);
        let mut resolver = HandlerResolver::new();

        assert!(resolve(&mut fx, &mut resolver).is_some());
        assert_eq!(resolver.cached_handlers(), 0);
    }

    #[test]
    fn test_member_handler_resolves_variable_declaration() {
        let mut fx = fixture(
            "const orderController = require('../controller/orderController');\nrouter.get('/', orderController.getAllOrders);",
            &[("/app/controller/orderController.js", ORDER_CONTROLLER)],
        );
        let mut resolver = HandlerResolver::new();

        let handler = resolve(&mut fx, &mut resolver).expect("handler resolved");
        assert!(matches!(handler.body, Node::Other(_)));
        assert_eq!(resolver.cached_handlers(), 1);
    }

    #[test]
    fn test_member_handler_resolves_function_declaration_and_property() {
        for method in ["createOrder", "cancelOrder"] {
            let code = format!(
                "const orderController = require('../controller/orderController');\nrouter.post('/', orderController.{});",
                method
            );
            let mut fx = fixture(
                &code,
                &[("/app/controller/orderController.js", ORDER_CONTROLLER)],
            );
            let mut resolver = HandlerResolver::new();
            assert!(resolve(&mut fx, &mut resolver).is_some(), "{}", method);
        }
    }

    #[test]
    fn test_alias_property_is_not_followed() {
        let mut fx = fixture(
            "const orderController = require('../controller/orderController');\nrouter.get('/', orderController.archive);",
            &[("/app/controller/orderController.js", ORDER_CONTROLLER)],
        );
        let mut resolver = HandlerResolver::new();

        assert!(resolve(&mut fx, &mut resolver).is_none());
    }

    #[test]
    fn test_destructured_handler_resolves_exports_assignment() {
        let mut fx = fixture(
            "const { loginHandler } = require('../controller/authController');\nrouter.post('/login', loginHandler);",
            &[(
                "/app/controller/authController.js",
                "exports.loginHandler = async (req, res) => { const { email } = req.body; };",
            )],
        );
        let mut resolver = HandlerResolver::new();

        assert!(resolve(&mut fx, &mut resolver).is_some());
    }

    #[test]
    fn test_default_import_resolves_module_exports_function() {
        let mut fx = fixture(
            "const health = require('../handlers/health');\nrouter.get('/health', health);",
            &[(
                "/app/handlers/health.js",
                "module.exports = function (req, res) { res.send(req.query.verbose); };",
            )],
        );
        let mut resolver = HandlerResolver::new();

        assert!(resolve(&mut fx, &mut resolver).is_some());
    }

    #[test]
    fn test_local_handler_in_same_file() {
        let mut fx = fixture(
            "function listUsers(req, res) { res.json([]); }\nrouter.get('/', listUsers);",
            &[],
        );
        let mut resolver = HandlerResolver::new();

        assert!(resolve(&mut fx, &mut resolver).is_some());
    }

    #[test]
    fn test_unresolvable_handlers_return_none() {
        let cases = [
            // not imported, not declared
            "router.get('/:productId', handler);",
            // package import
            "const { handler } = require('some-package');\nrouter.get('/', handler);",
            // missing file
            "const { handler } = require('./missing');\nrouter.get('/', handler);",
            // symbol missing from target
            "const { nothing } = require('../controller/orderController');\nrouter.get('/', nothing);",
            // computed callee object
            "router.get('/', controllers[0].list);",
        ];

        for code in cases {
            let mut fx = fixture(
                code,
                &[("/app/controller/orderController.js", ORDER_CONTROLLER)],
            );
            let mut resolver = HandlerResolver::new();
            assert!(resolve(&mut fx, &mut resolver).is_none(), "{}", code);
        }
    }

    #[test]
    fn test_unparsable_target_is_cached_as_missing() {
        let mut fx = fixture(
            "const ctrl = require('./broken');\nrouter.get('/', ctrl.list);",
            &[("/app/routes/broken.js", "module.exports = { list( };")],
        );
        let mut resolver = HandlerResolver::new();

        assert!(resolve(&mut fx, &mut resolver).is_none());
        assert!(resolve(&mut fx, &mut resolver).is_none());
        assert_eq!(resolver.cached_handlers(), 1);
    }

    #[test]
    fn test_cached_result_matches_cold_result() {
        let mut fx = fixture(
            "const orderController = require('../controller/orderController');\nrouter.get('/', orderController.getAllOrders);",
            &[("/app/controller/orderController.js", ORDER_CONTROLLER)],
        );
        let mut resolver = HandlerResolver::new();

        let cold = resolve(&mut fx, &mut resolver).unwrap();
        let warm = resolve(&mut fx, &mut resolver).unwrap();
        assert!(Rc::ptr_eq(&cold, &warm));
        assert_eq!(resolver.cached_handlers(), 1);

        resolver.clear();
        assert_eq!(resolver.cached_handlers(), 0);
        let again = resolve(&mut fx, &mut resolver).unwrap();
        assert_eq!(*again, *cold);
    }
}
