use crate::ast::Node;
use crate::extractor::HttpMethod;
use crate::parser::ParsedFile;
use log::debug;

/// Route call detector for Express-style routing code.
///
/// The `RouteCallDetector` visits every call expression of a parsed file in traversal order
/// and classifies the two shapes that matter for route extraction:
///
/// - `<obj>.use('/prefix', ...)` - a mount call that sets the base path
/// - `<obj>.<method>('/path', ...handlers)` - a route registration, where `<method>` is one
///   of the seven HTTP methods (case-insensitive)
///
/// Calls whose path argument is not a string literal are skipped without a warning; computed
/// paths are normal input, not a defect.
pub struct RouteCallDetector;

/// A call relevant to route extraction, borrowed from the parsed file.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteCall<'a> {
    /// `router.use('/orders', ordersRouter)`
    Mount { path: &'a str },
    /// `router.get('/:id', auth, controller.show)`
    Register {
        method: HttpMethod,
        path: &'a str,
        handlers: &'a [Node],
    },
}

impl RouteCallDetector {
    /// Detects mount and route registration calls in `file`.
    ///
    /// Calls are returned in pre-order traversal order, which is also the order in which
    /// mount calls take effect.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use postman_from_source::detector::RouteCallDetector;
    /// use postman_from_source::parser::AstParser;
    /// use std::path::Path;
    ///
    /// let mut parser = AstParser::new().unwrap();
    /// let parsed = parser
    ///     .parse_source(Path::new("app.js"), "app.get('/health', (req, res) => res.send('ok'));")
    ///     .unwrap();
    /// let calls = RouteCallDetector::detect(&parsed);
    /// println!("Detected {} route call(s)", calls.len());
    /// ```
    pub fn detect(file: &ParsedFile) -> Vec<RouteCall<'_>> {
        let mut calls = Vec::new();
        file.walk(&mut |node| {
            if let Some(call) = Self::classify(node) {
                calls.push(call);
            }
        });
        debug!(
            "Detected {} route calls in {}",
            calls.len(),
            file.path.display()
        );
        calls
    }

    /// Classifies a single node.
    fn classify(node: &Node) -> Option<RouteCall<'_>> {
        let Node::Call { callee, arguments } = node else {
            return None;
        };
        let Node::Member { property, .. } = callee.as_ref() else {
            return None;
        };
        let (first, rest) = arguments.split_first()?;

        if property == "use" {
            let path = first.as_str_literal()?;
            return path.starts_with('/').then_some(RouteCall::Mount { path });
        }

        let method = HttpMethod::from_name(property)?;
        let Some(path) = first.as_str_literal() else {
            debug!("Skipping .{}() call with a computed path", property);
            return None;
        };
        Some(RouteCall::Register {
            method,
            path,
            handlers: rest,
        })
    }
}
