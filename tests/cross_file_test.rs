// Cross-file handler resolution through require/import bindings
use postman_from_source::extractor::express::ExpressExtractor;
use postman_from_source::extractor::{BodyKind, RouteInfo};
use postman_from_source::loader::MemoryLoader;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn analyze(loader: MemoryLoader, route_files: &[&str]) -> Vec<RouteInfo> {
    let mut extractor = ExpressExtractor::new(loader).expect("Failed to create extractor");
    let paths: Vec<PathBuf> = route_files.iter().map(PathBuf::from).collect();
    let summary = extractor.analyze_files(&paths);
    assert!(summary.skipped.is_empty(), "skipped: {:?}", summary.skipped);
    extractor.into_routes()
}

fn body_keys(route: &RouteInfo) -> Vec<&str> {
    route.body_params.iter().map(|f| f.key.as_str()).collect()
}

fn query_keys(route: &RouteInfo) -> Vec<&str> {
    route.query_params.iter().map(|f| f.key.as_str()).collect()
}

#[test]
fn test_es_module_named_and_default_imports() {
    let loader = MemoryLoader::new()
        .with_file(
            "/app/routes/items.js",
            r#"
            import express from 'express';
            import listItems, { createItem as create } from '../controller/items.js';

            const router = express.Router();
            router.get('/', listItems);
            router.post('/', create);
            export default router;
        "#,
        )
        .with_file(
            "/app/controller/items.js",
            r#"
            export default function listItems(req, res) {
                const { page, tag } = req.query;
                res.json([]);
            }

            export function createItem(req, res) {
                const { title, price } = req.body;
                res.status(201).json({ title, price });
            }
        "#,
        );

    let routes = analyze(loader, &["/app/routes/items.js"]);

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].path, "/items");
    assert_eq!(query_keys(&routes[0]), vec!["page", "tag"]);
    assert_eq!(routes[1].handler_refs, vec!["create"]);
    assert_eq!(body_keys(&routes[1]), vec!["title", "price"]);
    assert_eq!(routes[1].body_kind, Some(BodyKind::Json));
}

#[test]
fn test_commonjs_exports_assignments() {
    let loader = MemoryLoader::new()
        .with_file(
            "/app/routes/tickets.js",
            r#"
            const tickets = require('../controller/tickets');
            const { close } = require('../controller/tickets');
            router.get('/', tickets.list);
            router.post('/:ticketId/close', close);
        "#,
        )
        .with_file(
            "/app/controller/tickets.js",
            r#"
            exports.list = function (req, res) {
                res.json(findTickets(req.query.assignee));
            };

            module.exports.close = async (req, res) => {
                const { resolution } = req.body;
                res.json({ closed: true });
            };
        "#,
        );

    let routes = analyze(loader, &["/app/routes/tickets.js"]);

    assert_eq!(query_keys(&routes[0]), vec!["assignee"]);
    assert_eq!(routes[1].path, "/tickets/:ticketId/close");
    assert_eq!(body_keys(&routes[1]), vec!["resolution"]);
}

#[test]
fn test_module_exports_object_with_methods() {
    let loader = MemoryLoader::new()
        .with_file(
            "/app/routes/notes.js",
            r#"
            const notes = require('../controller/notes');
            router.post('/', notes.create);
            router.put('/:id', notes.update);
        "#,
        )
        .with_file(
            "/app/controller/notes.js",
            r#"
            const persist = (note) => note;

            module.exports = {
                create(req, res) {
                    const { text } = req.body;
                    res.json(persist({ text }));
                },
                update: (req, res) => {
                    const { text, pinned } = req.body;
                    res.json(persist({ text, pinned }));
                },
            };
        "#,
        );

    let routes = analyze(loader, &["/app/routes/notes.js"]);

    assert_eq!(body_keys(&routes[0]), vec!["text"]);
    assert_eq!(body_keys(&routes[1]), vec!["text", "pinned"]);
}

#[test]
fn test_alias_property_is_not_followed() {
    let loader = MemoryLoader::new()
        .with_file(
            "/app/routes/orders.js",
            r#"
            const orders = require('../controller/orders');
            router.post('/', orders.create);
        "#,
        )
        .with_file(
            "/app/controller/orders.js",
            r#"
            const createOrder = (req, res) => {
                const { customerId } = req.body;
            };
            module.exports = { create: createOrder };
        "#,
        );

    let routes = analyze(loader, &["/app/routes/orders.js"]);

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].handler_refs, vec!["orders.create"]);
    assert!(routes[0].body_params.is_empty());
    assert_eq!(routes[0].body_kind, None);
}

#[test]
fn test_shared_controller_resolves_identically() {
    let controller = r#"
        const search = (req, res) => {
            const { q, limit } = req.query;
            res.json([]);
        };
        module.exports = { search };
    "#;
    let loader = MemoryLoader::new()
        .with_file(
            "/app/routes/books.js",
            "const { search } = require('../controller/search');\nrouter.get('/search', search);",
        )
        .with_file(
            "/app/api/authors.js",
            "const { search } = require('../controller/search');\nrouter.get('/search', search);",
        )
        .with_file("/app/controller/search.js", controller);

    let routes = analyze(loader, &["/app/routes/books.js", "/app/api/authors.js"]);

    assert_eq!(routes[0].path, "/books/search");
    assert_eq!(routes[1].path, "/authors/search");
    assert_eq!(routes[0].query_params, routes[1].query_params);
    assert_eq!(query_keys(&routes[1]), vec!["q", "limit"]);
}

#[test]
fn test_reanalysis_is_stable() {
    let loader = MemoryLoader::new()
        .with_file(
            "/app/routes/auth.js",
            r#"
            const { login } = require('../controller/auth');
            router.post('/login', login);
        "#,
        )
        .with_file(
            "/app/controller/auth.js",
            "exports.login = (req, res) => { const { email, password } = req.body; };",
        );
    let mut extractor = ExpressExtractor::new(loader).unwrap();

    extractor.analyze_file(Path::new("/app/routes/auth.js"), None).unwrap();
    let first = extractor.routes().to_vec();
    extractor.clear();
    extractor.analyze_file(Path::new("/app/routes/auth.js"), None).unwrap();
    extractor.analyze_file(Path::new("/app/routes/auth.js"), None).unwrap();

    assert_eq!(extractor.routes().len(), 2);
    assert_eq!(extractor.routes()[0], first[0]);
    assert_eq!(extractor.routes()[1], first[0]);
}

#[test]
fn test_unparsable_controller_keeps_routes() {
    let loader = MemoryLoader::new()
        .with_file(
            "/app/routes/reports.js",
            r#"
            const reports = require('../controller/reports');
            router.get('/', reports.list);
            router.post('/', reports.create);
        "#,
        )
        .with_file(
            "/app/controller/reports.js",
            "exports.list = (req, res) => { const { from } = req.query;",
        );

    let routes = analyze(loader, &["/app/routes/reports.js"]);

    assert_eq!(routes.len(), 2);
    assert!(routes.iter().all(|r| r.query_params.is_empty()));
    assert!(routes.iter().all(|r| r.body_params.is_empty()));
}

#[test]
fn test_missing_and_package_modules() {
    let loader = MemoryLoader::new().with_file(
        "/app/routes/misc.js",
        r#"
        const { ping } = require('../controller/missing');
        const { limiter } = require('express-rate-limit');
        router.get('/ping', limiter, ping);
    "#,
    );

    let routes = analyze(loader, &["/app/routes/misc.js"]);

    assert_eq!(routes[0].path, "/misc/ping");
    assert_eq!(routes[0].handler_refs, vec!["limiter", "ping"]);
    assert!(routes[0].query_params.is_empty());
}

#[test]
fn test_handler_defined_in_route_file() {
    let loader = MemoryLoader::new().with_file(
        "/app/server.js",
        r#"
        const app = require('express')();

        function listJobs(req, res) {
            const { state } = req.query;
            res.json([]);
        }

        const enqueue = async (req, res) => {
            const { type, payload } = req.body;
            res.status(202).end();
        };

        app.get('/jobs', listJobs);
        app.post('/jobs', enqueue);
    "#,
    );

    let routes = analyze(loader, &["/app/server.js"]);

    assert_eq!(query_keys(&routes[0]), vec!["state"]);
    assert_eq!(body_keys(&routes[1]), vec!["type", "payload"]);
}
