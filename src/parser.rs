use crate::ast::{
    Function, ImportDecl, ImportSpecifier, Node, Pattern, PatternProperty, Property,
};
use crate::error::{Error, Result};
use crate::loader::SourceLoader;
use log::debug;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tree_sitter::Parser;

type TsNode<'tree> = tree_sitter::Node<'tree>;

/// Deepest syntax tree accepted. Lowering and walking recurse once per level, so deeper
/// files are rejected instead of risking the stack.
pub const MAX_NESTING_DEPTH: usize = 256;

/// AST parser for JavaScript and TypeScript source files.
///
/// The `AstParser` uses tree-sitter grammars to parse source text, then lowers the concrete
/// syntax tree into the owned [`Node`] representation used by the rest of the analysis.
/// One tree-sitter parser is kept per dialect so repeated parses reuse their allocations.
///
/// # Example
///
/// ```no_run
/// use postman_from_source::parser::AstParser;
/// use std::path::Path;
///
/// let mut parser = AstParser::new().unwrap();
/// let parsed = parser
///     .parse_source(Path::new("routes/users.js"), "router.get('/', list);")
///     .unwrap();
/// println!("Parsed {} top-level statements", parsed.program.len());
/// ```
pub struct AstParser {
    javascript: Parser,
    typescript: Parser,
    tsx: Parser,
}

/// A successfully parsed source file with its lowered syntax tree.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Top-level statements of the file
    pub program: Vec<Node>,
}

/// Grammar used for a file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ts") | Some("mts") | Some("cts") => Dialect::TypeScript,
            Some("tsx") => Dialect::Tsx,
            _ => Dialect::JavaScript,
        }
    }
}

impl ParsedFile {
    /// Pre-order walk over every node of the file.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Node),
    {
        for statement in &self.program {
            statement.walk(visit);
        }
    }
}

impl AstParser {
    /// Creates a parser with the JavaScript, TypeScript and TSX grammars loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if a grammar is incompatible with the linked tree-sitter runtime.
    pub fn new() -> Result<Self> {
        let mut javascript = Parser::new();
        javascript.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
        let mut typescript = Parser::new();
        typescript.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;
        let mut tsx = Parser::new();
        tsx.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())?;
        Ok(Self {
            javascript,
            typescript,
            tsx,
        })
    }

    /// Reads a file through `loader` and parses it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains syntax errors
    pub fn parse_file<L>(&mut self, path: &Path, loader: &L) -> Result<ParsedFile>
    where
        L: SourceLoader + ?Sized,
    {
        debug!("Parsing file: {}", path.display());
        let source = loader.read(path)?;
        self.parse_source(path, &source)
    }

    /// Parses source text that belongs to `path`.
    ///
    /// A tree that contains any syntax error, or nests deeper than [`MAX_NESTING_DEPTH`],
    /// is rejected as a whole.
    pub fn parse_source(&mut self, path: &Path, source: &str) -> Result<ParsedFile> {
        let dialect = Dialect::from_path(path);
        let mut tree = self.parse_tree(dialect, path, source)?;

        // Plain `.js` files sometimes carry type annotations
        if dialect == Dialect::JavaScript && tree.root_node().has_error() {
            let typed = self.parse_tree(Dialect::TypeScript, path, source)?;
            if !typed.root_node().has_error() {
                debug!("Parsed {} with the TypeScript grammar", path.display());
                tree = typed;
            }
        }
        let root = tree.root_node();

        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => {
                    let at = node.start_position();
                    format!("syntax error at {}:{}", at.row + 1, at.column + 1)
                }
                None => "syntax error".to_string(),
            };
            return Err(Error::ParseError {
                file: path.to_path_buf(),
                message,
            });
        }

        if exceeds_depth(root, MAX_NESTING_DEPTH) {
            return Err(Error::ParseError {
                file: path.to_path_buf(),
                message: "nesting too deep".to_string(),
            });
        }

        let program = named_children(root)
            .into_iter()
            .map(|child| lower(child, source))
            .collect();

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.to_path_buf(),
            program,
        })
    }

    fn parse_tree(
        &mut self,
        dialect: Dialect,
        path: &Path,
        source: &str,
    ) -> Result<tree_sitter::Tree> {
        let parser = match dialect {
            Dialect::JavaScript => &mut self.javascript,
            Dialect::TypeScript => &mut self.typescript,
            Dialect::Tsx => &mut self.tsx,
        };
        parser.parse(source, None).ok_or_else(|| Error::ParseError {
            file: path.to_path_buf(),
            message: "parser produced no syntax tree".to_string(),
        })
    }
}

/// Descends along erroneous children to the first error or missing node.
fn first_error(root: TsNode<'_>) -> Option<TsNode<'_>> {
    let mut node = root;
    'descend: loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.has_error() {
                node = child;
                continue 'descend;
            }
        }
        return None;
    }
}

/// True if any node lies more than `limit` levels below `root`.
fn exceeds_depth(root: TsNode<'_>, limit: usize) -> bool {
    let mut cursor = root.walk();
    let mut depth = 0;
    loop {
        if depth > limit {
            return true;
        }
        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return false;
            }
            depth -= 1;
        }
    }
}

/// Named children with comments dropped.
fn named_children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

fn node_text(node: TsNode<'_>, source: &str) -> String {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .to_string()
}

fn string_value(node: TsNode<'_>, source: &str) -> String {
    let raw = node_text(node, source);
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '\'' || open == '"') => {
            chars.as_str().to_string()
        }
        _ => raw,
    }
}

/// Name carried by a property key: identifiers, quoted strings and numbers.
fn property_key(node: TsNode<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "property_identifier" | "private_property_identifier" | "identifier" | "number" => {
            Some(node_text(node, source))
        }
        "string" => Some(string_value(node, source)),
        _ => None,
    }
}

fn lower_field(node: TsNode<'_>, field: &str, source: &str) -> Node {
    node.child_by_field_name(field)
        .map(|child| lower(child, source))
        .unwrap_or(Node::Other(Vec::new()))
}

fn lower_children(node: TsNode<'_>, source: &str) -> Node {
    Node::Other(
        named_children(node)
            .into_iter()
            .map(|child| lower(child, source))
            .collect(),
    )
}

fn lower(node: TsNode<'_>, source: &str) -> Node {
    match node.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "function_expression"
        | "function"
        | "generator_function"
        | "arrow_function"
        | "method_definition" => {
            if node.child_by_field_name("body").is_none() {
                return lower_children(node, source);
            }
            Node::Function(Rc::new(Function {
                name: node
                    .child_by_field_name("name")
                    .and_then(|name| property_key(name, source)),
                body: lower_field(node, "body", source),
            }))
        }
        "call_expression" => {
            let Some(callee) = node.child_by_field_name("function") else {
                return lower_children(node, source);
            };
            let arguments = match node.child_by_field_name("arguments") {
                Some(args) if args.kind() == "arguments" => named_children(args)
                    .into_iter()
                    .map(|arg| lower(arg, source))
                    .collect(),
                // Tagged template literal
                Some(args) => vec![lower(args, source)],
                None => Vec::new(),
            };
            Node::Call {
                callee: Box::new(lower(callee, source)),
                arguments,
            }
        }
        "member_expression" => {
            match (
                node.child_by_field_name("object"),
                node.child_by_field_name("property"),
            ) {
                (Some(object), Some(property))
                    if matches!(
                        property.kind(),
                        "property_identifier" | "private_property_identifier"
                    ) =>
                {
                    Node::Member {
                        object: Box::new(lower(object, source)),
                        property: node_text(property, source),
                    }
                }
                _ => lower_children(node, source),
            }
        }
        "identifier" => Node::Identifier(node_text(node, source)),
        "string" => Node::Str(string_value(node, source)),
        "parenthesized_expression" => {
            let mut children = named_children(node);
            if children.len() == 1 {
                lower(children.remove(0), source)
            } else {
                lower_children(node, source)
            }
        }
        "variable_declarator" => match node.child_by_field_name("name") {
            Some(name) => Node::VariableDeclarator {
                target: lower_pattern(name, source),
                init: node
                    .child_by_field_name("value")
                    .map(|value| Box::new(lower(value, source))),
            },
            None => lower_children(node, source),
        },
        "assignment_expression" => Node::Assignment {
            left: Box::new(lower_field(node, "left", source)),
            right: Box::new(lower_field(node, "right", source)),
        },
        "object" => Node::Object(lower_object(node, source)),
        "import_statement" => match lower_import(node, source) {
            Some(import) => Node::Import(import),
            None => lower_children(node, source),
        },
        "export_statement" => {
            let mut cursor = node.walk();
            let is_default = node
                .children(&mut cursor)
                .any(|child| child.kind() == "default");
            let value = node
                .child_by_field_name("declaration")
                .or_else(|| node.child_by_field_name("value"));
            match value {
                Some(value) if is_default => Node::ExportDefault(Box::new(lower(value, source))),
                _ => lower_children(node, source),
            }
        }
        _ => lower_children(node, source),
    }
}

fn lower_object(node: TsNode<'_>, source: &str) -> Vec<Property> {
    let mut properties = Vec::new();
    for child in named_children(node) {
        let property = match child.kind() {
            "pair" => Property {
                key: child
                    .child_by_field_name("key")
                    .and_then(|key| property_key(key, source)),
                value: lower_field(child, "value", source),
            },
            "shorthand_property_identifier" => {
                let name = node_text(child, source);
                Property {
                    key: Some(name.clone()),
                    value: Node::Identifier(name),
                }
            }
            "method_definition" => {
                let value = lower(child, source);
                let key = value.as_function().and_then(|f| f.name.clone());
                Property { key, value }
            }
            _ => Property {
                key: None,
                value: lower(child, source),
            },
        };
        properties.push(property);
    }
    properties
}

fn lower_pattern(node: TsNode<'_>, source: &str) -> Pattern {
    match node.kind() {
        "identifier" => Pattern::Identifier(node_text(node, source)),
        "object_pattern" => {
            let mut properties = Vec::new();
            for child in named_children(node) {
                match child.kind() {
                    "shorthand_property_identifier_pattern" => {
                        let name = node_text(child, source);
                        properties.push(PatternProperty {
                            key: name.clone(),
                            value: Pattern::Identifier(name),
                            default: None,
                        });
                    }
                    "pair_pattern" => {
                        let Some(key) = child
                            .child_by_field_name("key")
                            .and_then(|key| property_key(key, source))
                        else {
                            continue;
                        };
                        let Some(value) = child.child_by_field_name("value") else {
                            continue;
                        };
                        let (value, default) = split_default(value, source);
                        properties.push(PatternProperty {
                            key,
                            value,
                            default,
                        });
                    }
                    "object_assignment_pattern" => {
                        let Some(left) = child.child_by_field_name("left") else {
                            continue;
                        };
                        let key = node_text(left, source);
                        properties.push(PatternProperty {
                            value: match left.kind() {
                                "shorthand_property_identifier_pattern" => {
                                    Pattern::Identifier(key.clone())
                                }
                                _ => lower_pattern(left, source),
                            },
                            key,
                            default: child
                                .child_by_field_name("right")
                                .map(|right| lower(right, source)),
                        });
                    }
                    // Rest elements and computed keys name no field
                    _ => {}
                }
            }
            Pattern::Object(properties)
        }
        _ => Pattern::Other(
            named_children(node)
                .into_iter()
                .map(|child| lower(child, source))
                .collect(),
        ),
    }
}

/// Splits `pattern = default` into its parts.
fn split_default(node: TsNode<'_>, source: &str) -> (Pattern, Option<Node>) {
    if node.kind() == "assignment_pattern" {
        if let Some(left) = node.child_by_field_name("left") {
            let default = node
                .child_by_field_name("right")
                .map(|right| lower(right, source));
            return (lower_pattern(left, source), default);
        }
    }
    (lower_pattern(node, source), None)
}

fn lower_import(node: TsNode<'_>, source: &str) -> Option<ImportDecl> {
    let source_node = node.child_by_field_name("source")?;
    let mut specifiers = Vec::new();

    for clause in named_children(node)
        .into_iter()
        .filter(|child| child.kind() == "import_clause")
    {
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => specifiers.push(ImportSpecifier::Default {
                    local: node_text(part, source),
                }),
                "named_imports" => {
                    for spec in named_children(part)
                        .into_iter()
                        .filter(|spec| spec.kind() == "import_specifier")
                    {
                        let Some(imported) = spec
                            .child_by_field_name("name")
                            .and_then(|name| property_key(name, source))
                        else {
                            continue;
                        };
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|alias| node_text(alias, source))
                            .unwrap_or_else(|| imported.clone());
                        specifiers.push(ImportSpecifier::Named { imported, local });
                    }
                }
                // Namespace imports bind no single function
                _ => {}
            }
        }
    }

    Some(ImportDecl {
        source: string_value(source_node, source),
        specifiers,
    })
}
