//! Owned syntax tree for JavaScript and TypeScript sources.
//!
//! Tree-sitter trees borrow their source text and parser, which makes them awkward to keep
//! around once a file has been analysed. The [`parser`](crate::parser) module lowers every
//! tree into the tagged [`Node`] enum defined here. Only the shapes the route analysis looks
//! at get their own variant; everything else becomes [`Node::Other`] and keeps its lowered
//! children, so a generic walk still reaches every descendant.

use std::rc::Rc;

/// A lowered syntax node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Function declaration, function expression, arrow function or object method
    Function(Rc<Function>),
    /// `callee(arguments...)`
    Call { callee: Box<Node>, arguments: Vec<Node> },
    /// Non-computed member access `object.property`
    Member { object: Box<Node>, property: String },
    Identifier(String),
    /// String literal, holding the raw text between the quotes
    Str(String),
    /// `target = init` inside a `const`/`let`/`var` declaration
    VariableDeclarator { target: Pattern, init: Option<Box<Node>> },
    /// `left = right`
    Assignment { left: Box<Node>, right: Box<Node> },
    /// Object literal
    Object(Vec<Property>),
    /// ES module import declaration
    Import(ImportDecl),
    /// `export default <value>`
    ExportDefault(Box<Node>),
    /// Any other syntax, reduced to its children
    Other(Vec<Node>),
}

/// A function-like node. The body is a statement block, or the expression of a concise arrow.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub body: Node,
}

/// Binding target of a variable declarator.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Identifier(String),
    Object(Vec<PatternProperty>),
    /// Array patterns and anything else we don't destructure, reduced to their children
    Other(Vec<Node>),
}

/// One `key: value = default` entry of an object pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternProperty {
    pub key: String,
    pub value: Pattern,
    pub default: Option<Node>,
}

/// One entry of an object literal. `key` is `None` for spreads and computed keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: Option<String>,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub source: String,
    pub specifiers: Vec<ImportSpecifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import local from '...'`
    Default { local: String },
    /// `import { imported as local } from '...'`
    Named { imported: String, local: String },
}

impl Node {
    /// Direct children of this node, in source order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Function(function) => vec![&function.body],
            Node::Call { callee, arguments } => {
                let mut children = Vec::with_capacity(arguments.len() + 1);
                children.push(callee.as_ref());
                children.extend(arguments.iter());
                children
            }
            Node::Member { object, .. } => vec![object.as_ref()],
            Node::VariableDeclarator { target, init } => {
                let mut children = target.children();
                if let Some(init) = init {
                    children.push(init.as_ref());
                }
                children
            }
            Node::Assignment { left, right } => vec![left.as_ref(), right.as_ref()],
            Node::Object(properties) => properties.iter().map(|p| &p.value).collect(),
            Node::ExportDefault(value) => vec![value.as_ref()],
            Node::Other(children) => children.iter().collect(),
            Node::Identifier(_) | Node::Str(_) | Node::Import(_) => Vec::new(),
        }
    }

    /// Pre-order depth-first walk over this node and all of its descendants.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Node),
    {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Identifier name, if this node is a bare identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Node::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// String literal value, if this node is a string literal
    pub fn as_str_literal(&self) -> Option<&str> {
        match self {
            Node::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Function payload, if this node is function-like
    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Node::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Returns the property name when this node is `<name>.<property>`.
    pub fn member_of(&self, name: &str) -> Option<&str> {
        match self {
            Node::Member { object, property } if object.as_identifier() == Some(name) => {
                Some(property)
            }
            _ => None,
        }
    }
}

impl Pattern {
    /// Nodes nested in the pattern: default values and unrecognised sub-patterns.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Pattern::Identifier(_) => Vec::new(),
            Pattern::Object(properties) => {
                let mut children = Vec::new();
                for property in properties {
                    children.extend(property.value.children());
                    if let Some(default) = &property.default {
                        children.push(default);
                    }
                }
                children
            }
            Pattern::Other(children) => children.iter().collect(),
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Pattern::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

impl PatternProperty {
    /// Name bound locally by this entry, if it binds a plain identifier.
    pub fn local_name(&self) -> Option<&str> {
        self.value.as_identifier()
    }
}
