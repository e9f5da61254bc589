//! Request field usage inside handler bodies.
//!
//! The analysis is purely syntactic. It looks at how a function body uses the conventional
//! request parameter `req` and recognises four shapes:
//!
//! 1. `const { a, b } = req.query` - query fields
//! 2. `const { a, b } = req.body` - body fields, JSON body
//! 3. `req.body.a` / `req.query.a` - a single body or query field
//! 4. `req.file` / `req.files`, read directly or destructured - multipart body, plus a file
//!    field when the value is bound to a named variable
//!
//! Values that flow into other functions or outer variables are not followed.

use crate::ast::{Function, Node, Pattern};
use crate::extractor::{BodyKind, FieldDescriptor};

/// Name of the request parameter the patterns match against.
pub const REQUEST_OBJECT: &str = "req";

const QUERY: &str = "query";
const BODY: &str = "body";
const UPLOAD_PROPERTIES: &[&str] = &["file", "files"];

/// Fields accumulated for one route, across all of its handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteFields {
    pub query: Vec<FieldDescriptor>,
    pub body: Vec<FieldDescriptor>,
    pub body_kind: Option<BodyKind>,
}

impl RouteFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query field unless one with the same key exists.
    pub fn add_query(&mut self, field: FieldDescriptor) {
        push_unique(&mut self.query, field);
    }

    /// Adds a body field unless one with the same key exists.
    pub fn add_body(&mut self, field: FieldDescriptor) {
        push_unique(&mut self.body, field);
    }

    /// Marks the body as JSON unless it is already multipart.
    fn mark_json(&mut self) {
        if self.body_kind != Some(BodyKind::FormData) {
            self.body_kind = Some(BodyKind::Json);
        }
    }

    fn mark_form_data(&mut self) {
        self.body_kind = Some(BodyKind::FormData);
    }
}

fn push_unique(fields: &mut Vec<FieldDescriptor>, field: FieldDescriptor) {
    if !fields.iter().any(|existing| existing.key == field.key) {
        fields.push(field);
    }
}

/// Walks the body of `handler` and records every recognised request field into `fields`.
pub fn analyze_handler(handler: &Function, fields: &mut RouteFields) {
    handler.body.walk(&mut |node| visit(node, fields));
}

fn visit(node: &Node, fields: &mut RouteFields) {
    match node {
        Node::VariableDeclarator {
            target,
            init: Some(init),
        } => visit_declarator(target, init, fields),
        Node::Member { object, property } => visit_member(object, property, fields),
        _ => {}
    }
}

fn visit_declarator(target: &Pattern, init: &Node, fields: &mut RouteFields) {
    match target {
        Pattern::Object(properties) => {
            if init.as_identifier() == Some(REQUEST_OBJECT) {
                // const { file, body } = req
                for property in properties {
                    if UPLOAD_PROPERTIES.contains(&property.key.as_str()) {
                        fields.mark_form_data();
                        if let Some(local) = property.local_name() {
                            fields.add_body(FieldDescriptor::file(local));
                        }
                    }
                }
                return;
            }

            match init.member_of(REQUEST_OBJECT) {
                Some(QUERY) => {
                    for property in properties {
                        fields.add_query(FieldDescriptor::text(property.key.as_str()));
                    }
                }
                Some(BODY) => {
                    for property in properties {
                        fields.add_body(FieldDescriptor::text(property.key.as_str()));
                    }
                    fields.mark_json();
                }
                _ => {}
            }
        }
        Pattern::Identifier(local) => {
            // const avatar = req.file
            if let Some(property) = init.member_of(REQUEST_OBJECT) {
                if UPLOAD_PROPERTIES.contains(&property) {
                    fields.mark_form_data();
                    fields.add_body(FieldDescriptor::file(local.as_str()));
                }
            }
        }
        Pattern::Other(_) => {}
    }
}

fn visit_member(object: &Node, property: &str, fields: &mut RouteFields) {
    match object.member_of(REQUEST_OBJECT) {
        Some(QUERY) => fields.add_query(FieldDescriptor::text(property)),
        Some(BODY) => {
            fields.add_body(FieldDescriptor::text(property));
            fields.mark_json();
        }
        _ => {}
    }

    if object.as_identifier() == Some(REQUEST_OBJECT) && UPLOAD_PROPERTIES.contains(&property) {
        fields.mark_form_data();
    }
}
