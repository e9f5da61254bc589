//! Route extraction from Express-style routing code.
//!
//! This module holds the route model produced by the analysis, plus the pieces that build it:
//!
//! - [`express::ExpressExtractor`] - per-file orchestration and route assembly
//! - [`handler::HandlerResolver`] - resolves handler arguments to function bodies, with caching
//! - [`fields`] - request field usage inside a handler body
//! - [`path`] - base path joining and path parameter extraction
//!
//! # Example
//!
//! ```no_run
//! use postman_from_source::extractor::express::ExpressExtractor;
//! use postman_from_source::loader::FsLoader;
//! use std::path::Path;
//!
//! let mut extractor = ExpressExtractor::new(FsLoader).unwrap();
//! extractor.analyze_file(Path::new("/srv/app/routes/users.js"), None).unwrap();
//! println!("Found {} routes", extractor.routes().len());
//! ```

pub mod express;
pub mod fields;
pub mod handler;
pub mod path;

use std::fmt;
use std::path::PathBuf;

/// Complete information about a single registered route.
///
/// A `RouteInfo` is assembled once per registration call and not modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    /// The HTTP method for this route
    pub method: HttpMethod,
    /// Full path, base path included (e.g. "/users/:id")
    pub path: String,
    /// File containing the registration call
    pub source_file: PathBuf,
    /// `:name` segments of `path`, left to right
    pub path_params: Vec<ParamDescriptor>,
    /// Query fields read by the handlers
    pub query_params: Vec<FieldDescriptor>,
    /// Body fields read by the handlers
    pub body_params: Vec<FieldDescriptor>,
    /// Body encoding, when the handlers read a body
    pub body_kind: Option<BodyKind>,
    pub headers: Vec<Header>,
    /// Names of referenced handlers and middleware (`auth`, `controller.create`)
    pub handler_refs: Vec<String>,
}

/// HTTP methods recognised on router objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Parses a router method name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "head" => Some(HttpMethod::Head),
            "options" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Methods whose requests carry a body.
    pub fn accepts_body(&self) -> bool {
        matches!(
            self,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete
        )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path parameter such as `id` in `/users/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub key: String,
    pub value: String,
    pub description: String,
}

impl ParamDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            description: String::new(),
        }
    }
}

/// A query or body field the handler appears to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub key: String,
    pub kind: FieldKind,
    pub description: String,
}

impl FieldDescriptor {
    pub fn text(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::Text,
            description: String::new(),
        }
    }

    pub fn file(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::File,
            description: "File upload field".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    File,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::File => "file",
        }
    }
}

/// How a request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    FormData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
