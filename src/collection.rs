//! Postman Collection v2.1 document model and builder.

use crate::extractor::{BodyKind, FieldDescriptor, Header, HttpMethod, RouteInfo};
use crate::error::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// Schema URL identifying the collection format version.
pub const COLLECTION_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Name of the collection variable holding the server address.
pub const BASE_URL_VARIABLE: &str = "baseUrl";

pub const DEFAULT_COLLECTION_NAME: &str = "Express API Collection";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_DESCRIPTION: &str = "Generated from Express.js routes";

/// Folder used for routes whose path has no segment, such as `/`.
const ROOT_FOLDER: &str = "root";

/// Postman collection builder.
///
/// Routes are added one at a time and grouped into folders by the first segment of their
/// path. Folders and the requests inside them keep the order in which routes were added.
pub struct CollectionBuilder {
    info: Info,
    base_url: String,
    /// First path segment of each folder, parallel to `folders`
    segments: Vec<String>,
    folders: Vec<Folder>,
}

/// Collection metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub name: String,
    pub description: String,
    pub schema: String,
}

/// Complete Postman collection document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub info: Info,
    /// Top-level folders
    pub item: Vec<Folder>,
    /// Collection variables (`baseUrl`)
    pub variable: Vec<Variable>,
}

/// A folder of requests sharing the same first path segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub item: Vec<Item>,
}

/// A named request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub header: Vec<KeyValue>,
    pub url: Url,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Request URL, split the way Postman stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Url {
    /// `{{baseUrl}}` followed by the route path
    pub raw: String,
    pub host: Vec<String>,
    /// Path segments, `:param` segments kept as is
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<QueryParam>>,
    /// Path variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<Vec<PathVariable>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
    pub description: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathVariable {
    pub key: String,
    pub value: String,
    pub description: String,
}

/// Request body, either multipart fields or a raw JSON template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Body {
    Formdata { formdata: Vec<FormField> },
    Raw { raw: String, options: BodyOptions },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub key: String,
    pub value: String,
    /// `text` or `file`
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyOptions {
    pub raw: RawOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOptions {
    pub language: String,
}

/// Collection-level variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl CollectionBuilder {
    /// Creates a builder with the default name, description and base URL.
    pub fn new() -> Self {
        Self {
            info: Info {
                name: DEFAULT_COLLECTION_NAME.to_string(),
                description: DEFAULT_DESCRIPTION.to_string(),
                schema: COLLECTION_SCHEMA.to_string(),
            },
            base_url: DEFAULT_BASE_URL.to_string(),
            segments: Vec::new(),
            folders: Vec::new(),
        }
    }

    /// Sets the collection name and description.
    pub fn with_info(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.info.name = name.into();
        self.info.description = description.into();
        self
    }

    /// Sets the value of the `baseUrl` collection variable.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Adds a route to the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON body template cannot be rendered.
    pub fn add_route(&mut self, route: &RouteInfo) -> Result<()> {
        let segment = segments(&route.path).next().unwrap_or(ROOT_FOLDER);
        debug!(
            "Adding {} {} to folder '{}'",
            route.method, route.path, segment
        );
        let item = Item {
            name: request_name(route.method, &route.path),
            request: build_request(route)?,
        };

        match self.segments.iter().position(|s| s == segment) {
            Some(index) => self.folders[index].item.push(item),
            None => {
                self.segments.push(segment.to_string());
                self.folders.push(Folder {
                    name: capitalize(segment),
                    item: vec![item],
                });
            }
        }
        Ok(())
    }

    /// Adds every route, in order.
    pub fn add_routes(&mut self, routes: &[RouteInfo]) -> Result<()> {
        routes.iter().try_for_each(|route| self.add_route(route))
    }

    /// Consumes the builder and produces the finished collection.
    pub fn build(self) -> Collection {
        debug!("Building collection with {} folders", self.folders.len());
        Collection {
            info: self.info,
            item: self.folders,
            variable: vec![Variable {
                key: BASE_URL_VARIABLE.to_string(),
                value: self.base_url,
                kind: "string".to_string(),
            }],
        }
    }
}

impl Default for CollectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `GET users avatar` for `GET /users/:id/avatar`.
fn request_name(method: HttpMethod, path: &str) -> String {
    let words = segments(path)
        .filter(|s| !s.starts_with(':'))
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['_', '-'], " ");

    if words.is_empty() {
        format!("{} {}", method, path)
    } else {
        format!("{} {}", method, words)
    }
}

fn build_request(route: &RouteInfo) -> Result<Request> {
    let body_kind = route.body_kind.filter(|_| route.method.accepts_body());

    let mut header = Vec::new();
    if body_kind == Some(BodyKind::Json) {
        header.push(KeyValue {
            key: "Content-Type".to_string(),
            value: "application/json".to_string(),
        });
    }
    header.extend(route.headers.iter().map(|Header { key, value }| KeyValue {
        key: key.clone(),
        value: value.clone(),
    }));

    let body = match body_kind {
        Some(kind) => Some(build_body(kind, &route.body_params)?),
        None => None,
    };

    Ok(Request {
        method: route.method.as_str().to_string(),
        header,
        url: build_url(route),
        description: format!("{} {}", route.method, route.path),
        body,
    })
}

fn build_url(route: &RouteInfo) -> Url {
    let query = (!route.query_params.is_empty()).then(|| {
        route
            .query_params
            .iter()
            .map(|field| QueryParam {
                key: field.key.clone(),
                value: String::new(),
                description: field.description.clone(),
                disabled: false,
            })
            .collect()
    });

    let variable = (!route.path_params.is_empty()).then(|| {
        route
            .path_params
            .iter()
            .map(|param| PathVariable {
                key: param.key.clone(),
                value: param.value.clone(),
                description: param.description.clone(),
            })
            .collect()
    });

    Url {
        raw: format!("{{{{{}}}}}{}", BASE_URL_VARIABLE, route.path),
        host: vec![format!("{{{{{}}}}}", BASE_URL_VARIABLE)],
        path: segments(&route.path).map(str::to_string).collect(),
        query,
        variable,
    }
}

fn build_body(kind: BodyKind, fields: &[FieldDescriptor]) -> Result<Body> {
    match kind {
        BodyKind::FormData => Ok(Body::Formdata {
            formdata: fields
                .iter()
                .map(|field| FormField {
                    key: field.key.clone(),
                    value: String::new(),
                    kind: field.kind.as_str().to_string(),
                    description: field.description.clone(),
                })
                .collect(),
        }),
        BodyKind::Json => {
            let template: serde_json::Map<String, serde_json::Value> = fields
                .iter()
                .map(|field| (field.key.clone(), serde_json::Value::String(String::new())))
                .collect();
            let raw = serde_json::to_string_pretty(&template)?;
            Ok(Body::Raw {
                raw,
                options: BodyOptions {
                    raw: RawOptions {
                        language: "json".to_string(),
                    },
                },
            })
        }
    }
}
