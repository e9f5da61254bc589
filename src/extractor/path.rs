//! Base path joining and path parameter extraction.

use crate::extractor::ParamDescriptor;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("valid path parameter regex"));

/// Directory names whose files are route modules mounted under their own file name.
const ROUTE_DIRECTORIES: &[&str] = &["routes", "api"];

/// Joins a base path and a route-local path with exactly one slash between them.
///
/// The result always starts with `/` and never contains `//`. A route-local path of `/` (or
/// an empty one) yields the base path itself.
pub fn normalize_path(base: &str, route: &str) -> String {
    let base = base.trim_end_matches('/');
    let route = route.trim_start_matches('/');

    let joined = if route.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, route)
    };

    let mut normalized = String::with_capacity(joined.len() + 1);
    for ch in std::iter::once('/').chain(joined.chars()) {
        if ch == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(ch);
    }
    normalized
}

/// Extracts `:name` segments from a path, left to right, without duplicates.
pub fn extract_path_params(path: &str) -> Vec<ParamDescriptor> {
    let mut params: Vec<ParamDescriptor> = Vec::new();
    for capture in PATH_PARAM.captures_iter(path) {
        let name = &capture[1];
        if !params.iter().any(|param| param.key == name) {
            params.push(ParamDescriptor::new(name));
        }
    }
    params
}

/// Default base path for a file, from directory naming conventions.
///
/// A file directly inside a `routes` or `api` directory is assumed to be mounted under its
/// own name: `routes/users.js` gives `/users`.
pub fn infer_base_path(file: &Path) -> Option<String> {
    let dir_name = file.parent()?.file_name()?.to_str()?;
    if !ROUTE_DIRECTORIES.contains(&dir_name) {
        return None;
    }
    let stem = file.file_stem()?.to_str()?;
    Some(format!("/{}", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_joins_with_single_slash() {
        assert_eq!(normalize_path("/api", "/users"), "/api/users");
        assert_eq!(normalize_path("/api/", "/users"), "/api/users");
        assert_eq!(normalize_path("/api", "users"), "/api/users");
        assert_eq!(normalize_path("/api/", "users"), "/api/users");
    }

    #[test]
    fn test_normalize_without_base() {
        assert_eq!(normalize_path("", "/users/:id"), "/users/:id");
        assert_eq!(normalize_path("", "users"), "/users");
        assert_eq!(normalize_path("", "/"), "/");
        assert_eq!(normalize_path("", ""), "/");
    }

    #[test]
    fn test_normalize_root_route_under_base() {
        assert_eq!(normalize_path("/orders", "/"), "/orders");
        assert_eq!(normalize_path("/orders/", ""), "/orders");
    }

    #[test]
    fn test_normalize_never_doubles_slashes() {
        let bases = ["", "/", "/a", "/a/", "a", "//a//"];
        let routes = ["", "/", "/b", "b", "b/", "//b", "/b//c"];
        for base in bases {
            for route in routes {
                let path = normalize_path(base, route);
                assert!(path.starts_with('/'), "{:?} + {:?} = {:?}", base, route, path);
                assert!(!path.contains("//"), "{:?} + {:?} = {:?}", base, route, path);
            }
        }
    }

    #[test]
    fn test_normalize_keeps_param_segments() {
        assert_eq!(normalize_path("/users", "/:id/avatar"), "/users/:id/avatar");
    }

    #[test]
    fn test_extract_single_param() {
        let params = extract_path_params("/api/users/:id");
        assert_eq!(params, vec![ParamDescriptor::new("id")]);
        assert!(params[0].value.is_empty());
    }

    #[test]
    fn test_extract_params_in_order() {
        let keys: Vec<_> = extract_path_params("/a/:x/b/:y")
            .into_iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_extract_params_deduplicates() {
        let keys: Vec<_> = extract_path_params("/:id/copy/:id/:other_1")
            .into_iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec!["id", "other_1"]);
    }

    #[test]
    fn test_extract_no_params() {
        assert!(extract_path_params("/health").is_empty());
        assert!(extract_path_params("/time/:9am").is_empty());
    }

    #[test]
    fn test_infer_base_path() {
        assert_eq!(
            infer_base_path(Path::new("/srv/app/routes/users.js")),
            Some("/users".to_string())
        );
        assert_eq!(
            infer_base_path(Path::new("/srv/app/api/orders.ts")),
            Some("/orders".to_string())
        );
        assert_eq!(infer_base_path(Path::new("/srv/app/controller/users.js")), None);
        assert_eq!(infer_base_path(Path::new("users.js")), None);
    }
}
