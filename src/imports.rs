//! Import bindings and relative module resolution.
//!
//! [`collect_imports`] records, for one file, which local names were bound by a `require`
//! call or an `import` declaration. [`resolve_module_path`] turns a relative specifier into
//! the path of the file it refers to.

use crate::ast::{ImportSpecifier, Node, Pattern};
use crate::loader::SourceLoader;
use crate::parser::ParsedFile;
use log::debug;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Extension tried when a specifier names a file without one.
pub const IMPLICIT_EXTENSION: &str = "js";

/// Exported name recorded for default-style bindings.
pub const DEFAULT_EXPORT: &str = "default";

/// How a local name was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStyle {
    /// `const x = require('...')` or `import x from '...'`
    Default,
    /// `import { a as x } from '...'`
    Named,
    /// `const { a: x } = require('...')`
    Destructured,
}

/// One locally bound name and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local_name: String,
    pub origin_module: String,
    pub exported_name: String,
    pub style: ImportStyle,
}

/// Local name -> binding, for a single file.
pub type ImportMap = HashMap<String, ImportBinding>;

/// Collects every require/import binding in `file`.
///
/// Recognised forms:
/// - `const { a, b: c } = require('./x')`
/// - `const x = require('./x')`
/// - `import x, { a, b as c } from './x'`
///
/// Other binding forms are skipped. A later binding of the same local name replaces the
/// earlier one.
pub fn collect_imports(file: &ParsedFile) -> ImportMap {
    let mut imports = ImportMap::new();

    file.walk(&mut |node| match node {
        Node::VariableDeclarator {
            target,
            init: Some(init),
        } => {
            let Some(module) = require_specifier(init) else {
                return;
            };
            match target {
                Pattern::Object(properties) => {
                    for property in properties {
                        let Some(local) = property.local_name() else {
                            continue;
                        };
                        insert(
                            &mut imports,
                            local,
                            module,
                            &property.key,
                            ImportStyle::Destructured,
                        );
                    }
                }
                Pattern::Identifier(local) => {
                    insert(&mut imports, local, module, DEFAULT_EXPORT, ImportStyle::Default);
                }
                Pattern::Other(_) => {}
            }
        }
        Node::Import(import) => {
            for specifier in &import.specifiers {
                match specifier {
                    ImportSpecifier::Default { local } => insert(
                        &mut imports,
                        local,
                        &import.source,
                        DEFAULT_EXPORT,
                        ImportStyle::Default,
                    ),
                    ImportSpecifier::Named { imported, local } => insert(
                        &mut imports,
                        local,
                        &import.source,
                        imported,
                        ImportStyle::Named,
                    ),
                }
            }
        }
        _ => {}
    });

    debug!(
        "Collected {} import bindings from {}",
        imports.len(),
        file.path.display()
    );
    imports
}

fn insert(imports: &mut ImportMap, local: &str, module: &str, exported: &str, style: ImportStyle) {
    imports.insert(
        local.to_string(),
        ImportBinding {
            local_name: local.to_string(),
            origin_module: module.to_string(),
            exported_name: exported.to_string(),
            style,
        },
    );
}

/// Returns the specifier of `require('<literal>')`.
fn require_specifier(node: &Node) -> Option<&str> {
    match node {
        Node::Call { callee, arguments } if callee.as_identifier() == Some("require") => {
            arguments.first()?.as_str_literal()
        }
        _ => None,
    }
}

/// Resolves a relative import specifier against the file that contains it.
///
/// Only `./` and `../` specifiers are resolved; package names and absolute specifiers return
/// `None`. The literal path is tried first, then the path with `.js` appended.
pub fn resolve_module_path<L>(specifier: &str, importing_file: &Path, loader: &L) -> Option<PathBuf>
where
    L: SourceLoader + ?Sized,
{
    if !is_relative(specifier) {
        return None;
    }

    let base_dir = importing_file.parent().unwrap_or_else(|| Path::new(""));
    let candidate = normalize_path(&base_dir.join(specifier));
    if loader.exists(&candidate) {
        return Some(candidate);
    }

    let suffix = format!(".{}", IMPLICIT_EXTENSION);
    if !specifier.ends_with(&suffix) {
        let mut with_extension = candidate.into_os_string();
        with_extension.push(&suffix);
        let with_extension = PathBuf::from(with_extension);
        if loader.exists(&with_extension) {
            return Some(with_extension);
        }
    }

    debug!(
        "Could not resolve '{}' from {}",
        specifier,
        importing_file.display()
    );
    None
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Lexically removes `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::parser::AstParser;

    fn imports_of(code: &str) -> ImportMap {
        let parsed = AstParser::new()
            .unwrap()
            .parse_source(Path::new("/app/routes/auth.js"), code)
            .unwrap();
        collect_imports(&parsed)
    }

    #[test]
    fn test_destructured_require() {
        let imports = imports_of(
            "const { loginHandler, registerHandler: signUp } = require('../controller/authController');",
        );

        assert_eq!(imports.len(), 2);
        let login = &imports["loginHandler"];
        assert_eq!(login.origin_module, "../controller/authController");
        assert_eq!(login.exported_name, "loginHandler");
        assert_eq!(login.style, ImportStyle::Destructured);

        let sign_up = &imports["signUp"];
        assert_eq!(sign_up.exported_name, "registerHandler");
    }

    #[test]
    fn test_default_require() {
        let imports = imports_of("const orderController = require('../controller/orderController');");

        let binding = &imports["orderController"];
        assert_eq!(binding.exported_name, DEFAULT_EXPORT);
        assert_eq!(binding.style, ImportStyle::Default);
    }

    #[test]
    fn test_es_module_imports() {
        let imports = imports_of("import users, { list as listUsers } from './users';");

        assert_eq!(imports["users"].style, ImportStyle::Default);
        assert_eq!(imports["listUsers"].exported_name, "list");
        assert_eq!(imports["listUsers"].style, ImportStyle::Named);
    }

    #[test]
    fn test_unsupported_bindings_are_ignored() {
        let imports = imports_of(
            r#"
            const path = require(dynamicName);
            const [first] = require('./list');
            const router = express.Router();
            import * as everything from './all';
        "#,
        );
        assert!(imports.is_empty());
    }

    #[test]
    fn test_require_inside_function_is_collected() {
        let imports = imports_of("function load() { const ctrl = require('./ctrl'); }");
        assert!(imports.contains_key("ctrl"));
    }

    #[test]
    fn test_resolve_relative_path_with_implicit_extension() {
        let loader = MemoryLoader::new()
            .with_file("/app/controller/authController.js", "")
            .with_file("/app/routes/util.js", "");
        let importing = Path::new("/app/routes/auth.js");

        assert_eq!(
            resolve_module_path("../controller/authController", importing, &loader),
            Some(PathBuf::from("/app/controller/authController.js"))
        );
        assert_eq!(
            resolve_module_path("./util.js", importing, &loader),
            Some(PathBuf::from("/app/routes/util.js"))
        );
        assert_eq!(
            resolve_module_path("./././util", importing, &loader),
            Some(PathBuf::from("/app/routes/util.js"))
        );
    }

    #[test]
    fn test_resolve_prefers_literal_path() {
        let loader = MemoryLoader::new()
            .with_file("/app/lib/handlers", "")
            .with_file("/app/lib/handlers.js", "");

        assert_eq!(
            resolve_module_path("../lib/handlers", Path::new("/app/src/index.js"), &loader),
            Some(PathBuf::from("/app/lib/handlers"))
        );
    }

    #[test]
    fn test_resolve_skips_packages_and_missing_files() {
        let loader = MemoryLoader::new().with_file("/app/express.js", "");
        let importing = Path::new("/app/index.js");

        assert_eq!(resolve_module_path("express", importing, &loader), None);
        assert_eq!(resolve_module_path("/app/express", importing, &loader), None);
        assert_eq!(resolve_module_path("./missing", importing, &loader), None);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/app/routes/../controller/./a.js")),
            PathBuf::from("/app/controller/a.js")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_normalize_path_keeps_leading_parent_dirs() {
        assert_eq!(
            normalize_path(Path::new("../routes/../../lib/x")),
            PathBuf::from("../../lib/x")
        );
        assert_eq!(
            normalize_path(Path::new("./../shop/routes/../controller/a.js")),
            PathBuf::from("../shop/controller/a.js")
        );
        assert_eq!(normalize_path(Path::new("/app/../../a.js")), PathBuf::from("/a.js"));
    }
}
