//! Analysis results handed from the source analyzer to the code generator.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// A directory tree of application source together with the import path of its root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRoot {
    pub dir: PathBuf,
    pub import_path: String,
}

impl SourceRoot {
    pub fn new(dir: impl Into<PathBuf>, import_path: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            import_path: import_path.into(),
        }
    }

    /// Import path of a package directory given relative to this root.
    pub fn import_path_for(&self, relative: &std::path::Path) -> String {
        let mut import_path = self.import_path.trim_end_matches('/').to_string();
        for component in relative.components() {
            if let std::path::Component::Normal(segment) = component {
                if !import_path.is_empty() {
                    import_path.push('/');
                }
                import_path.push_str(&segment.to_string_lossy());
            }
        }
        import_path
    }
}

/// Everything the generated entry point needs to know about the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub controller_specs: Vec<TypeInfo>,
    pub test_suites: Vec<TypeInfo>,
    /// file path -> line -> validation key
    pub validation_keys: BTreeMap<String, BTreeMap<u32, String>>,
    pub init_import_paths: BTreeSet<String>,
}

impl SourceInfo {
    /// Adds a side-effect-only import, e.g. a database driver named in configuration.
    pub fn with_init_import(mut self, import_path: impl Into<String>) -> Self {
        let import_path = import_path.into();
        if !import_path.is_empty() {
            self.init_import_paths.insert(import_path);
        }
        self
    }

    pub fn controller(&self, import_path: &str, struct_name: &str) -> Option<&TypeInfo> {
        self.controller_specs
            .iter()
            .find(|spec| spec.import_path == import_path && spec.struct_name == struct_name)
    }

    /// Controllers followed by test suites, the order aliases are assigned in.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.controller_specs.iter().chain(self.test_suites.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub struct_name: String,
    pub import_path: String,
    pub package_name: String,
    pub method_specs: Vec<MethodSpec>,
}

impl TypeInfo {
    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.method_specs.iter().find(|method| method.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub args: Vec<MethodArg>,
    /// line of the call -> argument names, in call order
    pub render_calls: BTreeMap<u32, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodArg {
    pub name: String,
    /// Empty for built-in types.
    pub import_path: String,
    pub type_expr: TypeExpr,
}

/// Source-level type with its package qualifier lifted out so it can be
/// re-emitted under whatever alias the generated file imports it as.
///
/// `[]*models.User` is stored as `expr = "[]*User"`, `pkg_name = "models"`,
/// `pkg_index = 3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeExpr {
    pub expr: String,
    pub pkg_name: String,
    pub pkg_index: usize,
}

impl TypeExpr {
    pub fn builtin(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            pkg_name: String::new(),
            pkg_index: 0,
        }
    }

    pub fn qualified(pkg_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            expr: name.into(),
            pkg_name: pkg_name.into(),
            pkg_index: 0,
        }
    }

    /// Wraps the expression in a prefix such as `*` or `[]`.
    pub fn prefixed(self, prefix: &str) -> Self {
        Self {
            expr: format!("{prefix}{}", self.expr),
            pkg_name: self.pkg_name,
            pkg_index: self.pkg_index + prefix.len(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.pkg_name.is_empty()
    }

    /// Renders the type, qualifying it with `package_alias` when it has a package.
    pub fn type_name(&self, package_alias: &str) -> String {
        if self.pkg_name.is_empty() {
            return self.expr.clone();
        }
        format!(
            "{}{}.{}",
            &self.expr[..self.pkg_index],
            package_alias,
            &self.expr[self.pkg_index..]
        )
    }
}
