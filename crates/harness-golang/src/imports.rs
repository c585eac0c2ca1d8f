//! Collision-free package aliases for the generated entry point.

use crate::serializer::ENTRY_FLAGS;
use harness_core::{FrameworkSpec, SourceInfo};
use std::collections::{BTreeMap, BTreeSet};

/// Alias given to imports that are only needed for their side effects.
pub const DISCARD_ALIAS: &str = "_";

/// Standard library packages the generated program always imports.
const RESERVED_STD: &[&str] = &["flag", "reflect"];

/// Package-scope identifiers of the generated program besides its flags.
const PROGRAM_IDENTS: &[&str] = &["main"];

/// Import path -> alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportAliases {
    aliases: BTreeMap<String, String>,
    /// Imports written by the fixed program header rather than the alias loop.
    reserved: BTreeSet<String>,
    /// Identifiers the generated program declares itself; never used as aliases.
    declared: BTreeSet<String>,
}

impl ImportAliases {
    /// Assigns aliases in a stable order: controllers then test suites, each
    /// type's own package before its action argument packages, init imports last.
    pub fn resolve(info: &SourceInfo, framework: &FrameworkSpec) -> Self {
        let mut table = Self::default();
        for package in RESERVED_STD {
            table.reserve(package, package);
        }
        table.reserve(&framework.import_path, &framework.package_name);
        table.declared.extend(
            ENTRY_FLAGS
                .iter()
                .map(|flag| flag.name)
                .chain(PROGRAM_IDENTS.iter().copied())
                .map(str::to_string),
        );

        for spec in info.all_types() {
            table.add(&spec.import_path, &spec.package_name);
            for arg in spec.method_specs.iter().flat_map(|method| &method.args) {
                if arg.import_path.is_empty() {
                    continue;
                }
                table.add(&arg.import_path, &arg.type_expr.pkg_name);
            }
        }

        for import_path in &info.init_import_paths {
            table
                .aliases
                .entry(import_path.clone())
                .or_insert_with(|| DISCARD_ALIAS.to_string());
        }
        table
    }

    fn reserve(&mut self, import_path: &str, alias: &str) {
        self.aliases
            .insert(import_path.to_string(), alias.to_string());
        self.reserved.insert(import_path.to_string());
    }

    /// Registers `import_path` under `package_name`, or under the first free
    /// `package_name0`, `package_name1`, ... when that alias is taken.
    /// Paths that already have an alias keep it.
    pub fn add(&mut self, import_path: &str, package_name: &str) -> &str {
        if !self.aliases.contains_key(import_path) {
            let alias = self.free_alias(package_name);
            self.aliases.insert(import_path.to_string(), alias);
        }
        &self.aliases[import_path]
    }

    fn free_alias(&self, package_name: &str) -> String {
        let taken: BTreeSet<&str> = self
            .aliases
            .values()
            .chain(&self.declared)
            .map(String::as_str)
            .collect();
        if !taken.contains(package_name) {
            return package_name.to_string();
        }
        (0..)
            .map(|index| format!("{package_name}{index}"))
            .find(|alias| !taken.contains(alias.as_str()))
            .unwrap_or_default()
    }

    pub fn alias(&self, import_path: &str) -> Option<&str> {
        self.aliases.get(import_path).map(String::as_str)
    }

    pub fn is_reserved(&self, import_path: &str) -> bool {
        self.reserved.contains(import_path)
    }

    /// Application imports as (import path, alias), sorted by import path.
    pub fn imports(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .filter(|(import_path, _)| !self.reserved.contains(*import_path))
            .map(|(import_path, alias)| (import_path.as_str(), alias.as_str()))
    }

    /// Every entry including the reserved ones.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(import_path, alias)| (import_path.as_str(), alias.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core::{MethodArg, MethodSpec, TypeExpr, TypeInfo};
    use std::collections::BTreeMap;

    fn controller(import_path: &str, package_name: &str, name: &str) -> TypeInfo {
        TypeInfo {
            struct_name: name.to_string(),
            import_path: import_path.to_string(),
            package_name: package_name.to_string(),
            method_specs: Vec::new(),
        }
    }

    #[test]
    fn same_package_name_gets_suffixed_alias() {
        let info = SourceInfo {
            controller_specs: vec![
                controller("example.com/app/controllers", "controllers", "App"),
                controller("example.com/app/admin/controllers", "controllers", "Admin"),
                controller("example.com/app/other/controllers", "controllers", "Other"),
            ],
            ..SourceInfo::default()
        };

        let aliases = ImportAliases::resolve(&info, &FrameworkSpec::default());

        assert_eq!(aliases.alias("example.com/app/controllers"), Some("controllers"));
        assert_eq!(
            aliases.alias("example.com/app/admin/controllers"),
            Some("controllers0")
        );
        assert_eq!(
            aliases.alias("example.com/app/other/controllers"),
            Some("controllers1")
        );
    }

    #[test]
    fn argument_packages_are_aliased_after_owning_type() {
        let mut spec = controller("example.com/app/controllers", "controllers", "App");
        spec.method_specs.push(MethodSpec {
            name: "Show".to_string(),
            args: vec![
                MethodArg {
                    name: "id".to_string(),
                    import_path: String::new(),
                    type_expr: TypeExpr::builtin("int"),
                },
                MethodArg {
                    name: "user".to_string(),
                    import_path: "example.com/app/models".to_string(),
                    type_expr: TypeExpr::qualified("models", "User").prefixed("*"),
                },
            ],
            render_calls: BTreeMap::new(),
        });
        let info = SourceInfo {
            controller_specs: vec![spec],
            ..SourceInfo::default()
        };

        let aliases = ImportAliases::resolve(&info, &FrameworkSpec::default());
        let imports: Vec<_> = aliases.imports().collect();

        assert_eq!(
            imports,
            vec![
                ("example.com/app/controllers", "controllers"),
                ("example.com/app/models", "models"),
            ]
        );
    }

    #[test]
    fn application_package_cannot_shadow_reserved_names() {
        let info = SourceInfo {
            controller_specs: vec![controller("example.com/app/reflect", "reflect", "Mirror")],
            ..SourceInfo::default()
        };

        let aliases = ImportAliases::resolve(&info, &FrameworkSpec::default());

        assert_eq!(aliases.alias("reflect"), Some("reflect"));
        assert_eq!(aliases.alias("example.com/app/reflect"), Some("reflect0"));
        assert!(aliases.is_reserved("github.com/robfig/revel"));
        assert!(aliases.imports().all(|(path, _)| path != "flag"));
    }

    #[test]
    fn application_package_cannot_shadow_program_identifiers() {
        let info = SourceInfo {
            controller_specs: vec![
                controller("example.com/app/port", "port", "Ports"),
                controller("example.com/app/srcPath", "srcPath", "Sources"),
                controller("example.com/app/main", "main", "Entry"),
            ],
            ..SourceInfo::default()
        };

        let aliases = ImportAliases::resolve(&info, &FrameworkSpec::default());

        assert_eq!(aliases.alias("example.com/app/port"), Some("port0"));
        assert_eq!(aliases.alias("example.com/app/srcPath"), Some("srcPath0"));
        assert_eq!(aliases.alias("example.com/app/main"), Some("main0"));
        for flag in &ENTRY_FLAGS {
            assert!(aliases.iter().all(|(_, alias)| alias != flag.name));
        }
    }

    #[test]
    fn init_imports_are_discarded_unless_already_aliased() {
        let info = SourceInfo {
            controller_specs: vec![controller("example.com/app/controllers", "controllers", "App")],
            ..SourceInfo::default()
        }
        .with_init_import("github.com/lib/pq")
        .with_init_import("example.com/app/controllers");

        let aliases = ImportAliases::resolve(&info, &FrameworkSpec::default());

        assert_eq!(aliases.alias("github.com/lib/pq"), Some(DISCARD_ALIAS));
        assert_eq!(aliases.alias("example.com/app/controllers"), Some("controllers"));
    }

    #[test]
    fn aliases_are_unique() {
        let mut aliases = ImportAliases::default();
        for index in 0..12 {
            aliases.add(&format!("example.com/pkg{index}/util"), "util");
        }
        let unique: BTreeSet<_> = aliases.iter().map(|(_, alias)| alias).collect();
        assert_eq!(unique.len(), 12);
    }
}
