//! Emits the generated `main.go` that registers controllers with the framework.

use crate::imports::ImportAliases;
use crate::parser::inferred_package_name;
use harness_core::error::Result;
use harness_core::{Error, FrameworkSpec, MethodSpec, SourceInfo, TypeInfo};

/// Bumped whenever the shape of the generated program changes.
pub const ENTRY_TEMPLATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    String,
    Int,
}

impl FlagKind {
    fn go_type(self) -> &'static str {
        match self {
            FlagKind::String => "*string",
            FlagKind::Int => "*int",
        }
    }

    fn constructor(self) -> &'static str {
        match self {
            FlagKind::String => "String",
            FlagKind::Int => "Int",
        }
    }
}

/// A command-line flag the generated program accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFlag {
    pub name: &'static str,
    pub kind: FlagKind,
    /// Go literal.
    pub default: &'static str,
    pub usage: &'static str,
}

pub const ENTRY_FLAGS: [EntryFlag; 4] = [
    EntryFlag {
        name: "runMode",
        kind: FlagKind::String,
        default: "\"\"",
        usage: "Run mode.",
    },
    EntryFlag {
        name: "port",
        kind: FlagKind::Int,
        default: "0",
        usage: "By default, read from app.conf",
    },
    EntryFlag {
        name: "importPath",
        kind: FlagKind::String,
        default: "\"\"",
        usage: "Go Import Path for the app.",
    },
    EntryFlag {
        name: "srcPath",
        kind: FlagKind::String,
        default: "\"\"",
        usage: "Path to the source root.",
    },
];

/// Public entry point used by the build orchestrator.
#[derive(Clone, Debug)]
pub struct MainSerializer<'a> {
    framework: &'a FrameworkSpec,
}

impl<'a> MainSerializer<'a> {
    pub fn new(framework: &'a FrameworkSpec) -> Self {
        Self { framework }
    }

    /// Renders the program. The output depends only on the arguments.
    pub fn serialize(&self, info: &SourceInfo, aliases: &ImportAliases) -> Result<String> {
        let mut emitter = MainEmitter::new(self.framework, aliases);
        emitter.emit_program(info)?;
        Ok(emitter.finish())
    }
}

struct MainEmitter<'a> {
    code: String,
    indent: usize,
    framework: &'a FrameworkSpec,
    aliases: &'a ImportAliases,
}

impl<'a> MainEmitter<'a> {
    fn new(framework: &'a FrameworkSpec, aliases: &'a ImportAliases) -> Self {
        Self {
            code: String::new(),
            indent: 0,
            framework,
            aliases,
        }
    }

    fn finish(mut self) -> String {
        if !self.code.ends_with('\n') {
            self.code.push('\n');
        }
        self.code
    }

    fn emit_program(&mut self, info: &SourceInfo) -> Result<()> {
        self.emit_header();
        self.emit_imports();
        self.emit_flags();
        self.emit_main(info)
    }

    fn emit_header(&mut self) {
        self.push_line("// Code generated by revel-harness. DO NOT EDIT.");
        self.push_line(&format!(
            "// Entry point template version {ENTRY_TEMPLATE_VERSION}."
        ));
        self.push_blank_line();
        self.push_line("package main");
        self.push_blank_line();
    }

    fn emit_imports(&mut self) {
        self.push_line("import (");
        self.indent += 1;
        self.push_line("\"flag\"");
        self.push_line("\"reflect\"");
        self.push_blank_line();

        let framework_path = go_quote(&self.framework.import_path);
        if inferred_package_name(&self.framework.import_path) == self.framework.package_name {
            self.push_line(&framework_path);
        } else {
            self.push_line(&format!("{} {framework_path}", self.framework.package_name));
        }

        let aliases = self.aliases;
        for (import_path, alias) in aliases.imports() {
            self.push_line(&format!("{alias} {}", go_quote(import_path)));
        }
        self.indent -= 1;
        self.push_line(")");
        self.push_blank_line();
    }

    fn emit_flags(&mut self) {
        let name_width = ENTRY_FLAGS.iter().map(|flag| flag.name.len()).max().unwrap_or(0);
        let type_width = ENTRY_FLAGS
            .iter()
            .map(|flag| flag.kind.go_type().len())
            .max()
            .unwrap_or(0);

        self.push_line("var (");
        self.indent += 1;
        for flag in &ENTRY_FLAGS {
            self.push_line(&format!(
                "{:<name_width$} {:<type_width$} = flag.{}({}, {}, {})",
                flag.name,
                flag.kind.go_type(),
                flag.kind.constructor(),
                go_quote(flag.name),
                flag.default,
                go_quote(flag.usage),
            ));
        }
        self.push_blank_line();
        self.push_line("// Keeps the reflect import used when no action takes arguments.");
        self.push_line("_ = reflect.Invalid");
        self.indent -= 1;
        self.push_line(")");
        self.push_blank_line();
    }

    fn emit_main(&mut self, info: &SourceInfo) -> Result<()> {
        let fw = self.framework.package_name.clone();
        self.push_line("func main() {");
        self.indent += 1;
        self.push_line("flag.Parse()");
        self.push_line(&format!("{fw}.Init(*runMode, *importPath, *srcPath)"));
        self.push_line(&format!("{fw}.INFO.Println(\"Running revel server\")"));
        self.push_blank_line();

        for spec in &info.controller_specs {
            self.emit_controller(spec)?;
        }
        self.emit_validation_keys(info);
        self.emit_test_suites(info)?;

        self.push_blank_line();
        self.push_line(&format!("{fw}.Run(*port)"));
        self.indent -= 1;
        self.push_line("}");
        Ok(())
    }

    fn emit_controller(&mut self, spec: &TypeInfo) -> Result<()> {
        let fw = self.framework.package_name.clone();
        let controller = self.qualified_type(spec)?;
        self.push_line(&format!("{fw}.RegisterController((*{controller})(nil),"));
        self.indent += 1;
        if spec.method_specs.is_empty() {
            self.push_line(&format!("[]*{fw}.MethodType{{}})"));
        } else {
            self.push_line(&format!("[]*{fw}.MethodType{{"));
            self.indent += 1;
            for method in &spec.method_specs {
                self.emit_method(method)?;
            }
            self.indent -= 1;
            self.push_line("})");
        }
        self.indent -= 1;
        self.push_blank_line();
        Ok(())
    }

    fn emit_method(&mut self, method: &MethodSpec) -> Result<()> {
        let fw = self.framework.package_name.clone();
        self.push_line(&format!("&{fw}.MethodType{{"));
        self.indent += 1;
        self.push_line(&format!("Name: {},", go_quote(&method.name)));

        if method.args.is_empty() {
            self.push_line(&format!("Args: []*{fw}.MethodArg{{}},"));
        } else {
            self.push_line(&format!("Args: []*{fw}.MethodArg{{"));
            self.indent += 1;
            for arg in &method.args {
                let type_name = if arg.import_path.is_empty() {
                    arg.type_expr.type_name("")
                } else {
                    arg.type_expr.type_name(self.alias_for(&arg.import_path)?)
                };
                self.push_line(&format!(
                    "&{fw}.MethodArg{{Name: {}, Type: reflect.TypeOf((*{type_name})(nil))}},",
                    go_quote(&arg.name)
                ));
            }
            self.indent -= 1;
            self.push_line("},");
        }

        if method.render_calls.is_empty() {
            self.push_line("RenderArgNames: map[int][]string{},");
        } else {
            self.push_line("RenderArgNames: map[int][]string{");
            self.indent += 1;
            for (line, names) in &method.render_calls {
                self.push_line(&format!("{line}: []string{{"));
                self.indent += 1;
                for name in names {
                    self.push_line(&format!("{},", go_quote(name)));
                }
                self.indent -= 1;
                self.push_line("},");
            }
            self.indent -= 1;
            self.push_line("},");
        }

        self.indent -= 1;
        self.push_line("},");
        Ok(())
    }

    fn emit_validation_keys(&mut self, info: &SourceInfo) {
        let fw = self.framework.package_name.clone();
        if info.validation_keys.is_empty() {
            self.push_line(&format!(
                "{fw}.DefaultValidationKeys = map[string]map[int]string{{}}"
            ));
            return;
        }
        self.push_line(&format!(
            "{fw}.DefaultValidationKeys = map[string]map[int]string{{"
        ));
        self.indent += 1;
        for (path, lines) in &info.validation_keys {
            self.push_line(&format!("{}: {{", go_quote(path)));
            self.indent += 1;
            for (line, key) in lines {
                self.push_line(&format!("{line}: {},", go_quote(key)));
            }
            self.indent -= 1;
            self.push_line("},");
        }
        self.indent -= 1;
        self.push_line("}");
    }

    fn emit_test_suites(&mut self, info: &SourceInfo) -> Result<()> {
        let fw = self.framework.package_name.clone();
        if info.test_suites.is_empty() {
            self.push_line(&format!("{fw}.TestSuites = []interface{{}}{{}}"));
            return Ok(());
        }
        self.push_line(&format!("{fw}.TestSuites = []interface{{}}{{"));
        self.indent += 1;
        for suite in &info.test_suites {
            let suite = self.qualified_type(suite)?;
            self.push_line(&format!("(*{suite})(nil),"));
        }
        self.indent -= 1;
        self.push_line("}");
        Ok(())
    }

    fn qualified_type(&self, spec: &TypeInfo) -> Result<String> {
        let alias = self.alias_for(&spec.import_path)?;
        Ok(format!("{alias}.{}", spec.struct_name))
    }

    fn alias_for(&self, import_path: &str) -> Result<&'a str> {
        self.aliases
            .alias(import_path)
            .ok_or_else(|| Error::generation(format!("no import alias for `{import_path}`")))
    }

    fn push_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.code.push('\t');
        }
        self.code.push_str(line);
        self.code.push('\n');
    }

    fn push_blank_line(&mut self) {
        if self.code.ends_with("\n\n") || self.code.is_empty() {
            return;
        }
        self.code.push('\n');
    }
}

/// Quotes `value` as a Go interpreted string literal.
pub fn go_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch if ch.is_ascii_control() => quoted.push_str(&format!("\\x{:02x}", ch as u32)),
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_quote_escapes_specials() {
        assert_eq!(go_quote("plain"), "\"plain\"");
        assert_eq!(go_quote("C:\\app\\x.go"), "\"C:\\\\app\\\\x.go\"");
        assert_eq!(go_quote("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(go_quote("\u{1}"), "\"\\x01\"");
    }

    #[test]
    fn flags_are_the_fixed_four() {
        let names: Vec<_> = ENTRY_FLAGS.iter().map(|flag| flag.name).collect();
        assert_eq!(names, ["runMode", "port", "importPath", "srcPath"]);
    }

    #[test]
    fn missing_alias_is_a_generation_error() {
        let framework = FrameworkSpec::default();
        let info = SourceInfo {
            controller_specs: vec![TypeInfo {
                struct_name: "App".to_string(),
                import_path: "example.com/app/controllers".to_string(),
                package_name: "controllers".to_string(),
                method_specs: Vec::new(),
            }],
            ..SourceInfo::default()
        };

        let result = MainSerializer::new(&framework).serialize(&info, &ImportAliases::default());

        assert!(matches!(result, Err(Error::Generation(_))));
    }
}
