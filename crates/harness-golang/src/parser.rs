//! Go parser built on top of `tree-sitter-go`.
//!
//! Only the facts the harness needs are extracted from a file: the package
//! clause, imports, struct types with their embedded fields, method signatures,
//! and the call sites that feed render-argument and validation-key metadata.
//! No type checking happens here.

use eyre::{eyre, Result};
use harness_core::{FrameworkSpec, TypeExpr};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};
use tree_sitter::{Node as TsNode, Parser as TsParser};

const BUILTIN_TYPES: &[&str] = &[
    "any", "bool", "byte", "complex64", "complex128", "error", "float32", "float64", "int",
    "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32",
    "uint64", "uintptr",
];

pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

/// First syntax error tree-sitter reported for a file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at line {line}: {message}")]
pub struct SyntaxError {
    pub line: u32,
    pub message: String,
}

impl SyntaxError {
    fn locate(root: TsNode, source: &str) -> Self {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.is_missing() {
                return Self {
                    line: line_of(node),
                    message: format!("missing {}", node.kind()),
                };
            }
            if node.is_error() {
                let text = node
                    .utf8_text(source.as_bytes())
                    .ok()
                    .and_then(|text| text.lines().next())
                    .unwrap_or_default()
                    .trim();
                return Self {
                    line: line_of(node),
                    message: format!("unexpected `{text}`"),
                };
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        Self {
            line: 1,
            message: "unparsable source".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub package_name: String,
    pub imports: Vec<ImportDecl>,
    pub structs: Vec<StructDecl>,
    pub methods: Vec<MethodDecl>,
    /// line -> validation key
    pub validation_keys: BTreeMap<u32, String>,
    /// Declares a package-level `func init()`.
    pub has_init: bool,
}

impl ParsedFile {
    pub fn blank_imports(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|import| import.is_blank())
            .map(|import| import.path.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Explicit import name: an identifier, `_` or `.`.
    pub name: Option<String>,
    pub path: String,
}

impl ImportDecl {
    pub fn is_blank(&self) -> bool {
        self.name.as_deref() == Some("_")
    }

    /// Name the file refers to the package by.
    pub fn package_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) => name.to_string(),
            None => inferred_package_name(&self.path),
        }
    }
}

/// Best guess at a package's declared name from its import path: the last
/// segment, skipping a major-version suffix (`/v2`) and conventional `go-`
/// prefixes or `.v1` suffixes.
pub fn inferred_package_name(import_path: &str) -> String {
    let mut segments = import_path.rsplit('/').filter(|segment| !segment.is_empty());
    let last = segments.next().unwrap_or(import_path);
    let segment = if is_major_version(last) {
        segments.next().unwrap_or(last)
    } else {
        last
    };
    let segment = segment.split('.').next().unwrap_or(segment);
    segment.trim_start_matches("go-").replace('-', "_")
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|ch| ch.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub line: u32,
    pub embedded: Vec<EmbeddedType>,
}

/// An anonymous (embedded) struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedType {
    /// `None` when the type is declared in the same package.
    pub import_path: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrigin {
    Builtin,
    Local,
    Import(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub expr: TypeExpr,
    pub origin: TypeOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub receiver_type: String,
    pub name: String,
    pub line: u32,
    pub params: Vec<ParamDecl>,
    /// Why the parameter list cannot be registered, if it cannot.
    pub unsupported_param: Option<String>,
    /// `None` entries are result types the parser does not model.
    pub results: Vec<Option<TypeRef>>,
    /// line of the closing parenthesis -> identifier arguments
    pub render_calls: BTreeMap<u32, Vec<String>>,
}

impl MethodDecl {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    /// Whether the single result is the framework's action result type.
    pub fn returns(&self, import_path: &str, type_name: &str) -> bool {
        match self.results.as_slice() {
            [Some(TypeRef {
                expr,
                origin: TypeOrigin::Import(path),
            })] => path == import_path && expr.expr == type_name && expr.pkg_index == 0,
            _ => false,
        }
    }
}

pub fn is_exported(name: &str) -> bool {
    matches!(name.chars().next(), Some(ch) if ch.is_uppercase())
}

/// High-level parser that owns a tree-sitter instance for Go.
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    /// Create a new parser instance with the Go grammar loaded.
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|err| eyre!("Failed to load tree-sitter Go grammar: {err}"))?;
        Ok(Self { parser })
    }

    /// Parse one Go file. Syntax errors surface as a [`SyntaxError`] inside the report.
    pub fn parse_str(&mut self, source: &str, framework: &FrameworkSpec) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| eyre!("failed to parse Go source"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(SyntaxError::locate(root, source).into());
        }
        parse_file(root, source, framework)
    }
}

struct FileContext<'a> {
    source: &'a str,
    package_name: &'a str,
    imports: &'a [ImportDecl],
    framework: &'a FrameworkSpec,
}

impl<'a> FileContext<'a> {
    fn text<'n>(&self, node: TsNode<'n>) -> Result<&'a str> {
        Ok(node.utf8_text(self.source.as_bytes())?)
    }

    fn resolve_qualifier(&self, qualifier: &str) -> Option<&'a str> {
        let explicit = self
            .imports
            .iter()
            .find(|import| import.name.as_deref() == Some(qualifier));
        let implicit = || {
            self.imports
                .iter()
                .filter(|import| import.name.is_none())
                .find(|import| inferred_package_name(&import.path) == qualifier)
        };
        explicit
            .or_else(implicit)
            .map(|import| import.path.as_str())
    }
}

fn parse_file(root: TsNode, source: &str, framework: &FrameworkSpec) -> Result<ParsedFile> {
    let children = named_children(root);

    let mut package_name = None;
    let mut imports = Vec::new();
    for child in &children {
        match child.kind() {
            "package_clause" => package_name = Some(parse_package_clause(*child, source)?),
            "import_declaration" => imports.extend(parse_import_declaration(*child, source)?),
            _ => {}
        }
    }
    let package_name = package_name.ok_or_else(|| eyre!("missing package clause"))?;

    let ctx = FileContext {
        source,
        package_name: &package_name,
        imports: &imports,
        framework,
    };

    let mut structs = Vec::new();
    let mut methods = Vec::new();
    let mut validation_keys = BTreeMap::new();
    let mut has_init = false;
    for child in children {
        match child.kind() {
            "type_declaration" => structs.extend(parse_type_declaration(child, &ctx)?),
            "method_declaration" => {
                if let Some(method) = parse_method(child, &ctx)? {
                    methods.push(method);
                }
                validation_keys.extend(collect_validation_keys(child, &ctx)?);
            }
            "function_declaration" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|name| ctx.text(name))
                    .transpose()?;
                has_init |= name == Some("init");
                validation_keys.extend(collect_validation_keys(child, &ctx)?);
            }
            _ => {}
        }
    }

    Ok(ParsedFile {
        package_name,
        imports,
        structs,
        methods,
        validation_keys,
        has_init,
    })
}

fn parse_package_clause(node: TsNode, source: &str) -> Result<String> {
    let name = named_children(node)
        .into_iter()
        .find(|child| child.kind() == "package_identifier" || child.kind() == "identifier")
        .ok_or_else(|| eyre!("package clause missing name"))?;
    Ok(name.utf8_text(source.as_bytes())?.to_string())
}

fn parse_import_declaration(node: TsNode, source: &str) -> Result<Vec<ImportDecl>> {
    let mut imports = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "import_spec" => imports.push(parse_import_spec(child, source)?),
            "import_spec_list" => {
                for spec in named_children(child) {
                    if spec.kind() == "import_spec" {
                        imports.push(parse_import_spec(spec, source)?);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(imports)
}

fn parse_import_spec(node: TsNode, source: &str) -> Result<ImportDecl> {
    let path_node = node
        .child_by_field_name("path")
        .ok_or_else(|| eyre!("import spec missing path"))?;
    let name = node
        .child_by_field_name("name")
        .map(|name| name.utf8_text(source.as_bytes()).map(str::to_string))
        .transpose()?;

    Ok(ImportDecl {
        name,
        path: parse_string_literal(path_node, source)?,
    })
}

fn parse_type_declaration(node: TsNode, ctx: &FileContext) -> Result<Vec<StructDecl>> {
    let mut structs = Vec::new();
    for child in named_children(node) {
        if child.kind() != "type_spec" {
            continue;
        }
        if let Some(decl) = parse_type_spec(child, ctx)? {
            structs.push(decl);
        }
    }
    Ok(structs)
}

fn parse_type_spec(node: TsNode, ctx: &FileContext) -> Result<Option<StructDecl>> {
    let name_node = node
        .child_by_field_name("name")
        .ok_or_else(|| eyre!("type spec missing name"))?;
    let ty_node = node
        .child_by_field_name("type")
        .ok_or_else(|| eyre!("type spec missing type"))?;
    if ty_node.kind() != "struct_type" {
        return Ok(None);
    }

    let mut embedded = Vec::new();
    for list in named_children(ty_node) {
        if list.kind() != "field_declaration_list" {
            continue;
        }
        for field in named_children(list) {
            if field.kind() != "field_declaration" || field.child_by_field_name("name").is_some() {
                continue;
            }
            if let Some(embed) = parse_embedded_field(field, ctx)? {
                embedded.push(embed);
            }
        }
    }

    Ok(Some(StructDecl {
        name: ctx.text(name_node)?.to_string(),
        line: line_of(node),
        embedded,
    }))
}

fn parse_embedded_field(field: TsNode, ctx: &FileContext) -> Result<Option<EmbeddedType>> {
    let Some(ty_node) = field.child_by_field_name("type") else {
        return Ok(None);
    };
    let ty_node = unwrap_generic(ty_node);
    match ty_node.kind() {
        "type_identifier" => Ok(Some(EmbeddedType {
            import_path: None,
            name: ctx.text(ty_node)?.to_string(),
        })),
        "qualified_type" => {
            let (qualifier, name) = qualified_parts(ty_node, ctx)?;
            let Some(import_path) = ctx.resolve_qualifier(qualifier) else {
                warn!("embedded type {qualifier}.{name} refers to an unknown import");
                return Ok(None);
            };
            Ok(Some(EmbeddedType {
                import_path: Some(import_path.to_string()),
                name: name.to_string(),
            }))
        }
        kind => {
            debug!("ignoring embedded field of kind {kind:?}");
            Ok(None)
        }
    }
}

fn parse_method(node: TsNode, ctx: &FileContext) -> Result<Option<MethodDecl>> {
    let name_node = node
        .child_by_field_name("name")
        .ok_or_else(|| eyre!("method declaration missing name"))?;
    let name = ctx.text(name_node)?.to_string();

    let receiver = node
        .child_by_field_name("receiver")
        .ok_or_else(|| eyre!("method {name} missing receiver"))?;
    let Some(receiver_type) = parse_receiver_type(receiver, ctx)? else {
        warn!("method {name} has an unsupported receiver");
        return Ok(None);
    };

    let (params, unsupported_param) = match node.child_by_field_name("parameters") {
        Some(params_node) => match parse_parameter_list(params_node, ctx)? {
            Ok(params) => (params, None),
            Err(reason) => (Vec::new(), Some(reason)),
        },
        None => (Vec::new(), None),
    };

    let results = node
        .child_by_field_name("result")
        .map(|result| parse_results(result, ctx))
        .transpose()?
        .unwrap_or_default();

    let render_calls = node
        .child_by_field_name("body")
        .map(|body| collect_render_calls(body, ctx))
        .transpose()?
        .unwrap_or_default();

    Ok(Some(MethodDecl {
        receiver_type,
        name,
        line: line_of(node),
        params,
        unsupported_param,
        results,
        render_calls,
    }))
}

fn parse_receiver_type(receiver: TsNode, ctx: &FileContext) -> Result<Option<String>> {
    let Some(decl) = named_children(receiver)
        .into_iter()
        .find(|child| child.kind() == "parameter_declaration")
    else {
        return Ok(None);
    };
    let Some(mut ty_node) = decl.child_by_field_name("type") else {
        return Ok(None);
    };
    if ty_node.kind() == "pointer_type" {
        let Some(inner) = last_named_child(ty_node) else {
            return Ok(None);
        };
        ty_node = inner;
    }
    let ty_node = unwrap_generic(ty_node);
    if ty_node.kind() != "type_identifier" {
        return Ok(None);
    }
    Ok(Some(ctx.text(ty_node)?.to_string()))
}

/// `Ok(Err(reason))` when a parameter cannot be described for registration.
fn parse_parameter_list(
    node: TsNode,
    ctx: &FileContext,
) -> Result<std::result::Result<Vec<ParamDecl>, String>> {
    let mut params = Vec::new();
    for decl in named_children(node) {
        let variadic = match decl.kind() {
            "parameter_declaration" => false,
            "variadic_parameter_declaration" => true,
            _ => continue,
        };
        let ty_node = decl
            .child_by_field_name("type")
            .ok_or_else(|| eyre!("parameter missing type"))?;
        let ty = match parse_type_ref(ty_node, ctx)? {
            Ok(ty) if variadic => TypeRef {
                expr: ty.expr.prefixed("[]"),
                origin: ty.origin,
            },
            Ok(ty) => ty,
            Err(reason) => return Ok(Err(reason)),
        };

        let mut cursor = decl.walk();
        let names: Vec<_> = decl.children_by_field_name("name", &mut cursor).collect();
        if names.is_empty() {
            return Ok(Err("unnamed parameter".to_string()));
        }
        for name in names {
            params.push(ParamDecl {
                name: ctx.text(name)?.to_string(),
                ty: ty.clone(),
            });
        }
    }
    Ok(Ok(params))
}

fn parse_results(node: TsNode, ctx: &FileContext) -> Result<Vec<Option<TypeRef>>> {
    if node.kind() != "parameter_list" {
        return Ok(vec![parse_type_ref(node, ctx)?.ok()]);
    }

    let mut results = Vec::new();
    for decl in named_children(node) {
        if decl.kind() != "parameter_declaration" {
            continue;
        }
        let ty_node = decl
            .child_by_field_name("type")
            .ok_or_else(|| eyre!("result parameter missing type"))?;
        let ty = parse_type_ref(ty_node, ctx)?.ok();
        let mut cursor = decl.walk();
        let count = decl.children_by_field_name("name", &mut cursor).count().max(1);
        results.extend(std::iter::repeat(ty).take(count));
    }
    Ok(results)
}

/// `Ok(Err(reason))` for type shapes that cannot be re-emitted in generated code.
fn parse_type_ref(node: TsNode, ctx: &FileContext) -> Result<std::result::Result<TypeRef, String>> {
    let text = ctx.text(node)?;
    let ty = match node.kind() {
        "type_identifier" | "identifier" => {
            if is_builtin_type(text) {
                TypeRef {
                    expr: TypeExpr::builtin(text),
                    origin: TypeOrigin::Builtin,
                }
            } else {
                TypeRef {
                    expr: TypeExpr::qualified(ctx.package_name, text),
                    origin: TypeOrigin::Local,
                }
            }
        }
        "qualified_type" => {
            let (qualifier, name) = qualified_parts(node, ctx)?;
            let Some(import_path) = ctx.resolve_qualifier(qualifier) else {
                return Ok(Err(format!("unknown package qualifier `{qualifier}`")));
            };
            TypeRef {
                expr: TypeExpr::qualified(qualifier, name),
                origin: TypeOrigin::Import(import_path.to_string()),
            }
        }
        "pointer_type" => {
            let inner = last_named_child(node).ok_or_else(|| eyre!("pointer type missing inner"))?;
            return Ok(parse_type_ref(inner, ctx)?.map(|ty| prefix_ref(ty, "*")));
        }
        "slice_type" => {
            let element = node
                .child_by_field_name("element")
                .ok_or_else(|| eyre!("slice type missing element"))?;
            return Ok(parse_type_ref(element, ctx)?.map(|ty| prefix_ref(ty, "[]")));
        }
        "array_type" => {
            let length = node
                .child_by_field_name("length")
                .ok_or_else(|| eyre!("array type missing length"))?;
            let element = node
                .child_by_field_name("element")
                .ok_or_else(|| eyre!("array type missing element"))?;
            let prefix = format!("[{}]", ctx.text(length)?.trim());
            return Ok(parse_type_ref(element, ctx)?.map(|ty| prefix_ref(ty, &prefix)));
        }
        "map_type" => {
            let key = node
                .child_by_field_name("key")
                .ok_or_else(|| eyre!("map type missing key"))?;
            let value = node
                .child_by_field_name("value")
                .ok_or_else(|| eyre!("map type missing value"))?;
            let key = match parse_type_ref(key, ctx)? {
                Ok(key) if key.origin == TypeOrigin::Builtin => key,
                Ok(_) => return Ok(Err(format!("map key of `{text}` is not a built-in type"))),
                Err(reason) => return Ok(Err(reason)),
            };
            let prefix = format!("map[{}]", key.expr.expr);
            return Ok(parse_type_ref(value, ctx)?.map(|ty| prefix_ref(ty, &prefix)));
        }
        "parenthesized_type" => {
            let inner = last_named_child(node).ok_or_else(|| eyre!("empty parenthesized type"))?;
            return parse_type_ref(inner, ctx);
        }
        "interface_type" if text.split_whitespace().collect::<String>() == "interface{}" => {
            TypeRef {
                expr: TypeExpr::builtin("interface{}"),
                origin: TypeOrigin::Builtin,
            }
        }
        _ => return Ok(Err(format!("unsupported type `{text}`"))),
    };
    Ok(Ok(ty))
}

fn prefix_ref(ty: TypeRef, prefix: &str) -> TypeRef {
    TypeRef {
        expr: ty.expr.prefixed(prefix),
        origin: ty.origin,
    }
}

fn qualified_parts<'a>(node: TsNode, ctx: &FileContext<'a>) -> Result<(&'a str, &'a str)> {
    let package = node
        .child_by_field_name("package")
        .ok_or_else(|| eyre!("qualified type missing package"))?;
    let name = node
        .child_by_field_name("name")
        .ok_or_else(|| eyre!("qualified type missing name"))?;
    Ok((ctx.text(package)?, ctx.text(name)?))
}

fn collect_render_calls(body: TsNode, ctx: &FileContext) -> Result<BTreeMap<u32, Vec<String>>> {
    let mut calls = BTreeMap::new();
    for call in descendants_of_kind(body, "call_expression") {
        let Some((_, method, args)) = selector_call(call, ctx)? else {
            continue;
        };
        if !ctx.framework.is_render_method(method) {
            continue;
        }
        let line = line_of_end(args);
        let mut names = Vec::new();
        for arg in named_children(args) {
            if arg.kind() == "identifier" {
                names.push(ctx.text(arg)?.to_string());
            } else {
                debug!("unnamed argument to {method} call at line {line}");
            }
        }
        calls.insert(line, names);
    }
    Ok(calls)
}

fn collect_validation_keys(decl: TsNode, ctx: &FileContext) -> Result<BTreeMap<u32, String>> {
    let mut keys = BTreeMap::new();
    let Some(body) = decl.child_by_field_name("body") else {
        return Ok(keys);
    };
    let params = match decl.child_by_field_name("parameters") {
        Some(params) => validation_params(params, ctx)?,
        None => Vec::new(),
    };

    for call in descendants_of_kind(body, "call_expression") {
        let Some((operand, _, args)) = selector_call(call, ctx)? else {
            continue;
        };
        let is_validation = match operand.kind() {
            // c.Validation.Required(...)
            "selector_expression" => operand
                .child_by_field_name("field")
                .map(|field| ctx.text(field))
                .transpose()?
                .is_some_and(|field| field == ctx.framework.validation_type),
            // v.Required(...)
            "identifier" => {
                let name = ctx.text(operand)?;
                params.iter().any(|param| param == name)
            }
            _ => false,
        };
        if !is_validation {
            continue;
        }

        let Some(mut arg) = named_children(args).into_iter().next() else {
            continue;
        };
        if arg.kind() == "binary_expression" {
            match arg.child_by_field_name("left") {
                Some(left) => arg = left,
                None => continue,
            }
        }
        if let Some(key) = validation_key(arg, ctx)? {
            keys.insert(line_of_end(call), key);
        }
    }
    Ok(keys)
}

/// Names of parameters declared as `*<framework>.Validation`.
fn validation_params(params: TsNode, ctx: &FileContext) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for decl in named_children(params) {
        if decl.kind() != "parameter_declaration" {
            continue;
        }
        let Some(ty_node) = decl.child_by_field_name("type") else {
            continue;
        };
        let Ok(ty) = parse_type_ref(ty_node, ctx)? else {
            continue;
        };
        let expected = format!("*{}", ctx.framework.validation_type);
        if ty.origin != TypeOrigin::Import(ctx.framework.import_path.clone()) || ty.expr.expr != expected {
            continue;
        }
        let mut cursor = decl.walk();
        for name in decl.children_by_field_name("name", &mut cursor) {
            names.push(ctx.text(name)?.to_string());
        }
    }
    Ok(names)
}

/// Dotted path text of an identifier or selector chain, e.g. `user.Name`.
fn validation_key(node: TsNode, ctx: &FileContext) -> Result<Option<String>> {
    match node.kind() {
        "identifier" => Ok(Some(ctx.text(node)?.to_string())),
        "selector_expression" => {
            let (Some(operand), Some(field)) = (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ) else {
                return Ok(None);
            };
            let Some(prefix) = validation_key(operand, ctx)? else {
                return Ok(None);
            };
            Ok(Some(format!("{prefix}.{}", ctx.text(field)?)))
        }
        _ => Ok(None),
    }
}

/// Splits `x.Method(args)` into its operand, method name and argument list.
fn selector_call<'t, 'a>(
    call: TsNode<'t>,
    ctx: &FileContext<'a>,
) -> Result<Option<(TsNode<'t>, &'a str, TsNode<'t>)>> {
    let (Some(function), Some(args)) = (
        call.child_by_field_name("function"),
        call.child_by_field_name("arguments"),
    ) else {
        return Ok(None);
    };
    if function.kind() != "selector_expression" {
        return Ok(None);
    }
    let (Some(operand), Some(field)) = (
        function.child_by_field_name("operand"),
        function.child_by_field_name("field"),
    ) else {
        return Ok(None);
    };
    Ok(Some((operand, ctx.text(field)?, args)))
}

fn descendants_of_kind<'t>(node: TsNode<'t>, kind: &str) -> Vec<TsNode<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == kind {
            found.push(current);
        }
        let children = named_children(current);
        stack.extend(children.into_iter().rev());
    }
    found
}

fn unwrap_generic(node: TsNode) -> TsNode {
    if node.kind() == "generic_type" {
        if let Some(inner) = node.child_by_field_name("type") {
            return inner;
        }
    }
    node
}

fn parse_string_literal(node: TsNode, source: &str) -> Result<String> {
    let raw = node.utf8_text(source.as_bytes())?;
    if raw.starts_with('`') && raw.ends_with('`') && raw.len() >= 2 {
        return Ok(raw[1..raw.len() - 1].to_string());
    }
    if raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2 {
        let inner = &raw[1..raw.len() - 1];
        return Ok(inner.replace("\\\"", "\"").replace("\\\\", "\\"));
    }
    Ok(raw.to_string())
}

fn named_children(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn last_named_child(node: TsNode) -> Option<TsNode> {
    named_children(node).pop()
}

fn line_of(node: TsNode) -> u32 {
    node.start_position().row as u32 + 1
}

fn line_of_end(node: TsNode) -> u32 {
    node.end_position().row as u32 + 1
}
