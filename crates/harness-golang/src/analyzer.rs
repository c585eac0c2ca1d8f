//! Walks application source roots and assembles a [`SourceInfo`].

use crate::parser::{GoParser, MethodDecl, ParsedFile, SyntaxError, TypeOrigin};
use harness_core::{
    CompileError, FrameworkSpec, MethodArg, MethodSpec, SourceInfo, SourceRoot, TypeInfo,
};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{}: {}", path.display(), error.line, error.message)]
    Syntax { path: PathBuf, error: SyntaxError },
    #[error("failed to analyze {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("{}: found package {found}, expected {expected}", path.display())]
    MixedPackages {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to initialise the Go parser: {0}")]
    Parser(String),
}

impl AnalysisError {
    /// Uniform error shape, with the offending file's lines attached when there is one.
    pub fn into_compile_error(self) -> CompileError {
        let description = match &self {
            AnalysisError::Syntax { error, .. } => error.message.clone(),
            AnalysisError::Malformed { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let error = CompileError::go(description);
        match self {
            AnalysisError::Syntax { path, error: syntax } => error
                .at(path.display().to_string(), syntax.line)
                .with_source_from(&path),
            AnalysisError::Malformed { path, .. } | AnalysisError::MixedPackages { path, .. } => {
                error.at(path.display().to_string(), 1).with_source_from(&path)
            }
            AnalysisError::Io { path, .. } => error.at(path.display().to_string(), 0),
            AnalysisError::Walk(_) | AnalysisError::Parser(_) => error,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// One directory's worth of parsed files, all declaring the same package.
struct PackageScan {
    import_path: String,
    name: String,
    files: Vec<(PathBuf, ParsedFile)>,
}

/// A struct declaration with its embedded types resolved to (import path, name).
struct Candidate {
    key: (String, String),
    package_name: String,
    embedded: Vec<(String, String)>,
}

pub struct SourceAnalyzer<'a> {
    framework: &'a FrameworkSpec,
    excluded: Vec<PathBuf>,
}

impl<'a> SourceAnalyzer<'a> {
    pub fn new(framework: &'a FrameworkSpec) -> Self {
        Self {
            framework,
            excluded: Vec::new(),
        }
    }

    /// Skip a directory (and everything below it), e.g. the scratch build directory.
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    pub fn process_source(&self, roots: &[SourceRoot]) -> Result<SourceInfo> {
        let mut parser = GoParser::new().map_err(|err| AnalysisError::Parser(err.to_string()))?;
        let excluded: Vec<PathBuf> = self
            .excluded
            .iter()
            .filter_map(|dir| dir.canonicalize().ok())
            .collect();

        let mut packages = Vec::new();
        for root in roots {
            let root_dir = root.dir.canonicalize().map_err(|source| AnalysisError::Io {
                path: root.dir.clone(),
                source,
            })?;
            let walker = WalkDir::new(&root_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !is_skipped(entry, &excluded));
            for entry in walker {
                let entry = entry?;
                if !entry.file_type().is_dir() {
                    continue;
                }
                let relative = entry.path().strip_prefix(&root_dir).unwrap_or(Path::new(""));
                let import_path = root.import_path_for(relative);
                if let Some(package) = self.scan_package(&mut parser, entry.path(), import_path)? {
                    packages.push(package);
                }
            }
        }

        Ok(self.assemble(&packages))
    }

    fn scan_package(
        &self,
        parser: &mut GoParser,
        dir: &Path,
        import_path: String,
    ) -> Result<Option<PackageScan>> {
        let read_dir = std::fs::read_dir(dir).map_err(|source| AnalysisError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut sources = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| AnalysisError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if is_go_source(&path) && path.is_file() {
                sources.push(path);
            }
        }
        sources.sort();

        let mut package: Option<PackageScan> = None;
        for path in sources {
            let source = std::fs::read_to_string(&path).map_err(|source| AnalysisError::Io {
                path: path.clone(),
                source,
            })?;
            let parsed = match parser.parse_str(&source, self.framework) {
                Ok(parsed) => parsed,
                Err(report) => {
                    return Err(match report.downcast::<SyntaxError>() {
                        Ok(error) => AnalysisError::Syntax { path, error },
                        Err(report) => AnalysisError::Malformed {
                            path,
                            message: report.to_string(),
                        },
                    });
                }
            };

            match package.as_mut() {
                Some(scan) if scan.name != parsed.package_name => {
                    return Err(AnalysisError::MixedPackages {
                        path,
                        expected: scan.name.clone(),
                        found: parsed.package_name,
                    });
                }
                Some(scan) => scan.files.push((path, parsed)),
                None => {
                    package = Some(PackageScan {
                        import_path: import_path.clone(),
                        name: parsed.package_name.clone(),
                        files: vec![(path, parsed)],
                    })
                }
            }
        }
        Ok(package)
    }

    fn assemble(&self, packages: &[PackageScan]) -> SourceInfo {
        let candidates: Vec<Candidate> = packages
            .iter()
            .flat_map(|package| {
                package.files.iter().flat_map(move |(_, file)| {
                    file.structs.iter().map(move |decl| Candidate {
                        key: (package.import_path.clone(), decl.name.clone()),
                        package_name: package.name.clone(),
                        embedded: decl
                            .embedded
                            .iter()
                            .map(|embed| {
                                let import_path = embed
                                    .import_path
                                    .clone()
                                    .unwrap_or_else(|| package.import_path.clone());
                                (import_path, embed.name.clone())
                            })
                            .collect(),
                    })
                })
            })
            .unique_by(|candidate| candidate.key.clone())
            .collect();

        let mut methods: HashMap<(&str, &str), Vec<(&PackageScan, &MethodDecl)>> = HashMap::new();
        for package in packages {
            for (_, file) in &package.files {
                for method in &file.methods {
                    methods
                        .entry((package.import_path.as_str(), method.receiver_type.as_str()))
                        .or_default()
                        .push((package, method));
                }
            }
        }

        let controller_base = (
            self.framework.import_path.clone(),
            self.framework.controller_type.clone(),
        );
        let controller_specs = embedding_closure(&candidates, controller_base)
            .into_iter()
            .map(|candidate| {
                let (import_path, name) = &candidate.key;
                let decls = methods
                    .get(&(import_path.as_str(), name.as_str()))
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                TypeInfo {
                    struct_name: name.clone(),
                    import_path: import_path.clone(),
                    package_name: candidate.package_name.clone(),
                    method_specs: decls
                        .iter()
                        .filter_map(|(package, decl)| self.action_spec(package, name, decl))
                        .collect(),
                }
            })
            .collect();

        let suite_base = (
            self.framework.import_path.clone(),
            self.framework.test_suite_type.clone(),
        );
        let test_suites = embedding_closure(&candidates, suite_base)
            .into_iter()
            .map(|candidate| TypeInfo {
                struct_name: candidate.key.1.clone(),
                import_path: candidate.key.0.clone(),
                package_name: candidate.package_name.clone(),
                method_specs: Vec::new(),
            })
            .collect();

        let mut validation_keys = BTreeMap::new();
        let mut init_import_paths = BTreeSet::new();
        for package in packages {
            // main packages cannot be imported.
            if package.name != "main" && package.files.iter().any(|(_, file)| file.has_init) {
                init_import_paths.insert(package.import_path.clone());
            }
            for (path, file) in &package.files {
                if !file.validation_keys.is_empty() {
                    validation_keys
                        .insert(path.display().to_string(), file.validation_keys.clone());
                }
                init_import_paths.extend(file.blank_imports().map(str::to_string));
            }
        }

        SourceInfo {
            controller_specs,
            test_suites,
            validation_keys,
            init_import_paths,
        }
    }

    /// Registration entry for a method that can handle requests, if it can.
    fn action_spec(
        &self,
        package: &PackageScan,
        controller: &str,
        decl: &MethodDecl,
    ) -> Option<MethodSpec> {
        if !decl.is_exported()
            || !decl.returns(&self.framework.import_path, &self.framework.result_type)
        {
            return None;
        }
        if let Some(reason) = &decl.unsupported_param {
            warn!(
                "Didn't understand an argument of action {controller}.{}: {reason}. Ignoring.",
                decl.name
            );
            return None;
        }

        let args = decl
            .params
            .iter()
            .map(|param| MethodArg {
                name: param.name.clone(),
                import_path: match &param.ty.origin {
                    TypeOrigin::Builtin => String::new(),
                    TypeOrigin::Local => package.import_path.clone(),
                    TypeOrigin::Import(path) => path.clone(),
                },
                type_expr: param.ty.expr.clone(),
            })
            .collect();
        debug!("registering action {controller}.{}", decl.name);

        Some(MethodSpec {
            name: decl.name.clone(),
            args,
            render_calls: decl.render_calls.clone(),
        })
    }
}

/// Candidates that embed `base`, directly or through other members, in declaration order.
fn embedding_closure(candidates: &[Candidate], base: (String, String)) -> Vec<&Candidate> {
    let mut known: HashSet<(String, String)> = HashSet::from([base]);
    let mut members = vec![false; candidates.len()];
    loop {
        let mut changed = false;
        for (index, candidate) in candidates.iter().enumerate() {
            if members[index] || !candidate.embedded.iter().any(|embed| known.contains(embed)) {
                continue;
            }
            members[index] = true;
            known.insert(candidate.key.clone());
            changed = true;
        }
        if !changed {
            break;
        }
    }
    candidates
        .iter()
        .zip(members)
        .filter_map(|(candidate, member)| member.then_some(candidate))
        .collect()
}

fn is_skipped(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let hidden = entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'));
    hidden || excluded.iter().any(|dir| dir == entry.path())
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go") && !name.starts_with('.')
}
