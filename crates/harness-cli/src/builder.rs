//! Build orchestration: analyse, generate, compile, fetch missing packages, retry.

use crate::app::App;
use crate::diagnostics::parse_compile_output;
use crate::observer::{BuildEvent, BuildObserver, TracingObserver};
use crate::toolchain::{BuildRequest, MissingImportMatcher, Toolchain};
use harness_core::{CompileError, FrameworkSpec, SourceInfo, SourceRoot};
use harness_golang::{AnalysisError, ImportAliases, MainSerializer, SourceAnalyzer};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENTRY_FILE: &str = "main.go";

/// Everything one build needs, already resolved.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Application base directory; the toolchain runs here.
    pub source_path: PathBuf,
    pub import_path: String,
    /// Roots to analyse: `<source>/app`, `<source>/tests` when present, then extras.
    pub code_roots: Vec<SourceRoot>,
    pub tags: String,
    /// Extra side-effect import, such as a database driver.
    pub db_import: Option<String>,
    /// Scratch directory for the generated program, relative to `source_path`.
    pub scratch_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub missing_imports: MissingImportMatcher,
    pub framework: FrameworkSpec,
}

impl BuildConfig {
    /// Defaults for an application at `source_path` imported as `import_path`.
    pub fn new(source_path: impl Into<PathBuf>, import_path: impl Into<String>) -> Self {
        let source_path = source_path.into();
        let import_path = import_path.into();
        let mut code_roots = vec![SourceRoot::new(
            source_path.join("app"),
            format!("{import_path}/app"),
        )];
        let tests_dir = source_path.join("tests");
        if tests_dir.is_dir() {
            code_roots.push(SourceRoot::new(tests_dir, format!("{import_path}/tests")));
        }
        Self {
            bin_dir: default_bin_dir(&source_path),
            code_roots,
            source_path,
            import_path,
            tags: String::new(),
            db_import: None,
            scratch_dir: PathBuf::from("app").join("tmp"),
            missing_imports: MissingImportMatcher::default(),
            framework: FrameworkSpec::default(),
        }
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.source_path.join(&self.scratch_dir)
    }

    /// Import path of the generated main package.
    pub fn scratch_import_path(&self) -> String {
        SourceRoot::new(&self.source_path, &self.import_path).import_path_for(&self.scratch_dir)
    }

    /// `<bin dir>/<base name of the source directory>`, `.exe` on Windows.
    pub fn binary_path(&self) -> PathBuf {
        let name = self
            .source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());
        let name = if cfg!(windows) {
            format!("{name}.exe")
        } else {
            name
        };
        self.bin_dir.join(name)
    }
}

/// `$GOBIN`, else the first `$GOPATH` entry's `bin`, else `<source>/bin`.
pub fn default_bin_dir(source_path: &Path) -> PathBuf {
    if let Some(gobin) = std::env::var_os("GOBIN").filter(|value| !value.is_empty()) {
        return PathBuf::from(gobin);
    }
    if let Some(gopath) = std::env::var_os("GOPATH") {
        if let Some(first) = std::env::split_paths(&gopath).find(|path| !path.as_os_str().is_empty())
        {
            return first.join("bin");
        }
    }
    source_path.join("bin")
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("failed to generate the entry point: {0}")]
    Generation(#[from] harness_core::Error),
    #[error("failed to prepare {}: {source}", path.display())]
    Preparation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to run the Go toolchain: {0}")]
    Toolchain(#[source] io::Error),
    #[error(transparent)]
    Compile(CompileError),
}

impl BuildError {
    /// Every failure in the uniform error shape.
    pub fn into_compile_error(self) -> CompileError {
        match self {
            BuildError::Analysis(error) => error.into_compile_error(),
            BuildError::Compile(error) => error,
            other => CompileError::go(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

pub struct Builder<T, O = TracingObserver> {
    config: BuildConfig,
    toolchain: T,
    observer: O,
}

impl<T: Toolchain> Builder<T> {
    pub fn new(config: BuildConfig, toolchain: T) -> Self {
        Self::with_observer(config, toolchain, TracingObserver)
    }
}

impl<T: Toolchain, O: BuildObserver> Builder<T, O> {
    pub fn with_observer(config: BuildConfig, toolchain: T, observer: O) -> Self {
        Self {
            config,
            toolchain,
            observer,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn analyze(&self) -> Result<SourceInfo> {
        let mut info = SourceAnalyzer::new(&self.config.framework)
            .exclude(self.config.scratch_path())
            .process_source(&self.config.code_roots)?;
        if let Some(db_import) = &self.config.db_import {
            info = info.with_init_import(db_import.as_str());
        }
        self.observer.on_event(&BuildEvent::Analyzed {
            controllers: info.controller_specs.len(),
            test_suites: info.test_suites.len(),
        });
        Ok(info)
    }

    pub fn generate(&self, info: &SourceInfo) -> Result<String> {
        let aliases = ImportAliases::resolve(info, &self.config.framework);
        Ok(MainSerializer::new(&self.config.framework).serialize(info, &aliases)?)
    }

    /// Runs the whole pipeline once.
    pub fn build(&mut self) -> Result<App> {
        let info = self.analyze()?;
        let program = self.generate(&info)?;
        self.prepare(&program)?;
        self.compile()
    }

    /// Recreates the scratch directory and writes the program into it.
    pub fn prepare(&self, program: &str) -> Result<PathBuf> {
        let scratch = self.config.scratch_path();
        match fs::remove_dir_all(&scratch) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BuildError::Preparation {
                    path: scratch,
                    source,
                })
            }
        }

        fs::create_dir_all(&scratch).map_err(|source| BuildError::Preparation {
            path: scratch.clone(),
            source,
        })?;
        let entry = scratch.join(ENTRY_FILE);
        fs::write(&entry, program).map_err(|source| BuildError::Preparation {
            path: entry.clone(),
            source,
        })?;
        self.observer.on_event(&BuildEvent::Generated { path: &entry });
        Ok(entry)
    }

    /// Invokes the toolchain until it succeeds, fetching each missing package at most once.
    pub fn compile(&mut self) -> Result<App> {
        let binary = self.config.binary_path();
        let package = self.config.scratch_import_path();
        let mut attempted = BTreeSet::new();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.observer.on_event(&BuildEvent::Invoking {
                attempt,
                package: &package,
            });
            let request = BuildRequest {
                tags: &self.config.tags,
                output: &binary,
                package: &package,
                work_dir: &self.config.source_path,
            };
            let output = self
                .toolchain
                .build(&request)
                .map_err(BuildError::Toolchain)?;
            if output.success {
                self.observer.on_event(&BuildEvent::Built { binary: &binary });
                return Ok(App::new(binary));
            }

            let Some(missing) = self.config.missing_imports.missing_package(&output.output) else {
                return Err(self.compile_failure(&output.output));
            };
            if !attempted.insert(missing.clone()) {
                self.observer
                    .on_event(&BuildEvent::AlreadyFetched { package: &missing });
                return Err(self.compile_failure(&output.output));
            }

            self.observer
                .on_event(&BuildEvent::Fetching { package: &missing });
            let fetched = match self.toolchain.fetch(&missing, &self.config.source_path) {
                Ok(fetched) => fetched,
                Err(error) => crate::toolchain::ToolOutput::failure(error.to_string()),
            };
            if !fetched.success {
                self.observer.on_event(&BuildEvent::FetchFailed {
                    package: &missing,
                    output: &fetched.output,
                });
                return Err(self.compile_failure(&output.output));
            }
        }
    }

    fn compile_failure(&self, output: &str) -> BuildError {
        let error = parse_compile_output(output, &self.config.source_path);
        if !error.is_localized() {
            self.observer
                .on_event(&BuildEvent::UnparsedOutput { output });
        }
        self.observer.on_event(&BuildEvent::Failed { error: &error });
        BuildError::Compile(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_package_is_under_application_import_path() {
        let config = BuildConfig::new("/src/myapp", "example.com/myapp");
        assert_eq!(config.scratch_import_path(), "example.com/myapp/app/tmp");
        assert_eq!(config.scratch_path(), Path::new("/src/myapp/app/tmp"));
    }

    #[test]
    fn binary_is_named_after_source_directory() {
        let mut config = BuildConfig::new("/src/myapp", "example.com/myapp");
        config.bin_dir = PathBuf::from("/go/bin");
        let expected = if cfg!(windows) { "myapp.exe" } else { "myapp" };
        assert_eq!(config.binary_path(), Path::new("/go/bin").join(expected));
    }

    #[test]
    fn non_compile_failures_still_map_to_compile_error() {
        let error = BuildError::Toolchain(io::Error::new(io::ErrorKind::NotFound, "go"));
        let compile_error = error.into_compile_error();
        assert_eq!(compile_error.title, "Go Compilation Error");
        assert!(compile_error.description.contains("Go toolchain"));
        assert!(!compile_error.is_localized());
    }
}
