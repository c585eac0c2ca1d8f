//! Go toolchain invocation.

use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Result of one toolchain process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    /// All of stdout, then all of stderr. The two streams are not interleaved,
    /// so line order across them is not preserved.
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// What to compile and where to put it.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub tags: &'a str,
    pub output: &'a Path,
    /// Import path of the generated main package.
    pub package: &'a str,
    pub work_dir: &'a Path,
}

/// The two toolchain operations the build loop needs.
///
/// `Err` means the process could not be run at all; a process that ran and
/// failed is an `Ok` output with `success == false`.
pub trait Toolchain {
    fn build(&mut self, request: &BuildRequest<'_>) -> io::Result<ToolOutput>;

    fn fetch(&mut self, package: &str, work_dir: &Path) -> io::Result<ToolOutput>;
}

#[derive(Debug, Clone)]
pub struct GoToolchain {
    go: PathBuf,
}

impl GoToolchain {
    pub fn new(go: impl Into<PathBuf>) -> Self {
        Self { go: go.into() }
    }

    /// Resolves `binary` through `PATH` unless it is already a path.
    pub fn locate(binary: &str) -> Option<Self> {
        let candidate = Path::new(binary);
        if candidate.components().count() > 1 {
            return candidate.exists().then(|| Self::new(candidate));
        }
        find_in_path(binary).map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.go
    }
}

impl Toolchain for GoToolchain {
    fn build(&mut self, request: &BuildRequest<'_>) -> io::Result<ToolOutput> {
        let mut command = Command::new(&self.go);
        command
            .arg("build")
            .arg("-tags")
            .arg(request.tags)
            .arg("-o")
            .arg(request.output)
            .arg(request.package)
            .current_dir(request.work_dir);
        run(command)
    }

    fn fetch(&mut self, package: &str, work_dir: &Path) -> io::Result<ToolOutput> {
        let mut command = Command::new(&self.go);
        command.arg("get").arg(package).current_dir(work_dir);
        run(command)
    }
}

fn run(mut command: Command) -> io::Result<ToolOutput> {
    debug!("exec: {:?}", command);
    let output = command.output()?;
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(ToolOutput {
        success: output.status.success(),
        output: combined,
    })
}

fn find_in_path(binary: &str) -> Option<PathBuf> {
    let binary_name = if cfg!(windows) {
        format!("{}.exe", binary)
    } else {
        binary.to_string()
    };

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|path| path.join(&binary_name))
        .find(|path| path.exists())
}

pub const DEFAULT_MISSING_IMPORT_PATTERNS: &[&str] = &[
    r#"import "([^"]+)": cannot find package"#,
    r#"cannot find package "([^"]+)""#,
    r"no required module provides package ([^;\s]+)",
];

/// Recognises toolchain output that blames a package which is not installed.
#[derive(Debug, Clone)]
pub struct MissingImportMatcher {
    patterns: Vec<Regex>,
}

impl MissingImportMatcher {
    /// Each pattern must capture the package path in group 1.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// The first missing package named in `output`, trying patterns in order.
    pub fn missing_package(&self, output: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(output)
                .and_then(|captures| captures.get(1))
                .map(|package| package.as_str().to_string())
        })
    }
}

impl Default for MissingImportMatcher {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_MISSING_IMPORT_PATTERNS
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_accepts_explicit_paths() {
        let dir = tempfile::tempdir().unwrap();
        let go = dir.path().join("go");
        std::fs::write(&go, "").unwrap();

        let toolchain = GoToolchain::locate(go.to_str().unwrap()).unwrap();
        assert_eq!(toolchain.path(), go);
        assert!(GoToolchain::locate(dir.path().join("missing").to_str().unwrap()).is_none());
    }

    #[test]
    fn matches_gopath_style_message() {
        let matcher = MissingImportMatcher::default();
        let output = "app/controllers/app.go:5:2: import \"github.com/x/y\": cannot find package \"github.com/x/y\" in any of:";
        assert_eq!(matcher.missing_package(output), Some("github.com/x/y".to_string()));
    }

    #[test]
    fn matches_module_style_message() {
        let matcher = MissingImportMatcher::default();
        let output = "app/controllers/app.go:5:2: no required module provides package github.com/x/z; to add it:\n\tgo get github.com/x/z";
        assert_eq!(matcher.missing_package(output), Some("github.com/x/z".to_string()));
    }

    #[test]
    fn ordinary_compile_error_names_no_package() {
        let matcher = MissingImportMatcher::default();
        assert_eq!(
            matcher.missing_package("app/controllers/app.go:42:10: undefined: Foo"),
            None
        );
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let matcher = MissingImportMatcher::new(&["missing: (\\S+)"]).unwrap();
        assert_eq!(matcher.missing_package("missing: a/b"), Some("a/b".to_string()));
        assert_eq!(
            matcher.missing_package("cannot find package \"a/b\""),
            None
        );
        assert!(MissingImportMatcher::new(&["("]).is_err());
    }
}
