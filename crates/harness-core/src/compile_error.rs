use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const SOURCE_TYPE_GO: &str = "Go code";
pub const TITLE_GO_COMPILATION: &str = "Go Compilation Error";

/// Error shape surfaced to callers such as a development-mode error page.
///
/// An empty `path` means the error could not be attributed to a source file.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[error("{title}: {description}")]
pub struct CompileError {
    pub source_type: String,
    pub title: String,
    pub description: String,
    pub path: String,
    pub line: u32,
    pub source_lines: Vec<String>,
    /// Set only when reading the source snippet itself failed.
    pub meta_error: Option<String>,
}

impl CompileError {
    pub fn new(
        source_type: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn go(description: impl Into<String>) -> Self {
        Self::new(SOURCE_TYPE_GO, TITLE_GO_COMPILATION, description)
    }

    pub fn at(mut self, path: impl Into<String>, line: u32) -> Self {
        self.path = path.into();
        self.line = line;
        self
    }

    /// Attaches the lines of `file`; a read failure is recorded in `meta_error`
    /// and never replaces the primary error.
    pub fn with_source_from(mut self, file: &Path) -> Self {
        match read_lines(file) {
            Ok(lines) => self.source_lines = lines,
            Err(err) => {
                let meta = format!("{}: {}", file.display(), err);
                tracing::error!("{meta}");
                self.meta_error = Some(meta);
            }
        }
        self
    }

    pub fn is_localized(&self) -> bool {
        !self.path.is_empty()
    }

    /// The offending line, when the source snippet is available.
    pub fn error_line(&self) -> Option<&str> {
        let index = usize::try_from(self.line).ok()?.checked_sub(1)?;
        self.source_lines.get(index).map(String::as_str)
    }
}

pub fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn source_lines_are_attached() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "package main").unwrap();
        writeln!(file, "func main() {{ x }}").unwrap();

        let error = CompileError::go("undefined: x")
            .at("main.go", 2)
            .with_source_from(file.path());

        assert_eq!(error.source_lines.len(), 2);
        assert_eq!(error.error_line(), Some("func main() { x }"));
        assert!(error.meta_error.is_none());
    }

    #[test]
    fn unreadable_source_sets_meta_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.go");

        let error = CompileError::go("undefined: x")
            .at("missing.go", 3)
            .with_source_from(&missing);

        assert!(error.source_lines.is_empty());
        assert_eq!(error.description, "undefined: x");
        let meta = error.meta_error.expect("meta error should be set");
        assert!(meta.starts_with(&missing.display().to_string()));
    }

    #[test]
    fn unlocalized_error_has_no_line() {
        let error = CompileError::go("See console output for the build error.");
        assert!(!error.is_localized());
        assert_eq!(error.error_line(), None);
    }
}
