//! Harness configuration loaded from TOML files

use crate::builder::{default_bin_dir, BuildConfig};
use crate::toolchain::{MissingImportMatcher, DEFAULT_MISSING_IMPORT_PATTERNS};
use crate::{CliError, Result};
use harness_core::{FrameworkSpec, SourceRoot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "revel-harness.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// The application being built
    pub app: AppConfig,

    /// Toolchain settings
    pub build: BuildSettings,

    /// Framework names the analyzer and generator rely on
    pub framework: FrameworkSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application base directory
    pub source_path: PathBuf,

    /// Go import path of the application
    pub import_path: String,

    /// Additional source roots; `<source>/app` is always analysed
    pub code_paths: Vec<CodePath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePath {
    pub dir: PathBuf,
    pub import_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Passed verbatim to `go build -tags`
    pub tags: String,

    /// Side-effect import added to the generated program
    pub db_import: String,

    /// Go binary, looked up in PATH unless it is a path
    pub go_binary: String,

    /// Where the binary goes; empty means $GOBIN, $GOPATH/bin, then <source>/bin
    pub bin_dir: Option<PathBuf>,

    /// Generated program directory, relative to the source path
    pub scratch_dir: PathBuf,

    /// Regexes whose first group names a package the toolchain could not find
    pub missing_import_patterns: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("."),
            import_path: String::new(),
            code_paths: Vec::new(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            tags: String::new(),
            db_import: String::new(),
            go_binary: "go".to_string(),
            bin_dir: None,
            scratch_dir: PathBuf::from("app").join("tmp"),
            missing_import_patterns: DEFAULT_MISSING_IMPORT_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let mut candidates = Vec::new();
        if let Some(path) = Self::default_config_path() {
            candidates.push(path);
        }
        if let Some(home_dir) = dirs::home_dir() {
            candidates.push(home_dir.join(format!(".{CONFIG_FILE_NAME}")));
        }
        candidates.push(PathBuf::from(CONFIG_FILE_NAME));

        // Later candidates take precedence
        let mut config = Self::default();
        for candidate in candidates.iter().filter(|path| path.is_file()) {
            config = config.merge(Self::load_from_file(candidate)?);
        }
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CliError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merge this configuration with another, with the other taking precedence
    pub fn merge(self, other: Self) -> Self {
        other
    }

    /// Resolves paths against `base_dir` and compiles the patterns.
    pub fn build_config(&self, base_dir: &Path) -> Result<BuildConfig> {
        if self.app.import_path.is_empty() {
            return Err(CliError::InvalidInput(
                "the application import path is not set (app.import_path or --import-path)"
                    .to_string(),
            ));
        }
        if self.build.scratch_dir.is_absolute() {
            return Err(CliError::Config(format!(
                "build.scratch_dir must be relative to the source path, got {}",
                self.build.scratch_dir.display()
            )));
        }

        let source_path = absolute(base_dir, &self.app.source_path);
        let mut config = BuildConfig::new(&source_path, &self.app.import_path);
        config.code_roots.extend(
            self.app
                .code_paths
                .iter()
                .map(|code| SourceRoot::new(absolute(&source_path, &code.dir), &code.import_path)),
        );
        config.tags = self.build.tags.clone();
        config.db_import = Some(self.build.db_import.clone()).filter(|import| !import.is_empty());
        config.scratch_dir = self.build.scratch_dir.clone();
        config.bin_dir = match &self.build.bin_dir {
            Some(dir) => absolute(base_dir, dir),
            None => default_bin_dir(&source_path),
        };
        config.missing_imports = MissingImportMatcher::new(self.build.missing_import_patterns.as_slice())
            .map_err(|e| CliError::Config(format!("Invalid missing import pattern: {}", e)))?;
        config.framework = self.framework.clone();
        Ok(config)
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("revel-harness").join("config.toml"))
    }
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if path == Path::new(".") {
        base.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.build.go_binary, "go");
        assert_eq!(config.build.scratch_dir, Path::new("app").join("tmp"));
        assert_eq!(config.build.missing_import_patterns.len(), 3);
        assert_eq!(config.framework.import_path, "github.com/robfig/revel");
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = HarnessConfig::default();
        config.app.import_path = "example.com/myapp".to_string();
        config.build.tags = "integration".to_string();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();
        let loaded = HarnessConfig::load_from_file(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HarnessConfig = toml::from_str(
            r#"
[app]
import_path = "example.com/myapp"

[[app.code_paths]]
dir = "modules/auth/app"
import_path = "example.com/auth/app"

[build]
db_import = "github.com/lib/pq"
"#,
        )
        .unwrap();

        assert_eq!(config.app.source_path, Path::new("."));
        assert_eq!(config.app.code_paths.len(), 1);
        assert_eq!(config.build.go_binary, "go");
        assert_eq!(config.framework, FrameworkSpec::default());
    }

    #[test]
    fn test_build_config_resolution() {
        let mut config = HarnessConfig::default();
        config.app.import_path = "example.com/myapp".to_string();
        config.app.code_paths.push(CodePath {
            dir: PathBuf::from("modules/auth/app"),
            import_path: "example.com/auth/app".to_string(),
        });
        config.build.db_import = "github.com/lib/pq".to_string();
        config.build.bin_dir = Some(PathBuf::from("out"));

        let build = config.build_config(Path::new("/work/myapp")).unwrap();

        assert_eq!(build.source_path, Path::new("/work/myapp"));
        assert_eq!(build.bin_dir, Path::new("/work/myapp/out"));
        assert_eq!(build.db_import.as_deref(), Some("github.com/lib/pq"));
        let roots: Vec<_> = build
            .code_roots
            .iter()
            .map(|root| root.import_path.as_str())
            .collect();
        assert_eq!(roots, vec!["example.com/myapp/app", "example.com/auth/app"]);
        assert_eq!(
            build.code_roots[1].dir,
            Path::new("/work/myapp/modules/auth/app")
        );
    }

    #[test]
    fn test_build_config_rejects_bad_input() {
        let config = HarnessConfig::default();
        assert!(matches!(
            config.build_config(Path::new("/work")),
            Err(CliError::InvalidInput(_))
        ));

        let mut config = HarnessConfig::default();
        config.app.import_path = "example.com/myapp".to_string();
        config.build.missing_import_patterns = vec!["(".to_string()];
        assert!(matches!(
            config.build_config(Path::new("/work")),
            Err(CliError::Config(_))
        ));
    }
}
