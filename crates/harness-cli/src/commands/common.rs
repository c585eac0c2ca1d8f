use crate::builder::{BuildConfig, BuildError, Builder};
use crate::cli::HarnessConfig;
use crate::diagnostics::render_compile_error;
use crate::toolchain::GoToolchain;
use crate::Result;
use std::path::PathBuf;

/// Per-invocation overrides of the `[app]` and `[build]` config sections.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub source_path: Option<PathBuf>,
    pub import_path: Option<String>,
    pub tags: Option<String>,
}

impl AppOptions {
    pub fn apply(&self, config: &HarnessConfig) -> HarnessConfig {
        let mut config = config.clone();
        if let Some(source_path) = &self.source_path {
            config.app.source_path = source_path.clone();
        }
        if let Some(import_path) = &self.import_path {
            config.app.import_path = import_path.clone();
        }
        if let Some(tags) = &self.tags {
            config.build.tags = tags.clone();
        }
        config
    }

    pub fn resolve(&self, config: &HarnessConfig) -> Result<BuildConfig> {
        let base_dir = std::env::current_dir()?;
        self.apply(config).build_config(&base_dir)
    }
}

/// A builder for commands that never reach the toolchain.
pub fn offline_builder(build_config: BuildConfig, config: &HarnessConfig) -> Builder<GoToolchain> {
    Builder::new(build_config, GoToolchain::new(&config.build.go_binary))
}

/// Prints a failed build as JSON on stdout or as a report on stderr.
pub fn report_failure(error: BuildError, json: bool) -> eyre::Result<()> {
    let error = error.into_compile_error();
    if json {
        println!("{}", serde_json::to_string_pretty(&error)?);
    } else {
        eprintln!("{}", render_compile_error(&error));
    }
    Ok(())
}
