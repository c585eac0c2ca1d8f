use super::common::{report_failure, AppOptions};
use crate::builder::{BuildError, Builder};
use crate::cli::HarnessConfig;
use crate::toolchain::GoToolchain;
use eyre::WrapErr;
use std::io;
use tracing::debug;

#[derive(Debug)]
pub struct BuildArgs {
    pub app: AppOptions,
    /// Print failures as JSON instead of a rendered report
    pub json: bool,
}

/// Builds the application; `Ok(false)` means the build failed and was reported.
pub fn build_command(args: BuildArgs, config: &HarnessConfig) -> eyre::Result<bool> {
    let build_config = args
        .app
        .resolve(config)
        .wrap_err("Failed to resolve build configuration")?;

    let go_binary = &config.build.go_binary;
    let result = match GoToolchain::locate(go_binary) {
        Some(toolchain) => {
            debug!("Using Go toolchain at {}", toolchain.path().display());
            Builder::new(build_config, toolchain).build()
        }
        None => Err(BuildError::Toolchain(io::Error::new(
            io::ErrorKind::NotFound,
            format!("`{go_binary}` was not found in PATH"),
        ))),
    };

    match result {
        Ok(app) => {
            println!("{}", app.path().display());
            Ok(true)
        }
        Err(error) => {
            report_failure(error, args.json)?;
            Ok(false)
        }
    }
}
